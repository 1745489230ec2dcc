//! iCalendar payload builders.
//!
//! ```ignore
//! let payload = ics::calendar([ComponentBuilder::event("uid-1")
//!     .start("20250110T090000Z")
//!     .end("20250110T100000Z")]);
//! ```

/// One component with its properties and children.
#[derive(Debug, Clone)]
pub struct ComponentBuilder {
    name: &'static str,
    lines: Vec<String>,
    children: Vec<ComponentBuilder>,
}

impl ComponentBuilder {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            lines: Vec::new(),
            children: Vec::new(),
        }
    }

    fn with_uid(name: &'static str, uid: &str) -> Self {
        Self::new(name)
            .prop("UID", uid)
            .prop("DTSTAMP", "20250101T000000Z")
    }

    #[must_use]
    pub fn event(uid: &str) -> Self {
        Self::with_uid("VEVENT", uid)
    }

    #[must_use]
    pub fn todo(uid: &str) -> Self {
        Self::with_uid("VTODO", uid)
    }

    #[must_use]
    pub fn journal(uid: &str) -> Self {
        Self::with_uid("VJOURNAL", uid)
    }

    #[must_use]
    pub fn alarm(trigger: &str) -> Self {
        Self::new("VALARM")
            .prop("ACTION", "DISPLAY")
            .prop("DESCRIPTION", "Reminder")
            .prop("TRIGGER", trigger)
    }

    /// A zone with a single fixed offset.
    #[must_use]
    pub fn timezone(tzid: &str, offset: &str) -> Self {
        let standard = Self::new("STANDARD")
            .prop("DTSTART", "19700101T000000")
            .prop("TZOFFSETFROM", offset)
            .prop("TZOFFSETTO", offset);
        Self::new("VTIMEZONE").prop("TZID", tzid).child(standard)
    }

    /// Appends a content line; `name` may carry parameters (`DTSTART;TZID=...`).
    #[must_use]
    pub fn prop(mut self, name: &str, value: &str) -> Self {
        self.lines.push(format!("{name}:{value}"));
        self
    }

    #[must_use]
    pub fn start(self, value: &str) -> Self {
        self.prop(date_property("DTSTART", value).as_str(), value)
    }

    #[must_use]
    pub fn end(self, value: &str) -> Self {
        self.prop(date_property("DTEND", value).as_str(), value)
    }

    #[must_use]
    pub fn due(self, value: &str) -> Self {
        self.prop("DUE", value)
    }

    #[must_use]
    pub fn duration(self, value: &str) -> Self {
        self.prop("DURATION", value)
    }

    #[must_use]
    pub fn rrule(self, value: &str) -> Self {
        self.prop("RRULE", value)
    }

    #[must_use]
    pub fn exdate(self, value: &str) -> Self {
        self.prop("EXDATE", value)
    }

    #[must_use]
    pub fn recurrence_id(self, value: &str) -> Self {
        self.prop("RECURRENCE-ID", value)
    }

    #[must_use]
    pub fn summary(self, value: &str) -> Self {
        self.prop("SUMMARY", value)
    }

    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    fn write_to(&self, out: &mut String) {
        for line in std::iter::once(format!("BEGIN:{}", self.name)).chain(self.lines.iter().cloned()) {
            out.push_str(&line);
            out.push_str("\r\n");
        }
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("END:");
        out.push_str(self.name);
        out.push_str("\r\n");
    }
}

/// Date-only values get `VALUE=DATE`.
fn date_property(name: &str, value: &str) -> String {
    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        format!("{name};VALUE=DATE")
    } else {
        name.to_owned()
    }
}

/// ## Summary
/// Wraps components in a `VCALENDAR` and renders the payload.
#[must_use]
pub fn calendar(components: impl IntoIterator<Item = ComponentBuilder>) -> Vec<u8> {
    let mut out = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//kalends//test//EN\r\n");
    for component in components {
        component.write_to(&mut out);
    }
    out.push_str("END:VCALENDAR\r\n");
    out.into_bytes()
}

/// A one-hour event on a UTC start.
#[must_use]
pub fn simple_event(uid: &str, start: &str, end: &str) -> Vec<u8> {
    calendar([ComponentBuilder::event(uid).start(start).end(end)])
}

/// A minimal vCard.
#[must_use]
pub fn vcard(name: &str) -> Vec<u8> {
    format!("BEGIN:VCARD\r\nVERSION:4.0\r\nFN:{name}\r\nEND:VCARD\r\n").into_bytes()
}
