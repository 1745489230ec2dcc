//! Owned iCalendar document tree.
//!
//! The parser works on borrowed slices of the unfolded input; everything is
//! copied into these types so a parsed document never outlives or references
//! the payload it came from.

/// A parsed `VCALENDAR` object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ICalendar {
    /// Calendar-level properties (`PRODID`, `VERSION`, ...).
    pub properties: Vec<Property>,
    /// Direct children of `VCALENDAR`.
    pub components: Vec<Component>,
}

impl ICalendar {
    /// Iterates the `VTIMEZONE` children.
    pub fn timezones(&self) -> impl Iterator<Item = &Component> {
        self.components
            .iter()
            .filter(|component| component.is(Component::VTIMEZONE))
    }

    /// ## Summary
    /// Returns the first child that is not a `VTIMEZONE`.
    ///
    /// This is the component that identifies the object (its type and UID).
    #[must_use]
    pub fn primary_component(&self) -> Option<&Component> {
        self.components
            .iter()
            .find(|component| !component.is(Component::VTIMEZONE))
    }

    /// Views the document as a component named `VCALENDAR`.
    #[must_use]
    pub fn as_component(&self) -> Component {
        Component {
            name: Component::VCALENDAR.to_owned(),
            properties: self.properties.clone(),
            components: self.components.clone(),
        }
    }
}

/// A calendar component such as `VEVENT` or `VALARM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Upper-cased component name.
    pub name: String,
    pub properties: Vec<Property>,
    pub components: Vec<Component>,
}

impl Component {
    pub const VCALENDAR: &'static str = "VCALENDAR";
    pub const VTIMEZONE: &'static str = "VTIMEZONE";
    pub const VEVENT: &'static str = "VEVENT";
    pub const VTODO: &'static str = "VTODO";
    pub const VJOURNAL: &'static str = "VJOURNAL";
    pub const VFREEBUSY: &'static str = "VFREEBUSY";
    pub const VALARM: &'static str = "VALARM";
    pub const VAVAILABILITY: &'static str = "VAVAILABILITY";

    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// First property with the given name.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.is(name))
    }

    /// All properties with the given name, in document order.
    pub fn get_properties<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> {
        self.properties.iter().filter(move |property| property.is(name))
    }

    /// Direct children with the given name.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Component> {
        self.components.iter().filter(move |child| child.is(name))
    }
}

/// A content line: `NAME;PARAM=VALUE:value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Upper-cased property name.
    pub name: String,
    /// Raw (unescaped) value text.
    pub value: String,
    pub params: Vec<Parameter>,
}

impl Property {
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Value of the first parameter with the given name.
    #[must_use]
    pub fn get_param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|param| param.name.eq_ignore_ascii_case(name))
            .and_then(|param| param.value.as_deref())
    }

    /// True when the property carries the named parameter at all.
    #[must_use]
    pub fn has_param(&self, name: &str) -> bool {
        self.params
            .iter()
            .any(|param| param.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Upper-cased parameter name.
    pub name: String,
    pub value: Option<String>,
}
