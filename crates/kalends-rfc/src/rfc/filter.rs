//! calendar-query filter model (RFC 4791 §9.7).
//!
//! A filter is a tree rooted at a comp-filter on `VCALENDAR`. Each node either
//! asserts absence (`is_not_defined`) or narrows the match with a time range,
//! text matches and nested filters, all of which must hold.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarFilter {
    /// Always `VCALENDAR` for a well-formed query.
    pub component: String,
    pub prop_filters: Vec<PropFilter>,
    pub comp_filters: Vec<CompFilter>,
}

impl CalendarFilter {
    /// Root filter matching every calendar object.
    #[must_use]
    pub fn vcalendar() -> Self {
        Self {
            component: "VCALENDAR".to_owned(),
            prop_filters: vec![],
            comp_filters: vec![],
        }
    }

    #[must_use]
    pub fn with_comp(self, comp: CompFilter) -> Self {
        let mut comp_filters = self.comp_filters;
        comp_filters.push(comp);
        Self {
            comp_filters,
            ..self
        }
    }

    #[must_use]
    pub fn with_prop_filter(self, prop: PropFilter) -> Self {
        let mut prop_filters = self.prop_filters;
        prop_filters.push(prop);
        Self {
            prop_filters,
            ..self
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comp_filters.is_empty() && self.prop_filters.is_empty()
    }
}

/// Matches a child component (`VEVENT`, `VALARM`, ...) by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompFilter {
    pub name: String,
    /// Matches when no child of this name exists.
    pub is_not_defined: bool,
    pub time_range: Option<TimeRange>,
    pub prop_filters: Vec<PropFilter>,
    pub comp_filters: Vec<CompFilter>,
}

impl CompFilter {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_not_defined: false,
            time_range: None,
            prop_filters: vec![],
            comp_filters: vec![],
        }
    }

    #[must_use]
    pub fn not_defined(self) -> Self {
        Self {
            is_not_defined: true,
            ..self
        }
    }

    #[must_use]
    pub fn with_time_range(self, range: TimeRange) -> Self {
        Self {
            time_range: Some(range),
            ..self
        }
    }

    #[must_use]
    pub fn with_prop_filter(self, prop: PropFilter) -> Self {
        let mut prop_filters = self.prop_filters;
        prop_filters.push(prop);
        Self {
            prop_filters,
            ..self
        }
    }

    #[must_use]
    pub fn with_comp_filter(self, comp: CompFilter) -> Self {
        let mut comp_filters = self.comp_filters;
        comp_filters.push(comp);
        Self {
            comp_filters,
            ..self
        }
    }

    /// Whether any property or sub-component filter hangs below this node.
    #[must_use]
    pub fn has_nested_filters(&self) -> bool {
        !(self.prop_filters.is_empty() && self.comp_filters.is_empty())
    }
}

/// Matches a property of the enclosing component by name.
///
/// `time_range` applies to date-valued properties such as `DTSTAMP`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropFilter {
    pub name: String,
    pub is_not_defined: bool,
    pub text_match: Option<TextMatch>,
    pub time_range: Option<TimeRange>,
    pub param_filters: Vec<ParamFilter>,
}

impl PropFilter {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_not_defined: false,
            text_match: None,
            time_range: None,
            param_filters: vec![],
        }
    }

    #[must_use]
    pub fn not_defined(self) -> Self {
        Self {
            is_not_defined: true,
            ..self
        }
    }

    #[must_use]
    pub fn with_text_match(self, text_match: TextMatch) -> Self {
        Self {
            text_match: Some(text_match),
            ..self
        }
    }

    #[must_use]
    pub fn with_time_range(self, range: TimeRange) -> Self {
        Self {
            time_range: Some(range),
            ..self
        }
    }

    #[must_use]
    pub fn with_param_filter(self, param: ParamFilter) -> Self {
        let mut param_filters = self.param_filters;
        param_filters.push(param);
        Self {
            param_filters,
            ..self
        }
    }
}

/// Matches a parameter of the enclosing property, e.g. `PARTSTAT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamFilter {
    pub name: String,
    pub is_not_defined: bool,
    pub text_match: Option<TextMatch>,
}

impl ParamFilter {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_not_defined: false,
            text_match: None,
        }
    }

    #[must_use]
    pub fn not_defined(self) -> Self {
        Self {
            is_not_defined: true,
            ..self
        }
    }

    #[must_use]
    pub fn with_text_match(self, text_match: TextMatch) -> Self {
        Self {
            text_match: Some(text_match),
            ..self
        }
    }
}

/// `CALDAV:text-match` against a property or parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    pub value: String,
    /// `None` selects `i;unicode-casemap`.
    pub collation: Option<String>,
    pub match_type: MatchType,
    pub negate: bool,
}

impl TextMatch {
    #[must_use]
    pub fn new(value: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            value: value.into(),
            collation: None,
            match_type,
            negate: false,
        }
    }

    #[must_use]
    pub fn contains(value: impl Into<String>) -> Self {
        Self::new(value, MatchType::Contains)
    }

    #[must_use]
    pub fn equals(value: impl Into<String>) -> Self {
        Self::new(value, MatchType::Equals)
    }

    #[must_use]
    pub fn starts_with(value: impl Into<String>) -> Self {
        Self::new(value, MatchType::StartsWith)
    }

    #[must_use]
    pub fn ends_with(value: impl Into<String>) -> Self {
        Self::new(value, MatchType::EndsWith)
    }

    /// Inverts the result (`negate-condition="yes"`).
    #[must_use]
    pub fn negate(self) -> Self {
        Self {
            negate: true,
            ..self
        }
    }

    #[must_use]
    pub fn with_collation(self, collation: impl Into<String>) -> Self {
        Self {
            collation: Some(collation.into()),
            ..self
        }
    }
}

/// `match-type` attribute of a text-match; `contains` when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchType {
    #[default]
    Contains,
    Equals,
    StartsWith,
    EndsWith,
}

/// Half-open UTC interval `[start, end)`; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    #[must_use]
    pub const fn from(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    #[must_use]
    pub const fn until(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    /// ## Summary
    /// RFC 4791 overlap test for an instance spanning `[start, end)`.
    ///
    /// A zero-length instance overlaps when it lies in `[range.start, range.end)`.
    #[must_use]
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let before_end = self.end.is_none_or(|range_end| range_end > start);
        if end > start {
            before_end && self.start.is_none_or(|range_start| range_start < end)
        } else {
            before_end && self.start.is_none_or(|range_start| range_start <= start)
        }
    }

    /// True when `instant` lies in `[start, end)`.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| start <= instant) && self.end.is_none_or(|end| instant < end)
    }
}
