use std::str::FromStr;

use crate::error::CoreError;

/// Collection type without database dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionType {
    Calendar,
    Addressbook,
}

impl CollectionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Addressbook => "addressbook",
        }
    }
}

impl std::fmt::Display for CollectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary component kinds a calendar object may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    VEvent,
    VTodo,
    VJournal,
    VFreeBusy,
    VAvailability,
}

impl ComponentType {
    pub const ALL: [Self; 5] = [
        Self::VEvent,
        Self::VTodo,
        Self::VJournal,
        Self::VFreeBusy,
        Self::VAvailability,
    ];

    /// Component name as it appears after `BEGIN:`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VEvent => "VEVENT",
            Self::VTodo => "VTODO",
            Self::VJournal => "VJOURNAL",
            Self::VFreeBusy => "VFREEBUSY",
            Self::VAvailability => "VAVAILABILITY",
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = CoreError;

    /// Component names are case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnsupportedComponent(s.to_owned()))
    }
}
