//! Enumerated calendar and subscription properties.

use kalends_core::constants::{
    PROP_CALENDAR_COLOR, PROP_CALENDAR_DESCRIPTION, PROP_CALENDAR_ORDER, PROP_CALENDAR_TIMEZONE,
    PROP_DISPLAYNAME, PROP_REFRESHRATE, PROP_SCHEDULE_CALENDAR_TRANSP, PROP_STRIP_ALARMS,
    PROP_STRIP_ATTACHMENTS, PROP_STRIP_TODOS, PROP_SUBSCRIPTION_SOURCE,
};
use kalends_db::model::instance::DavInstanceChangeset;
use kalends_db::model::subscription::DavSubscriptionChangeset;

use crate::dav::property::{EnumeratedProperty, PropPatch, invalid_value, parse_order, resolve_patch};
use crate::error::ServiceResult;

/// Properties stored on a calendar instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarProperty {
    DisplayName,
    Description,
    Timezone,
    Order,
    Color,
    ScheduleTransparency,
}

impl EnumeratedProperty for CalendarProperty {
    const ALL: &'static [Self] = &[
        Self::DisplayName,
        Self::Description,
        Self::Timezone,
        Self::Order,
        Self::Color,
        Self::ScheduleTransparency,
    ];

    fn clark_name(self) -> &'static str {
        match self {
            Self::DisplayName => PROP_DISPLAYNAME,
            Self::Description => PROP_CALENDAR_DESCRIPTION,
            Self::Timezone => PROP_CALENDAR_TIMEZONE,
            Self::Order => PROP_CALENDAR_ORDER,
            Self::Color => PROP_CALENDAR_COLOR,
            Self::ScheduleTransparency => PROP_SCHEDULE_CALENDAR_TRANSP,
        }
    }
}

/// Parses `schedule-calendar-transp`: `true` for transparent.
fn parse_transparency(value: &str) -> ServiceResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "transparent" => Ok(true),
        "opaque" => Ok(false),
        _ => Err(invalid_value(PROP_SCHEDULE_CALENDAR_TRANSP, value)),
    }
}

/// ## Summary
/// Maps a calendar property patch onto instance columns.
///
/// Removing a property restores its default: null text, order 0, opaque.
///
/// ## Errors
/// Returns `UnsupportedProperty` if any name is not a [`CalendarProperty`]
/// and `InvalidPropertyValue` for a non-integer order or an unknown
/// transparency.
pub fn calendar_changeset(patch: &PropPatch) -> ServiceResult<DavInstanceChangeset> {
    let mut changes = DavInstanceChangeset::default();
    for (property, value) in resolve_patch::<CalendarProperty>(patch)? {
        let text = value.map(str::to_owned);
        match property {
            CalendarProperty::DisplayName => changes.display_name = Some(text),
            CalendarProperty::Description => changes.description = Some(text),
            CalendarProperty::Timezone => changes.timezone = Some(text),
            CalendarProperty::Color => changes.calendar_color = Some(text),
            CalendarProperty::Order => {
                changes.calendar_order = Some(match value {
                    Some(value) => parse_order(PROP_CALENDAR_ORDER, value)?,
                    None => 0,
                });
            }
            CalendarProperty::ScheduleTransparency => {
                changes.transparent = Some(match value {
                    Some(value) => parse_transparency(value)?,
                    None => false,
                });
            }
        }
    }
    Ok(changes)
}

/// Properties stored on a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionProperty {
    Source,
    DisplayName,
    RefreshRate,
    Order,
    Color,
    StripTodos,
    StripAlarms,
    StripAttachments,
}

impl EnumeratedProperty for SubscriptionProperty {
    const ALL: &'static [Self] = &[
        Self::Source,
        Self::DisplayName,
        Self::RefreshRate,
        Self::Order,
        Self::Color,
        Self::StripTodos,
        Self::StripAlarms,
        Self::StripAttachments,
    ];

    fn clark_name(self) -> &'static str {
        match self {
            Self::Source => PROP_SUBSCRIPTION_SOURCE,
            Self::DisplayName => PROP_DISPLAYNAME,
            Self::RefreshRate => PROP_REFRESHRATE,
            Self::Order => PROP_CALENDAR_ORDER,
            Self::Color => PROP_CALENDAR_COLOR,
            Self::StripTodos => PROP_STRIP_TODOS,
            Self::StripAlarms => PROP_STRIP_ALARMS,
            Self::StripAttachments => PROP_STRIP_ATTACHMENTS,
        }
    }
}

/// Strip flags are set by presence; an explicit `false`/`0` clears them.
fn parse_flag(property: &str, value: Option<&str>) -> ServiceResult<bool> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(invalid_value(property, value)),
    }
}

/// ## Summary
/// Maps a subscription property patch onto subscription columns.
///
/// ## Errors
/// Returns `UnsupportedProperty` for names outside [`SubscriptionProperty`]
/// and `InvalidPropertyValue` for an empty or removed source, a non-integer
/// order or an unreadable strip flag.
pub fn subscription_changeset(
    patch: &PropPatch,
    now: chrono::DateTime<chrono::Utc>,
) -> ServiceResult<DavSubscriptionChangeset> {
    let mut changes = DavSubscriptionChangeset::touch(now);
    for (property, value) in resolve_patch::<SubscriptionProperty>(patch)? {
        let text = value.map(str::to_owned);
        match property {
            SubscriptionProperty::Source => match value.map(str::trim) {
                Some(source) if !source.is_empty() => changes.source = Some(source.to_owned()),
                _ => return Err(invalid_value(PROP_SUBSCRIPTION_SOURCE, value.unwrap_or_default())),
            },
            SubscriptionProperty::DisplayName => changes.display_name = Some(text),
            SubscriptionProperty::RefreshRate => changes.refresh_rate = Some(text),
            SubscriptionProperty::Color => changes.calendar_color = Some(text),
            SubscriptionProperty::Order => {
                changes.calendar_order = Some(match value {
                    Some(value) => parse_order(PROP_CALENDAR_ORDER, value)?,
                    None => 0,
                });
            }
            SubscriptionProperty::StripTodos => {
                changes.strip_todos = Some(parse_flag(PROP_STRIP_TODOS, value)?);
            }
            SubscriptionProperty::StripAlarms => {
                changes.strip_alarms = Some(parse_flag(PROP_STRIP_ALARMS, value)?);
            }
            SubscriptionProperty::StripAttachments => {
                changes.strip_attachments = Some(parse_flag(PROP_STRIP_ATTACHMENTS, value)?);
            }
        }
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;

    #[test_log::test]
    fn maps_every_calendar_property() {
        let patch = PropPatch::new()
            .set(PROP_DISPLAYNAME, "Work")
            .set(PROP_CALENDAR_DESCRIPTION, "Office hours")
            .set(PROP_CALENDAR_ORDER, "3")
            .set(PROP_CALENDAR_COLOR, "#ff0000")
            .set(PROP_SCHEDULE_CALENDAR_TRANSP, "transparent")
            .remove(PROP_CALENDAR_TIMEZONE);
        let changes = calendar_changeset(&patch).unwrap();
        assert_eq!(changes.display_name, Some(Some("Work".to_owned())));
        assert_eq!(changes.description, Some(Some("Office hours".to_owned())));
        assert_eq!(changes.calendar_order, Some(3));
        assert_eq!(changes.calendar_color, Some(Some("#ff0000".to_owned())));
        assert_eq!(changes.transparent, Some(true));
        assert_eq!(changes.timezone, Some(None));
        assert_eq!(changes.access, None);
    }

    #[test_log::test]
    fn removal_restores_defaults() {
        let patch = PropPatch::new()
            .remove(PROP_CALENDAR_ORDER)
            .remove(PROP_SCHEDULE_CALENDAR_TRANSP);
        let changes = calendar_changeset(&patch).unwrap();
        assert_eq!(changes.calendar_order, Some(0));
        assert_eq!(changes.transparent, Some(false));
    }

    #[test_log::test]
    fn unsupported_property_rejects_whole_patch() {
        let patch = PropPatch::new()
            .set(PROP_DISPLAYNAME, "Work")
            .set("{DAV:}getetag", "x");
        assert!(matches!(
            calendar_changeset(&patch),
            Err(ServiceError::UnsupportedProperty(name)) if name == "{DAV:}getetag"
        ));
    }

    #[test_log::test]
    fn invalid_values() {
        let order = PropPatch::new().set(PROP_CALENDAR_ORDER, "first");
        let transp = PropPatch::new().set(PROP_SCHEDULE_CALENDAR_TRANSP, "see-through");
        assert!(matches!(calendar_changeset(&order), Err(ServiceError::InvalidPropertyValue { .. })));
        assert!(matches!(calendar_changeset(&transp), Err(ServiceError::InvalidPropertyValue { .. })));
    }

    #[test_log::test]
    fn subscription_patch() {
        let now = chrono::Utc::now();
        let patch = PropPatch::new()
            .set(PROP_SUBSCRIPTION_SOURCE, "https://example.com/cal.ics")
            .set(PROP_STRIP_TODOS, "")
            .remove(PROP_STRIP_ALARMS)
            .set(PROP_REFRESHRATE, "P1D");
        let changes = subscription_changeset(&patch, now).unwrap();
        assert_eq!(changes.source.as_deref(), Some("https://example.com/cal.ics"));
        assert_eq!(changes.strip_todos, Some(true));
        assert_eq!(changes.strip_alarms, Some(false));
        assert_eq!(changes.refresh_rate, Some(Some("P1D".to_owned())));
        assert_eq!(changes.last_modified, now);

        let no_source = PropPatch::new().remove(PROP_SUBSCRIPTION_SOURCE);
        assert!(matches!(
            subscription_changeset(&no_source, now),
            Err(ServiceError::InvalidPropertyValue { .. })
        ));
        let calendar_only = PropPatch::new().set(PROP_CALENDAR_TIMEZONE, "x");
        assert!(matches!(
            subscription_changeset(&calendar_only, now),
            Err(ServiceError::UnsupportedProperty(_))
        ));
    }
}
