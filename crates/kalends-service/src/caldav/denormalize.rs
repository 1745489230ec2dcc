//! Derived, indexable metadata of calendar objects.
//!
//! The parsed tree lives only for the duration of [`denormalize`]; the
//! result holds nothing but owned primitive values.

use chrono::{DateTime, Utc};

use kalends_core::types::ComponentType;
use kalends_rfc::rfc::ical::core::{Component, ICalendar};
use kalends_rfc::rfc::ical::expand::{self, RecurrenceSet};
use kalends_rfc::rfc::ical::parse::parse_calendar;
use kalends_rfc::rfc::ical::values;

use crate::dav::etag::{generate_etag, payload_size};
use crate::error::{ServiceError, ServiceResult};

/// Metadata stored next to a calendar object payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenormalizedFields {
    pub etag: String,
    pub size: i64,
    pub component_type: ComponentType,
    /// Unix seconds; only set for events.
    pub first_occurrence: Option<i64>,
    /// Unix seconds; only set for events.
    pub last_occurrence: Option<i64>,
    pub uid: String,
}

fn malformed(reason: impl std::fmt::Display) -> ServiceError {
    ServiceError::MalformedPayload(reason.to_string())
}

/// ## Summary
/// Computes etag, size, component type, occurrence span and UID of a
/// calendar object payload.
///
/// ## Errors
/// Returns [`ServiceError::MalformedPayload`] if the payload does not parse,
/// has no supported primary component, lacks a UID (or an event lacks
/// DTSTART), or carries date or recurrence values that do not parse.
#[tracing::instrument(skip(payload), fields(size = payload.len()))]
pub fn denormalize(payload: &[u8]) -> ServiceResult<DenormalizedFields> {
    let calendar = parse_calendar(payload).map_err(malformed)?;

    let component = primary_component(&calendar)
        .ok_or_else(|| malformed("no component besides VTIMEZONE"))?;
    let component_type: ComponentType = component.name.parse().map_err(malformed)?;
    let uid = component
        .get_property("UID")
        .map(|uid| uid.value.trim().to_owned())
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| malformed(format!("{} without UID", component.name)))?;

    let (first_occurrence, last_occurrence) = if component_type == ComponentType::VEvent {
        let (first, last) = event_span(&calendar, component, &uid)?;
        (Some(first.timestamp().max(0)), Some(last.timestamp().max(0)))
    } else {
        (None, None)
    };

    let fields = DenormalizedFields {
        etag: generate_etag(payload),
        size: payload_size(payload),
        component_type,
        first_occurrence,
        last_occurrence,
        uid,
    };
    tracing::debug!(
        component = %fields.component_type,
        first = ?fields.first_occurrence,
        last = ?fields.last_occurrence,
        "Denormalized calendar object"
    );
    Ok(fields)
}

/// First non-`VTIMEZONE` component, preferring the master over an
/// overridden instance of the same UID.
fn primary_component(calendar: &ICalendar) -> Option<&Component> {
    let first = calendar.primary_component()?;
    if first.get_property("RECURRENCE-ID").is_none() {
        return Some(first);
    }
    let uid = first.get_property("UID").map(|uid| uid.value.as_str());
    calendar
        .components
        .iter()
        .find(|candidate| {
            candidate.is(&first.name)
                && candidate.get_property("RECURRENCE-ID").is_none()
                && candidate.get_property("UID").map(|uid| uid.value.as_str()) == uid
        })
        .or(Some(first))
}

/// ## Summary
/// First start and last end of an event, recurrences and overrides included.
///
/// Recurring ends are capped at the expansion horizon; an unbounded rule
/// ends at the horizon.
fn event_span(
    calendar: &ICalendar,
    master: &Component,
    uid: &str,
) -> ServiceResult<(DateTime<Utc>, DateTime<Utc>)> {
    let dtstart = master
        .get_property("DTSTART")
        .ok_or_else(|| malformed("VEVENT without DTSTART"))?;
    let dtstart = values::parse_time_property(dtstart).map_err(malformed)?;
    let duration = expand::instance_duration(master, &dtstart).map_err(malformed)?;
    let first = dtstart.to_utc();
    let first_end = expand::instance_end(first, duration).map_err(malformed)?;

    let Some(recurrence) =
        RecurrenceSet::from_component(master, &dtstart, duration).map_err(malformed)?
    else {
        return Ok((first, first_end));
    };

    let horizon = expand::horizon();
    let mut last = recurrence.last_end_within(horizon).unwrap_or(first_end);

    for exception in calendar.components.iter().filter(|candidate| {
        candidate.is(Component::VEVENT)
            && candidate.get_property("RECURRENCE-ID").is_some()
            && candidate.get_property("UID").is_some_and(|value| value.value.trim() == uid)
    }) {
        let Some(start) = exception.get_property("DTSTART") else {
            continue;
        };
        let start = values::parse_time_property(start).map_err(malformed)?;
        let length = expand::instance_duration(exception, &start).map_err(malformed)?;
        let end = expand::instance_end(start.to_utc(), length).map_err(malformed)?;
        last = last.max(end.min(horizon));
    }

    Ok((first, last))
}
