//! Precise calendar-query evaluation against a parsed calendar object.
//!
//! Time-range semantics follow RFC 4791 §9.9. Values that cannot be parsed,
//! or whose end is not a representable instant, never match; only an
//! unsupported collation aborts evaluation.

use chrono::{DateTime, TimeDelta, Utc};

use super::core::{Component, ICalendar, Property};
use super::duration::parse_duration;
use super::expand::{self, RecurrenceSet};
use super::values::{self, ICalTime};
use crate::error::RfcResult;
use crate::rfc::filter::{CalendarFilter, CompFilter, ParamFilter, PropFilter, TimeRange};

/// ## Summary
/// Evaluates a calendar-query filter against a parsed calendar object.
///
/// ## Errors
/// Returns an error if a text-match names an unsupported collation.
pub fn calendar_matches(calendar: &ICalendar, filter: &CalendarFilter) -> RfcResult<bool> {
    if !filter.component.eq_ignore_ascii_case(Component::VCALENDAR) {
        return Ok(false);
    }
    for prop_filter in &filter.prop_filters {
        if !prop_filter_matches(&calendar.properties, prop_filter)? {
            return Ok(false);
        }
    }
    for comp_filter in &filter.comp_filters {
        if !comp_filter_matches(&calendar.components, None, comp_filter)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn comp_filter_matches(
    candidates: &[Component],
    parent: Option<&Component>,
    filter: &CompFilter,
) -> RfcResult<bool> {
    let mut named = candidates
        .iter()
        .filter(|candidate| candidate.is(&filter.name))
        .peekable();

    if filter.is_not_defined {
        return Ok(named.peek().is_none());
    }

    for component in named {
        if component_satisfies(component, parent, filter)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn component_satisfies(
    component: &Component,
    parent: Option<&Component>,
    filter: &CompFilter,
) -> RfcResult<bool> {
    if let Some(range) = &filter.time_range
        && !component_in_range(component, parent, range)
    {
        return Ok(false);
    }
    for prop_filter in &filter.prop_filters {
        if !prop_filter_matches(&component.properties, prop_filter)? {
            return Ok(false);
        }
    }
    for comp_filter in &filter.comp_filters {
        if !comp_filter_matches(&component.components, Some(component), comp_filter)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn prop_filter_matches(properties: &[Property], filter: &PropFilter) -> RfcResult<bool> {
    let mut named = properties
        .iter()
        .filter(|property| property.is(&filter.name))
        .peekable();

    if filter.is_not_defined {
        return Ok(named.peek().is_none());
    }

    for property in named {
        if property_satisfies(property, filter)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn property_satisfies(property: &Property, filter: &PropFilter) -> RfcResult<bool> {
    if let Some(range) = &filter.time_range {
        let Ok(value) = values::parse_time_property(property) else {
            return Ok(false);
        };
        let start = value.to_utc();
        let in_range = if value.is_date {
            start
                .checked_add_signed(TimeDelta::days(1))
                .is_some_and(|end| range.overlaps(start, end))
        } else {
            range.contains(start)
        };
        if !in_range {
            return Ok(false);
        }
    }
    if let Some(text_match) = &filter.text_match
        && !text_match.matches(&property.value)?
    {
        return Ok(false);
    }
    for param_filter in &filter.param_filters {
        if !param_filter_matches(property, param_filter)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn param_filter_matches(property: &Property, filter: &ParamFilter) -> RfcResult<bool> {
    let mut named = property
        .params
        .iter()
        .filter(|param| param.name.eq_ignore_ascii_case(&filter.name))
        .peekable();

    if filter.is_not_defined {
        return Ok(named.peek().is_none());
    }

    let Some(text_match) = &filter.text_match else {
        return Ok(named.peek().is_some());
    };
    for param in named {
        if let Some(value) = &param.value
            && text_match.matches(value)?
        {
            return Ok(true);
        }
    }
    Ok(false)
}

fn component_in_range(component: &Component, parent: Option<&Component>, range: &TimeRange) -> bool {
    match component.name.as_str() {
        Component::VEVENT | Component::VAVAILABILITY => event_in_range(component, range),
        Component::VTODO => todo_in_range(component, range),
        Component::VJOURNAL => journal_in_range(component, range),
        Component::VFREEBUSY => freebusy_in_range(component, range),
        Component::VALARM => parent.is_some_and(|parent| alarm_in_range(component, parent, range)),
        other => {
            tracing::debug!(component = %other, "time-range on unsupported component never matches");
            false
        }
    }
}

fn time_of(component: &Component, name: &str) -> Option<ICalTime> {
    let property = component.get_property(name)?;
    match values::parse_time_property(property) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(property = %name, error = %err, "Ignoring unparseable date value");
            None
        }
    }
}

fn utc_of(component: &Component, name: &str) -> Option<DateTime<Utc>> {
    time_of(component, name).map(|value| value.to_utc())
}

fn duration_of(component: &Component) -> Option<TimeDelta> {
    parse_duration(&component.get_property("DURATION")?.value).ok()
}

fn event_in_range(component: &Component, range: &TimeRange) -> bool {
    let Some(dtstart) = time_of(component, "DTSTART") else {
        return false;
    };
    let Ok(duration) = expand::instance_duration(component, &dtstart) else {
        return false;
    };

    match RecurrenceSet::from_component(component, &dtstart, duration) {
        Ok(None) => {
            let start = dtstart.to_utc();
            start
                .checked_add_signed(duration)
                .is_some_and(|end| range.overlaps(start, end))
        }
        Ok(Some(set)) => recurrence_in_range(&set, range),
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring unexpandable recurrence in time-range test");
            false
        }
    }
}

/// Instances past the expansion cap are never considered.
fn recurrence_in_range(set: &RecurrenceSet, range: &TimeRange) -> bool {
    let horizon = expand::horizon();
    for occurrence in set.occurrences() {
        if occurrence.start >= horizon || range.end.is_some_and(|end| occurrence.start >= end) {
            return false;
        }
        if range.overlaps(occurrence.start, occurrence.end) {
            return true;
        }
    }
    false
}

fn open_bounds(range: &TimeRange) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        range.start.unwrap_or(DateTime::<Utc>::MIN_UTC),
        range.end.unwrap_or(DateTime::<Utc>::MAX_UTC),
    )
}

fn todo_in_range(component: &Component, range: &TimeRange) -> bool {
    let (start, end) = open_bounds(range);
    let dtstart = utc_of(component, "DTSTART");
    let duration = duration_of(component);
    let due = utc_of(component, "DUE");
    let completed = utc_of(component, "COMPLETED");
    let created = utc_of(component, "CREATED");

    match (dtstart, duration, due, completed, created) {
        (Some(dtstart), Some(duration), None, _, _) => dtstart
            .checked_add_signed(duration)
            .is_some_and(|until| start <= until && (end > dtstart || end >= until)),
        (Some(dtstart), None, Some(due), _, _) => {
            (start < due || start <= dtstart) && (end > dtstart || end >= due)
        }
        (Some(dtstart), None, None, _, _) => start <= dtstart && end > dtstart,
        (None, _, Some(due), _, _) => start < due && end >= due,
        (None, _, None, Some(completed), Some(created)) => {
            (start <= created || start <= completed) && (end >= created || end >= completed)
        }
        (None, _, None, Some(completed), None) => start <= completed && end >= completed,
        (None, _, None, None, Some(created)) => end > created,
        _ => true,
    }
}

fn journal_in_range(component: &Component, range: &TimeRange) -> bool {
    let Some(dtstart) = time_of(component, "DTSTART") else {
        return false;
    };
    let start = dtstart.to_utc();
    if dtstart.is_date {
        start
            .checked_add_signed(TimeDelta::days(1))
            .is_some_and(|end| range.overlaps(start, end))
    } else {
        range.overlaps(start, start)
    }
}

fn freebusy_in_range(component: &Component, range: &TimeRange) -> bool {
    let (start, end) = open_bounds(range);
    if let (Some(dtstart), Some(dtend)) = (utc_of(component, "DTSTART"), utc_of(component, "DTEND")) {
        return start <= dtend && end > dtstart;
    }

    component.get_properties("FREEBUSY").any(|property| {
        property.value.split(',').any(|period| {
            let Some((period_start, period_end)) = period.split_once('/') else {
                return false;
            };
            let Ok(period_start) = values::parse_time_text("FREEBUSY", period_start, None) else {
                return false;
            };
            let period_start = period_start.to_utc();
            let period_end = match values::parse_time_text("FREEBUSY", period_end, None) {
                Ok(value) => value.to_utc(),
                Err(_) => match parse_duration(period_end)
                    .ok()
                    .and_then(|duration| period_start.checked_add_signed(duration))
                {
                    Some(end) => end,
                    None => return false,
                },
            };
            start < period_end && end > period_start
        })
    })
}

fn alarm_in_range(alarm: &Component, parent: &Component, range: &TimeRange) -> bool {
    trigger_time(alarm, parent).is_some_and(|trigger| range.overlaps(trigger, trigger))
}

/// Absolute instant of a `VALARM` trigger.
fn trigger_time(alarm: &Component, parent: &Component) -> Option<DateTime<Utc>> {
    let trigger = alarm.get_property("TRIGGER")?;

    if trigger
        .get_param_value("VALUE")
        .is_some_and(|value| value.eq_ignore_ascii_case("DATE-TIME"))
    {
        return values::parse_time_property(trigger).ok().map(|value| value.to_utc());
    }

    let offset = parse_duration(&trigger.value).ok()?;
    let related_to_end = trigger
        .get_param_value("RELATED")
        .is_some_and(|related| related.eq_ignore_ascii_case("END"));

    let anchor = if related_to_end {
        utc_of(parent, "DTEND")
            .or_else(|| utc_of(parent, "DUE"))
            .or_else(|| utc_of(parent, "DTSTART")?.checked_add_signed(duration_of(parent)?))?
    } else {
        utc_of(parent, "DTSTART")?
    };
    anchor.checked_add_signed(offset)
}
