//! Recurrence expansion for recurring components.
//!
//! Builds an `rrule` set from `RRULE`/`RDATE`/`EXDATE` and walks it lazily in
//! the zone of `DTSTART`, so DST transitions keep the wall-clock time stable.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rrule::{RRule, RRuleSet, Tz, Unvalidated};

use kalends_core::constants::{MAX_RECURRENCE_INSTANCES, OCCURRENCE_HORIZON};

use super::core::Component;
use super::duration::parse_duration;
use super::values::{self, ICalTime, Zone};
use crate::error::{RfcError, RfcResult};

/// The expansion horizon as a UTC instant.
#[must_use]
pub fn horizon() -> DateTime<Utc> {
    DateTime::from_timestamp(OCCURRENCE_HORIZON, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// ## Summary
/// Length of one instance of `component`.
///
/// `DTEND - DTSTART` if `DTEND` is present, else `DURATION`, else one day for
/// an all-day `DTSTART`, else zero.
///
/// ## Errors
/// Returns [`RfcError::InvalidValue`] if `DTEND` or `DURATION` is malformed.
pub fn instance_duration(component: &Component, dtstart: &ICalTime) -> RfcResult<TimeDelta> {
    if let Some(dtend) = component.get_property("DTEND") {
        let dtend = values::parse_time_property(dtend)?;
        return Ok(dtend.to_utc() - dtstart.to_utc());
    }
    if let Some(duration) = component.get_property("DURATION") {
        return parse_duration(&duration.value);
    }
    if dtstart.is_date {
        return Ok(TimeDelta::days(1));
    }
    Ok(TimeDelta::zero())
}

/// ## Summary
/// End of an instance starting at `start` and lasting `duration`.
///
/// ## Errors
/// Returns [`RfcError::InvalidValue`] if the end is not a representable instant.
pub fn instance_end(start: DateTime<Utc>, duration: TimeDelta) -> RfcResult<DateTime<Utc>> {
    start
        .checked_add_signed(duration)
        .ok_or_else(|| RfcError::InvalidValue {
            property: "DURATION".to_owned(),
            value: format!("{}s past {start}", duration.num_seconds()),
        })
}

fn saturating_end(start: DateTime<Utc>, duration: TimeDelta) -> DateTime<Utc> {
    start.checked_add_signed(duration).unwrap_or(if duration < TimeDelta::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// A single expanded instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Expanded view of a component's recurrence properties.
#[derive(Debug, Clone)]
pub struct RecurrenceSet {
    rrule_set: RRuleSet,
    duration: TimeDelta,
    unbounded: bool,
}

impl RecurrenceSet {
    /// ## Summary
    /// Builds the recurrence set of `component`, or `None` if it has no `RRULE`.
    ///
    /// `dtstart` is the already parsed `DTSTART` and `duration` the length of
    /// every instance.
    ///
    /// ## Errors
    /// Returns [`RfcError::RecurrenceError`] if the rule does not parse or
    /// validate, and [`RfcError::InvalidValue`] for malformed `RDATE`/`EXDATE`
    /// or a `duration` that overflows the first instance.
    pub fn from_component(
        component: &Component,
        dtstart: &ICalTime,
        duration: TimeDelta,
    ) -> RfcResult<Option<Self>> {
        let rules: Vec<&str> = component
            .get_properties("RRULE")
            .map(|property| property.value.as_str())
            .collect();
        if rules.is_empty() {
            return Ok(None);
        }

        instance_end(dtstart.to_utc(), duration)?;

        let tz = rrule_zone(dtstart.zone);
        let start = to_rrule_time(&tz, dtstart);
        let unbounded = rules.iter().any(|rule| is_unbounded_rule(rule));

        let mut parsed = rules
            .iter()
            .map(|rule| parse_rule(&normalize_until(rule, dtstart)));
        let Some(first) = parsed.next().transpose()? else {
            return Ok(None);
        };
        let mut rrule_set = first
            .build(start)
            .map_err(|err| RfcError::RecurrenceError(err.to_string()))?;
        for rule in parsed {
            let rule = rule?
                .validate(start)
                .map_err(|err| RfcError::RecurrenceError(err.to_string()))?;
            rrule_set = rrule_set.rrule(rule);
        }

        let rdates = collect_times(component, "RDATE", &tz)?;
        if !rdates.is_empty() {
            rrule_set = rrule_set.set_rdates(rdates);
        }
        let exdates = collect_times(component, "EXDATE", &tz)?;
        if !exdates.is_empty() {
            rrule_set = rrule_set.set_exdates(exdates);
        }

        tracing::trace!(
            rule_count = rules.len(),
            unbounded,
            duration_seconds = duration.num_seconds(),
            "Built recurrence set"
        );

        Ok(Some(Self {
            rrule_set,
            duration,
            unbounded,
        }))
    }

    /// True when no rule carries `COUNT` or `UNTIL`.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.unbounded
    }

    #[must_use]
    pub const fn duration(&self) -> TimeDelta {
        self.duration
    }

    /// Lazily yields at most [`MAX_RECURRENCE_INSTANCES`] instances in start
    /// order. An end past the representable range saturates.
    pub fn occurrences(&self) -> impl Iterator<Item = Occurrence> + '_ {
        (&self.rrule_set)
            .into_iter()
            .take(MAX_RECURRENCE_INSTANCES)
            .map(move |start| {
                let start = start.with_timezone(&Utc);
                Occurrence {
                    start,
                    end: saturating_end(start, self.duration),
                }
            })
    }

    /// ## Summary
    /// Finds the end of the last instance, walking no further than `horizon`.
    ///
    /// Iteration stops at the first instance ending at or after `horizon`; an
    /// instance ending exactly at `horizon` counts. The result never exceeds
    /// `horizon`. An unbounded set returns `horizon` without iterating, and so
    /// does a set that yields [`MAX_RECURRENCE_INSTANCES`] instances without
    /// reaching `horizon`. Returns `None` when the set yields no instance at all.
    #[must_use]
    pub fn last_end_within(&self, horizon: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.unbounded {
            return Some(horizon);
        }

        let mut last = None;
        let mut walked = 0;
        for occurrence in self.occurrences() {
            if occurrence.end >= horizon {
                return Some(horizon);
            }
            last = Some(occurrence.end);
            walked += 1;
        }
        if walked == MAX_RECURRENCE_INSTANCES {
            tracing::debug!(walked, "Recurrence expansion capped, ending at horizon");
            return Some(horizon);
        }
        last
    }
}

/// ## Summary
/// Returns true if an `RRULE` value has neither `COUNT` nor `UNTIL`.
#[must_use]
pub fn is_unbounded_rule(rule: &str) -> bool {
    !rule.split(';').any(|part| {
        part.split_once('=').is_some_and(|(key, _)| {
            let key = key.trim();
            key.eq_ignore_ascii_case("COUNT") || key.eq_ignore_ascii_case("UNTIL")
        })
    })
}

fn parse_rule(rule: &str) -> RfcResult<RRule<Unvalidated>> {
    rule.parse::<RRule<Unvalidated>>()
        .map_err(|err| RfcError::RecurrenceError(format!("{rule}: {err}")))
}

/// Rewrites a local or date-only `UNTIL` as UTC in the zone of `DTSTART`.
fn normalize_until(rule: &str, dtstart: &ICalTime) -> String {
    rule.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value))
                if key.trim().eq_ignore_ascii_case("UNTIL") && !value.trim().ends_with(['Z', 'z']) =>
            {
                match values::parse_time_text("UNTIL", value, None) {
                    Ok(until) => {
                        let until = ICalTime {
                            zone: dtstart.zone,
                            ..until
                        };
                        format!("UNTIL={}", until.to_utc().format("%Y%m%dT%H%M%SZ"))
                    }
                    Err(_) => part.to_owned(),
                }
            }
            _ => part.to_owned(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn rrule_zone(zone: Zone) -> Tz {
    match zone {
        Zone::Named(tz) => Tz::Tz(tz),
        Zone::Utc | Zone::Floating => Tz::UTC,
    }
}

fn to_rrule_time(tz: &Tz, value: &ICalTime) -> DateTime<Tz> {
    match value.zone {
        Zone::Named(_) => tz
            .from_local_datetime(&value.local)
            .earliest()
            .unwrap_or_else(|| value.to_utc().with_timezone(tz)),
        Zone::Utc | Zone::Floating => value.to_utc().with_timezone(tz),
    }
}

fn collect_times(component: &Component, name: &str, tz: &Tz) -> RfcResult<Vec<DateTime<Tz>>> {
    let mut times = Vec::new();
    for property in component.get_properties(name) {
        for value in values::parse_time_list(property)? {
            times.push(value.to_utc().with_timezone(tz));
        }
    }
    Ok(times)
}
