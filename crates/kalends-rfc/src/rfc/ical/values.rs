//! DATE and DATE-TIME value handling.
//!
//! Every value is resolved to UTC at this boundary: `Z` values are UTC,
//! `TZID` values are resolved through the IANA database, floating values and
//! dates are read as UTC wall-clock time.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use super::core::Property;
use crate::error::{RfcError, RfcResult};

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Zone a DATE-TIME value was expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Utc,
    /// No zone information; treated as UTC.
    Floating,
    Named(Tz),
}

/// A DATE or DATE-TIME value together with its zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ICalTime {
    /// Wall-clock time as written (midnight for dates).
    pub local: NaiveDateTime,
    pub zone: Zone,
    /// The value had no time part (`VALUE=DATE`).
    pub is_date: bool,
}

impl ICalTime {
    /// ## Summary
    /// Converts the value to UTC.
    ///
    /// Wall-clock times skipped by a DST transition move forward by the size
    /// of the gap; ambiguous times resolve to the earlier instant.
    #[must_use]
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self.zone {
            Zone::Utc | Zone::Floating => self.local.and_utc(),
            Zone::Named(tz) => resolve_local(&tz, self.local),
        }
    }

    /// Epoch seconds of [`ICalTime::to_utc`].
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.to_utc().timestamp()
    }
}

fn resolve_local(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            // Inside a DST gap: the wall clock jumped over `local`.
            let shifted = local + TimeDelta::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map_or_else(|| local.and_utc(), |dt| dt.with_timezone(&Utc))
        }
    }
}

/// ## Summary
/// Resolves a `TZID` parameter to an IANA zone.
///
/// A leading `/` (globally unique identifier prefix) is ignored. Unknown
/// identifiers yield `None` and the value is treated as floating.
#[must_use]
pub fn resolve_tzid(tzid: &str) -> Option<Tz> {
    let name = tzid.trim().trim_start_matches('/');
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            tracing::warn!(tzid = %tzid, "Unknown TZID, treating value as floating time");
            None
        }
    }
}

/// ## Summary
/// Parses a single DATE or DATE-TIME text with an optional `TZID`.
///
/// ## Errors
/// Returns [`RfcError::InvalidValue`] if the text matches neither format.
pub fn parse_time_text(property: &str, text: &str, tzid: Option<&str>) -> RfcResult<ICalTime> {
    let text = text.trim();
    let invalid = |err: chrono::ParseError| RfcError::InvalidValue {
        property: property.to_owned(),
        value: format!("{text} ({err})"),
    };

    if text.len() == 8 {
        let date = NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(invalid)?;
        return Ok(ICalTime {
            local: date.and_time(NaiveTime::MIN),
            zone: Zone::Floating,
            is_date: true,
        });
    }

    if let Some(utc_text) = text.strip_suffix('Z').or_else(|| text.strip_suffix('z')) {
        let local = NaiveDateTime::parse_from_str(utc_text, DATE_TIME_FORMAT).map_err(invalid)?;
        return Ok(ICalTime {
            local,
            zone: Zone::Utc,
            is_date: false,
        });
    }

    let local = NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT).map_err(invalid)?;
    let zone = tzid.and_then(resolve_tzid).map_or(Zone::Floating, Zone::Named);
    Ok(ICalTime {
        local,
        zone,
        is_date: false,
    })
}

/// ## Summary
/// Parses a DATE or DATE-TIME property such as `DTSTART` or `DUE`.
///
/// ## Errors
/// Returns [`RfcError::InvalidValue`] if the value cannot be parsed.
pub fn parse_time_property(property: &Property) -> RfcResult<ICalTime> {
    parse_time_text(
        &property.name,
        &property.value,
        property.get_param_value("TZID"),
    )
}

/// ## Summary
/// Parses a comma-separated DATE/DATE-TIME/PERIOD list (`EXDATE`, `RDATE`).
///
/// For PERIOD values only the start of each period is returned.
///
/// ## Errors
/// Returns [`RfcError::InvalidValue`] if any element cannot be parsed.
pub fn parse_time_list(property: &Property) -> RfcResult<Vec<ICalTime>> {
    let tzid = property.get_param_value("TZID");
    property
        .value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let start = item.split_once('/').map_or(item, |(start, _)| start);
            parse_time_text(&property.name, start, tzid)
        })
        .collect()
}

/// ## Summary
/// Parses a UTC timestamp such as a `time-range` attribute (`20240101T000000Z`).
///
/// ## Errors
/// Returns [`RfcError::InvalidValue`] if the text is not a UTC DATE-TIME.
pub fn parse_utc(text: &str) -> RfcResult<DateTime<Utc>> {
    let value = parse_time_text("time-range", text, None)?;
    if value.zone == Zone::Utc {
        Ok(value.to_utc())
    } else {
        Err(RfcError::InvalidValue {
            property: "time-range".to_owned(),
            value: text.to_owned(),
        })
    }
}
