//! RFC 5545 §3.3.6 DURATION values.
//!
//! ```abnf
//! dur-value  = (["+"] / "-") "P" (dur-date / dur-time / dur-week)
//! dur-date   = dur-day [dur-time]
//! dur-time   = "T" (dur-hour / dur-minute / dur-second)
//! dur-week   = 1*DIGIT "W"
//! dur-hour   = 1*DIGIT "H" [dur-minute]
//! dur-minute = 1*DIGIT "M" [dur-second]
//! dur-second = 1*DIGIT "S"
//! dur-day    = 1*DIGIT "D"
//! ```
//!
//! The time part is accepted leniently: any non-empty subset of H, M and S in
//! that order.

use chrono::TimeDelta;
use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{one_of, satisfy, u32 as digits};
use nom::combinator::{all_consuming, map, map_opt, opt};
use nom::sequence::{pair, preceded, terminated, tuple};

use crate::error::{RfcError, RfcResult};

/// ## Summary
/// Parses a DURATION value such as `P1W`, `-PT15M` or `P1DT2H`.
///
/// ## Errors
/// Returns [`RfcError::InvalidValue`] if the text is not a complete duration.
pub fn parse_duration(text: &str) -> RfcResult<TimeDelta> {
    all_consuming(dur_value)(text.trim())
        .map(|(_, delta)| delta)
        .map_err(|err| RfcError::InvalidValue {
            property: "DURATION".to_owned(),
            value: format!("{text} ({err})"),
        })
}

/// nom parser for a full `dur-value`.
pub fn dur_value(input: &str) -> IResult<&str, TimeDelta> {
    map_opt(
        tuple((sign, tag_no_case("P"), alt((week, date, time)))),
        |(sign, _, delta)| delta.checked_mul(sign),
    )(input)
}

fn sign(input: &str) -> IResult<&str, i32> {
    map(opt(one_of("+-")), |sign| if sign == Some('-') { -1 } else { 1 })(input)
}

/// `1*DIGIT` followed by the given designator letter.
fn amount(designator: char) -> impl FnMut(&str) -> IResult<&str, i64> {
    move |input| {
        map(
            terminated(digits, satisfy(|c| c.eq_ignore_ascii_case(&designator))),
            i64::from,
        )(input)
    }
}

fn week(input: &str) -> IResult<&str, TimeDelta> {
    map_opt(amount('W'), TimeDelta::try_weeks)(input)
}

fn date(input: &str) -> IResult<&str, TimeDelta> {
    map_opt(pair(amount('D'), opt(time)), |(days, time)| {
        TimeDelta::try_days(days)?.checked_add(&time.unwrap_or_else(TimeDelta::zero))
    })(input)
}

fn time(input: &str) -> IResult<&str, TimeDelta> {
    preceded(
        tag_no_case("T"),
        map_opt(
            tuple((opt(amount('H')), opt(amount('M')), opt(amount('S')))),
            |parts| match parts {
                (None, None, None) => None,
                (hours, minutes, seconds) => TimeDelta::try_seconds(
                    hours.unwrap_or(0) * 3600 + minutes.unwrap_or(0) * 60 + seconds.unwrap_or(0),
                ),
            },
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_hours_and_seconds() {
        let delta = parse_duration("P15DT5H0M20S").unwrap();
        assert_eq!(
            delta,
            TimeDelta::days(15) + TimeDelta::hours(5) + TimeDelta::seconds(20)
        );
    }

    #[test]
    fn weeks() {
        assert_eq!(parse_duration("P7W").unwrap(), TimeDelta::weeks(7));
    }

    #[test]
    fn negative_minutes() {
        assert_eq!(parse_duration("-PT10M").unwrap(), TimeDelta::minutes(-10));
    }

    #[test]
    fn hours_and_seconds_without_minutes() {
        assert_eq!(
            parse_duration("PT1H30S").unwrap(),
            TimeDelta::hours(1) + TimeDelta::seconds(30)
        );
    }

    #[test]
    fn rejects_incomplete_values() {
        assert!(parse_duration("P").is_err());
        assert!(parse_duration("PT").is_err());
        assert!(parse_duration("P1DX").is_err());
        assert!(parse_duration("1D").is_err());
    }
}
