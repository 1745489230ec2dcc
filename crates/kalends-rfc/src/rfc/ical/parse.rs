//! Payload parsing on top of the `icalendar` content-line parser.

use icalendar::parser::{read_calendar, unfold};

use super::core::{Component, ICalendar, Parameter, Property};
use crate::error::{RfcError, RfcResult};

/// ## Summary
/// Parses a raw calendar object payload into an owned [`ICalendar`].
///
/// Continuation lines are unfolded first. Component, property and parameter
/// names are upper-cased; values are kept verbatim.
///
/// ## Errors
/// Returns [`RfcError::ParseError`] if the payload is not UTF-8 or is not a
/// syntactically valid iCalendar stream.
#[tracing::instrument(skip(payload), fields(payload_len = payload.len()))]
pub fn parse_calendar(payload: &[u8]) -> RfcResult<ICalendar> {
    let text = std::str::from_utf8(payload)
        .map_err(|err| RfcError::ParseError(format!("payload is not valid UTF-8: {err}")))?;

    let unfolded = unfold(text);
    let calendar = read_calendar(&unfolded).map_err(|err| {
        tracing::debug!(error = %err, "iCalendar parser rejected payload");
        RfcError::ParseError(err.to_string())
    })?;

    Ok(ICalendar {
        properties: calendar.properties.iter().map(convert_property).collect(),
        components: calendar.components.iter().map(convert_component).collect(),
    })
}

fn convert_component(component: &icalendar::parser::Component<'_>) -> Component {
    Component {
        name: component.name.as_str().to_ascii_uppercase(),
        properties: component.properties.iter().map(convert_property).collect(),
        components: component.components.iter().map(convert_component).collect(),
    }
}

fn convert_property(property: &icalendar::parser::Property<'_>) -> Property {
    Property {
        name: property.name.as_str().to_ascii_uppercase(),
        value: property.val.as_str().to_owned(),
        params: property
            .params
            .iter()
            .map(|param| Parameter {
                name: param.key.as_str().to_ascii_uppercase(),
                value: param.val.as_ref().map(|value| value.as_str().to_owned()),
            })
            .collect(),
    }
}
