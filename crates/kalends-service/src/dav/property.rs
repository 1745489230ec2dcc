//! Property patches and the enumerated property mappings built on them.
//!
//! A patch names properties in Clark notation (`{namespace}local-name`).
//! Each collection kind enumerates the properties it stores; a patch naming
//! anything else is rejected as a whole.

use crate::error::{ServiceError, ServiceResult};

/// Ordered set/remove operations on collection properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropPatch {
    /// `(clark name, Some(value))` sets, `(clark name, None)` removes.
    pub updates: Vec<(String, Option<String>)>,
}

impl PropPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.updates.push((name.into(), Some(value.into())));
        self
    }

    #[must_use]
    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.updates.push((name.into(), None));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Value set for `name` by this patch, if any.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.updates
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == name)
            .and_then(|(_, value)| value.as_deref())
    }
}

/// A closed set of storable properties keyed by Clark name.
pub trait EnumeratedProperty: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn clark_name(self) -> &'static str;

    #[must_use]
    fn from_clark(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|property| property.clark_name() == name)
    }
}

/// ## Summary
/// Resolves every name in `patch` to `P`.
///
/// ## Errors
/// Returns [`ServiceError::UnsupportedProperty`] naming the first property
/// outside `P`; nothing from the patch is applied in that case.
pub fn resolve_patch<P: EnumeratedProperty>(
    patch: &PropPatch,
) -> ServiceResult<Vec<(P, Option<&str>)>> {
    patch
        .updates
        .iter()
        .map(|(name, value)| {
            P::from_clark(name)
                .map(|property| (property, value.as_deref()))
                .ok_or_else(|| {
                    tracing::warn!(property = %name, "Rejecting patch with unsupported property");
                    ServiceError::UnsupportedProperty(name.clone())
                })
        })
        .collect()
}

pub(crate) fn invalid_value(property: &str, value: &str) -> ServiceError {
    ServiceError::InvalidPropertyValue {
        property: property.to_owned(),
        value: value.to_owned(),
    }
}

/// ## Summary
/// Parses an integer property such as `calendar-order`.
///
/// ## Errors
/// Returns [`ServiceError::InvalidPropertyValue`] if `value` is not an integer.
pub(crate) fn parse_order(property: &str, value: &str) -> ServiceResult<i32> {
    value
        .trim()
        .parse()
        .map_err(|_err: std::num::ParseIntError| invalid_value(property, value))
}
