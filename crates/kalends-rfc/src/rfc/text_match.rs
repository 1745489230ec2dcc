//! Text-match evaluation with RFC 4790 collations.

use icu::casemap::CaseMapper;

use crate::error::{RfcError, RfcResult};
use crate::rfc::filter::{MatchType, TextMatch};

/// Supported casemap modes for text matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Casemap {
    /// Case-sensitive (i;octet).
    Octet,
    /// ASCII-only casemap (i;ascii-casemap).
    Ascii,
    /// Unicode casemap (i;unicode-casemap).
    Unicode,
}

impl Casemap {
    /// Converts a collation string to a Casemap enum.
    ///
    /// ## Errors
    /// Returns [`RfcError::UnsupportedCollation`] if the collation is unknown.
    pub fn from_collation(collation: Option<&str>) -> RfcResult<Self> {
        match collation {
            Some("i;octet") => Ok(Self::Octet),
            Some("i;unicode-casemap") | None => Ok(Self::Unicode),
            Some("i;ascii-casemap") => Ok(Self::Ascii),
            Some(unsupported) => Err(RfcError::UnsupportedCollation(unsupported.to_owned())),
        }
    }

    /// Folds `text` so that equal strings under this collation compare equal.
    ///
    /// ASCII casemap only touches `A-Z`; `ß` stays `ß`. Unicode casemap uses
    /// full case folding, so `Straße` and `STRASSE` fold alike.
    #[must_use]
    pub fn fold(self, text: &str) -> String {
        match self {
            Self::Octet => text.to_owned(),
            Self::Ascii => text.to_ascii_lowercase(),
            Self::Unicode => CaseMapper::new().fold_string(text).into_owned(),
        }
    }
}

impl TextMatch {
    /// ## Summary
    /// Tests `candidate` against this text-match, honouring collation and negation.
    ///
    /// ## Errors
    /// Returns [`RfcError::UnsupportedCollation`] for unknown collations.
    pub fn matches(&self, candidate: &str) -> RfcResult<bool> {
        let casemap = Casemap::from_collation(self.collation.as_deref())?;
        let needle = casemap.fold(&self.value);
        let haystack = casemap.fold(candidate);

        let found = match self.match_type {
            MatchType::Contains => haystack.contains(&needle),
            MatchType::Equals => haystack == needle,
            MatchType::StartsWith => haystack.starts_with(&needle),
            MatchType::EndsWith => haystack.ends_with(&needle),
        };
        Ok(found != self.negate)
    }
}
