//! Pinned version set: library name -> exact version string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{KilnError, Result};

/// Mapping from library name to an exact version string.
///
/// Invariant: every entry resolves to exactly one release. Floating
/// specifiers (`latest`, ranges, wildcards) are rejected at validation
/// time, never at build time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PinnedVersionSet {
    pins: BTreeMap<String, String>,
}

impl PinnedVersionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a pin.
    pub fn pin(&mut self, library: &str, version: &str) {
        self.pins.insert(library.to_string(), version.to_string());
    }

    /// Exact version for a library, if pinned.
    pub fn get(&self, library: &str) -> Option<&str> {
        self.pins.get(library).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Iterate pins in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pins.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Reject any entry that is not an exact version string.
    pub fn validate(&self) -> Result<()> {
        for (library, version) in &self.pins {
            if !is_exact_version(version) {
                return Err(KilnError::PinViolation {
                    library: library.clone(),
                    spec: version.clone(),
                });
            }
        }
        Ok(())
    }
}

/// An exact version is non-empty, not a keyword like `latest`, and
/// contains no range operators, wildcards, or whitespace.
fn is_exact_version(version: &str) -> bool {
    if version.is_empty() || version.eq_ignore_ascii_case("latest") {
        return false;
    }
    !version
        .chars()
        .any(|c| matches!(c, '<' | '>' | '=' | '!' | '~' | '*' | ' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_pin_validates() {
        let mut pins = PinnedVersionSet::new();
        pins.pin("hail", "0.2.122");
        assert!(pins.validate().is_ok());
        assert_eq!(pins.get("hail"), Some("0.2.122"));
    }

    #[test]
    fn latest_is_rejected() {
        let mut pins = PinnedVersionSet::new();
        pins.pin("hail", "latest");
        assert!(matches!(
            pins.validate(),
            Err(KilnError::PinViolation { .. })
        ));
    }

    #[test]
    fn range_specifiers_are_rejected() {
        for bad in [">=0.2", "~0.2", "0.2.*", "==0.2.122", ""] {
            let mut pins = PinnedVersionSet::new();
            pins.pin("hail", bad);
            assert!(pins.validate().is_err(), "expected rejection of {bad:?}");
        }
    }

    #[test]
    fn iteration_is_name_ordered() {
        let mut pins = PinnedVersionSet::new();
        pins.pin("zlib", "1.0");
        pins.pin("abc", "2.0");
        let names: Vec<_> = pins.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["abc", "zlib"]);
    }

    #[test]
    fn serde_is_transparent_map() {
        let mut pins = PinnedVersionSet::new();
        pins.pin("hail", "0.2.122");
        let json = serde_json::to_value(&pins).unwrap();
        assert_eq!(json["hail"], "0.2.122");
    }
}
