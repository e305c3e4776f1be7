//! Band selection for imagery requests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Alias for the true-color composite.
pub const RGB_ALIAS: &str = "RGB";

/// Logical band names accepted at the HTTP boundary.
pub const ALLOWED_BANDS: &[&str] = &["RGB", "NIR", "SWIR", "RED", "GREEN", "BLUE"];

/// Ordered, canonical list of band identifiers.
///
/// Canonical form is uppercase, trimmed, with empty entries removed. An
/// empty selection falls back to the `RGB` alias, so two specs that
/// differ only in case or whitespace compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BandSpec(Vec<String>);

impl BandSpec {
    /// Builds a canonical spec from individual band names.
    pub fn from_list<I, S>(bands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bands: Vec<String> = bands
            .into_iter()
            .map(|b| b.as_ref().trim().to_uppercase())
            .filter(|b| !b.is_empty())
            .collect();

        if bands.is_empty() {
            Self::rgb()
        } else {
            Self(bands)
        }
    }

    /// Builds a canonical spec from a comma-separated list.
    pub fn from_csv(csv: &str) -> Self {
        Self::from_list(csv.split(','))
    }

    /// The default true-color selection.
    pub fn rgb() -> Self {
        Self(vec![RGB_ALIAS.to_string()])
    }

    /// True when the spec is exactly the `RGB` alias.
    pub fn is_true_color(&self) -> bool {
        self.0.len() == 1 && self.0[0] == RGB_ALIAS
    }

    /// Band identifiers in request order.
    pub fn bands(&self) -> &[String] {
        &self.0
    }

    /// Canonical comma-separated form, e.g. `NIR,RED`.
    pub fn to_csv(&self) -> String {
        self.0.join(",")
    }

    /// Returns the first band not in [`ALLOWED_BANDS`], if any.
    pub fn first_unsupported(&self) -> Option<&str> {
        self.0
            .iter()
            .map(String::as_str)
            .find(|b| !ALLOWED_BANDS.contains(b))
    }
}

impl Default for BandSpec {
    fn default() -> Self {
        Self::rgb()
    }
}

impl fmt::Display for BandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_csv())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalizes_case_and_whitespace() {
        let spec = BandSpec::from_csv(" nir , Red,,");
        assert_eq!(spec.bands(), &["NIR".to_string(), "RED".to_string()]);
        assert_eq!(spec.to_csv(), "NIR,RED");
    }

    #[test]
    fn test_empty_defaults_to_rgb() {
        assert_eq!(BandSpec::from_csv(""), BandSpec::rgb());
        assert_eq!(BandSpec::from_list(Vec::<String>::new()), BandSpec::rgb());
        assert!(BandSpec::default().is_true_color());
    }

    #[test]
    fn test_rgb_alias_detection() {
        assert!(BandSpec::from_list(["rgb"]).is_true_color());
        assert!(!BandSpec::from_list(["RGB", "NIR"]).is_true_color());
    }

    #[test]
    fn test_order_is_preserved() {
        let a = BandSpec::from_list(["RED", "NIR"]);
        let b = BandSpec::from_list(["NIR", "RED"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_first_unsupported() {
        assert_eq!(BandSpec::from_csv("RED,NIR").first_unsupported(), None);
        assert_eq!(BandSpec::from_csv("RED,B12").first_unsupported(), Some("B12"));
    }
}
