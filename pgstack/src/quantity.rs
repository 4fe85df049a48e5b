use std::fmt;

use thiserror::Error;

/// Errors returned when a quantity string fails to parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity cannot be empty")]
    Empty,
    #[error("`{0}` does not start with a valid number")]
    InvalidNumber(String),
    #[error("`{0}` has an unknown quantity suffix")]
    UnknownSuffix(String),
}

/// A Kubernetes-style resource quantity such as `250m`, `1.5Gi` or `2e3`.
///
/// The original string form is preserved so writes round-trip untouched.
/// Equality is numeric when both sides parsed, which keeps a quantity equal
/// to the normalized form the API server may echo back (`0.5Gi` vs `512Mi`).
#[derive(Debug, Clone)]
pub struct Quantity {
    raw: String,
    value: Option<f64>,
}

impl Quantity {
    /// Parses a quantity, rejecting anything outside the
    /// `<signedNumber><suffix>` grammar.
    pub fn parse(raw: &str) -> Result<Self, QuantityError> {
        if raw.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (number, suffix) = split_number(raw);
        let base: f64 = number
            .parse()
            .map_err(|_| QuantityError::InvalidNumber(raw.to_string()))?;
        let multiplier = suffix_multiplier(suffix)
            .ok_or_else(|| QuantityError::UnknownSuffix(raw.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            value: Some(base * multiplier),
        })
    }

    /// Wraps a string read back from the platform without failing.
    ///
    /// An unparseable value keeps its raw form and only compares equal to the
    /// identical string.
    pub fn from_raw(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|_| Self {
            raw: raw.to_string(),
            value: None,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Numeric value in base units with the suffix multiplier applied.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_positive(&self) -> bool {
        self.value.is_some_and(|value| value > 0.0)
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        match (self.value, other.value) {
            (Some(a), Some(b)) => a == b,
            _ => self.raw == other.raw,
        }
    }
}

impl Eq for Quantity {}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Splits `raw` into its leading signed decimal number and the remainder.
fn split_number(raw: &str) -> (&str, &str) {
    let bytes = raw.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    raw.split_at(end)
}

/// Maps a quantity suffix to its base-unit multiplier.
///
/// `E` alone is the decimal exa suffix while `e`/`E` followed by digits is
/// scientific notation, matching the Kubernetes grammar.
fn suffix_multiplier(suffix: &str) -> Option<f64> {
    let multiplier = match suffix {
        "" => 1.0,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024f64,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        _ => {
            let exponent: i32 = suffix.strip_prefix(['e', 'E'])?.parse().ok()?;
            10f64.powi(exponent)
        }
    };
    Some(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_decimal_numbers() {
        assert_eq!(Quantity::parse("1").unwrap().value(), Some(1.0));
        assert_eq!(Quantity::parse("1.5").unwrap().value(), Some(1.5));
        assert_eq!(Quantity::parse("-2").unwrap().value(), Some(-2.0));
        assert_eq!(Quantity::parse("+3").unwrap().value(), Some(3.0));
    }

    #[test]
    fn parses_decimal_si_suffixes() {
        assert_eq!(Quantity::parse("250m").unwrap().value(), Some(0.25));
        assert_eq!(Quantity::parse("100n").unwrap().value(), Some(1e-7));
        assert_eq!(Quantity::parse("2k").unwrap().value(), Some(2000.0));
        assert_eq!(Quantity::parse("1G").unwrap().value(), Some(1e9));
    }

    #[test]
    fn parses_binary_si_suffixes() {
        assert_eq!(Quantity::parse("1Ki").unwrap().value(), Some(1024.0));
        assert_eq!(
            Quantity::parse("1Gi").unwrap().value(),
            Some(1024f64 * 1024.0 * 1024.0)
        );
    }

    #[test]
    fn parses_scientific_notation() {
        assert_eq!(Quantity::parse("2e3").unwrap().value(), Some(2000.0));
        assert_eq!(Quantity::parse("1E3").unwrap().value(), Some(1000.0));
        assert_eq!(Quantity::parse("5e-3").unwrap().value(), Some(0.005));
    }

    #[test]
    fn bare_e_is_the_exa_suffix() {
        assert_eq!(Quantity::parse("1E").unwrap().value(), Some(1e18));
    }

    #[test]
    fn rejects_invalid_forms() {
        assert_eq!(Quantity::parse(""), Err(QuantityError::Empty));
        assert!(matches!(
            Quantity::parse("abc"),
            Err(QuantityError::InvalidNumber(_))
        ));
        assert!(matches!(
            Quantity::parse("1.2.3"),
            Err(QuantityError::UnknownSuffix(_))
        ));
        assert!(matches!(
            Quantity::parse("1X"),
            Err(QuantityError::UnknownSuffix(_))
        ));
        assert!(matches!(
            Quantity::parse("1e"),
            Err(QuantityError::UnknownSuffix(_))
        ));
    }

    #[test]
    fn equality_is_numeric_across_representations() {
        assert_eq!(Quantity::parse("1Gi").unwrap(), Quantity::parse("1024Mi").unwrap());
        assert_eq!(Quantity::parse("0.25").unwrap(), Quantity::parse("250m").unwrap());
        assert_ne!(Quantity::parse("1Gi").unwrap(), Quantity::parse("1G").unwrap());
    }

    #[test]
    fn positivity_checks_the_numeric_value() {
        assert!(Quantity::parse("1m").unwrap().is_positive());
        assert!(!Quantity::parse("0").unwrap().is_positive());
        assert!(!Quantity::parse("-1Gi").unwrap().is_positive());
        assert!(!Quantity::from_raw("garbage").is_positive());
    }

    #[test]
    fn unparseable_raw_values_compare_by_string() {
        assert_eq!(Quantity::from_raw("weird"), Quantity::from_raw("weird"));
        assert_ne!(Quantity::from_raw("weird"), Quantity::from_raw("other"));
    }
}
