//! Attribute type classification.
//!
//! Collapses the declared [`ValueType`] of a column into the three semantic
//! kinds that decide literal encoding. Runs once per attribute when the schema
//! is built; values are never re-inspected to pick an encoding.

use crate::dataset::{AttributeKind, ValueType};

/// Classify a declared value type. Nominal takes precedence over date/time,
/// and everything that is neither is numeric.
pub fn classify(value_type: ValueType) -> AttributeKind {
    if value_type.is_nominal() {
        AttributeKind::Nominal
    } else if value_type.is_date_time() {
        AttributeKind::DateTime
    } else {
        AttributeKind::Numeric
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominal_family() {
        for vt in [
            ValueType::Nominal,
            ValueType::Binominal,
            ValueType::Polynominal,
            ValueType::Text,
            ValueType::FilePath,
        ] {
            assert_eq!(classify(vt), AttributeKind::Nominal, "{vt:?}");
        }
    }

    #[test]
    fn date_time_family() {
        for vt in [ValueType::DateTime, ValueType::Date, ValueType::Time] {
            assert_eq!(classify(vt), AttributeKind::DateTime, "{vt:?}");
        }
    }

    #[test]
    fn everything_else_is_numeric() {
        for vt in [ValueType::Numeric, ValueType::Integer, ValueType::Real] {
            assert_eq!(classify(vt), AttributeKind::Numeric, "{vt:?}");
        }
    }
}
