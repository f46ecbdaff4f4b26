//! Linear unit conversions between the source and target layout models
//!
//! The source platform measures everything in twips (1/1440 inch); the
//! target model accepts points, inches, or centimeters. All conversions go
//! through a twips pivot so every supported pair round-trips.

use serde::{Deserialize, Serialize};

/// Supported linear units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Twip,
    Point,
    Inch,
    Centimeter,
}

/// Twips per unit of each supported unit
const fn twips_per(unit: Unit) -> f64 {
    match unit {
        Unit::Twip => 1.0,
        Unit::Point => 20.0,
        Unit::Inch => 1440.0,
        Unit::Centimeter => 566.929,
    }
}

/// Convert a value between any two supported units
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    if from == to {
        return value;
    }
    value * twips_per(from) / twips_per(to)
}

/// Convert a twips value into the given unit
pub fn twips_to(value: f64, unit: Unit) -> f64 {
    convert(value, Unit::Twip, unit)
}

/// Convert a value in the given unit into twips
pub fn to_twips(value: f64, unit: Unit) -> f64 {
    convert(value, unit, Unit::Twip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const UNITS: [Unit; 4] = [Unit::Twip, Unit::Point, Unit::Inch, Unit::Centimeter];

    #[test]
    fn test_known_conversions() {
        assert_eq!(convert(1440.0, Unit::Twip, Unit::Inch), 1.0);
        assert_eq!(convert(1.0, Unit::Inch, Unit::Point), 72.0);
        assert_eq!(convert(40.0, Unit::Twip, Unit::Point), 2.0);
        assert!((convert(2.54, Unit::Centimeter, Unit::Inch) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_identity() {
        assert_eq!(convert(123.45, Unit::Point, Unit::Point), 123.45);
    }

    proptest! {
        #[test]
        fn round_trip_within_tolerance(
            value in 0.0f64..1_000_000.0,
            from_idx in 0usize..4,
            to_idx in 0usize..4,
        ) {
            let from = UNITS[from_idx];
            let to = UNITS[to_idx];
            let back = convert(convert(value, from, to), to, from);
            let tolerance = 1e-6 * value.max(1.0);
            prop_assert!((back - value).abs() <= tolerance);
        }
    }
}
