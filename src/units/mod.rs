//! Unit conversion and numeric formatting
//!
//! Toolpath values are stored in base units (millimetres, millimetres per
//! second). Output is rendered in the selected unit system at a fixed number
//! of fractional digits.

use serde::{Deserialize, Serialize};
use uom::si::f64::{Length, Velocity};
use uom::si::length::{inch, millimeter};
use uom::si::velocity::{inch_per_second, millimeter_per_second};

const SECONDS_PER_MINUTE: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    #[serde(rename = "metric", alias = "METRIC")]
    Metric, // G21
    #[serde(rename = "imperial", alias = "IMPERIAL", alias = "inches")]
    Imperial, // G20
}

impl UnitSystem {
    /// G-code word selecting this unit system
    pub fn units_code(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "G21",
            UnitSystem::Imperial => "G20",
        }
    }

    pub fn length_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "mm",
            UnitSystem::Imperial => "in",
        }
    }

    pub fn velocity_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "mm/min",
            UnitSystem::Imperial => "in/min",
        }
    }

    /// Imperial output always carries four fractional digits
    pub fn forced_precision(&self) -> Option<usize> {
        match self {
            UnitSystem::Metric => None,
            UnitSystem::Imperial => Some(4),
        }
    }
}

/// Physical dimension of a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Velocity,
    /// Angles, repeat counts - printed at precision, never converted
    Unitless,
    /// Tool numbers, spindle speeds, dwell periods: integers
    Count,
}

impl Dimension {
    /// Dimension implied by a parameter letter
    pub fn of(letter: char) -> Self {
        match letter.to_ascii_uppercase() {
            'F' => Dimension::Velocity,
            'T' | 'H' | 'D' | 'S' | 'P' | 'Q' | 'R' => Dimension::Count,
            'A' | 'B' | 'C' | 'L' => Dimension::Unitless,
            _ => Dimension::Length,
        }
    }
}

/// Convert a stored length (mm) to the display unit
pub fn display_length(mm: f64, units: UnitSystem) -> f64 {
    let length = Length::new::<millimeter>(mm);
    match units {
        UnitSystem::Metric => length.get::<millimeter>(),
        UnitSystem::Imperial => length.get::<inch>(),
    }
}

/// Convert a stored velocity (mm/s) to the display unit per minute
pub fn display_velocity(mm_per_sec: f64, units: UnitSystem) -> f64 {
    let velocity = Velocity::new::<millimeter_per_second>(mm_per_sec);
    let per_second = match units {
        UnitSystem::Metric => velocity.get::<millimeter_per_second>(),
        UnitSystem::Imperial => velocity.get::<inch_per_second>(),
    };
    per_second * SECONDS_PER_MINUTE
}

/// Renders stored values as output text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Formatter {
    units: UnitSystem,
    precision: usize,
}

impl Formatter {
    pub fn new(units: UnitSystem, precision: usize) -> Self {
        Self {
            units,
            precision: units.forced_precision().unwrap_or(precision),
        }
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn format(&self, value: f64, dimension: Dimension) -> String {
        match dimension {
            Dimension::Length => self.fixed(display_length(value, self.units), self.precision),
            Dimension::Velocity => {
                self.fixed(display_velocity(value, self.units), self.precision)
            }
            Dimension::Unitless => self.fixed(value, self.precision),
            Dimension::Count => format_count(value),
        }
    }

    /// Format a parameter by its letter, e.g. `X12.500`
    pub fn word(&self, letter: char, value: f64) -> String {
        format!("{}{}", letter, self.format(value, Dimension::of(letter)))
    }

    pub fn length(&self, mm: f64) -> String {
        self.format(mm, Dimension::Length)
    }

    /// Velocity at an explicit digit count
    pub fn velocity_with_digits(&self, mm_per_sec: f64, digits: usize) -> String {
        self.fixed(display_velocity(mm_per_sec, self.units), digits)
    }

    /// Plain number at an explicit digit count, never converted
    pub fn plain_with_digits(&self, value: f64, digits: usize) -> String {
        self.fixed(value, digits)
    }

    fn fixed(&self, value: f64, digits: usize) -> String {
        format!("{:.*}", digits, value)
    }
}

/// Integers are truncated toward zero
pub fn format_count(value: f64) -> String {
    (value.trunc() as i64).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_length() {
        let fmt = Formatter::new(UnitSystem::Metric, 3);
        assert_eq!(fmt.format(12.5, Dimension::Length), "12.500");
        assert_eq!(fmt.format(-2.0, Dimension::Length), "-2.000");
    }

    #[test]
    fn test_imperial_forces_four_digits() {
        let fmt = Formatter::new(UnitSystem::Imperial, 2);
        assert_eq!(fmt.precision(), 4);
        assert_eq!(fmt.format(25.4, Dimension::Length), "1.0000");
        assert_eq!(fmt.format(12.7, Dimension::Length), "0.5000");
    }

    #[test]
    fn test_velocity_per_minute() {
        let metric = Formatter::new(UnitSystem::Metric, 3);
        // 10 mm/s = 600 mm/min
        assert_eq!(metric.format(10.0, Dimension::Velocity), "600.000");

        let imperial = Formatter::new(UnitSystem::Imperial, 3);
        // 25.4 mm/s = 60 in/min
        assert_eq!(imperial.format(25.4, Dimension::Velocity), "60.0000");
    }

    #[test]
    fn test_counts_truncate() {
        let fmt = Formatter::new(UnitSystem::Imperial, 4);
        assert_eq!(fmt.format(3.9, Dimension::Count), "3");
        assert_eq!(fmt.format(-2.7, Dimension::Count), "-2");
        assert_eq!(fmt.word('T', 5.0), "T5");
        assert_eq!(fmt.word('S', 12000.0), "S12000");
    }

    #[test]
    fn test_unitless_is_not_converted() {
        let fmt = Formatter::new(UnitSystem::Imperial, 4);
        assert_eq!(fmt.word('A', 90.0), "A90.0000");
    }

    #[test]
    fn test_plain_digits_ignore_units() {
        let fmt = Formatter::new(UnitSystem::Imperial, 4);
        assert_eq!(fmt.plain_with_digits(700.0 * 0.001, 3), "0.700");
        assert_eq!(fmt.plain_with_digits(5.0, 0), "5");
    }

    #[test]
    fn test_dimension_by_letter() {
        assert_eq!(Dimension::of('x'), Dimension::Length);
        assert_eq!(Dimension::of('F'), Dimension::Velocity);
        assert_eq!(Dimension::of('R'), Dimension::Count);
        assert_eq!(Dimension::of('C'), Dimension::Unitless);
    }

    #[test]
    fn test_formatting_is_pure() {
        let fmt = Formatter::new(UnitSystem::Metric, 3);
        let a = fmt.format(1.0 / 3.0, Dimension::Length);
        let b = fmt.format(1.0 / 3.0, Dimension::Length);
        assert_eq!(a, b);
        assert_eq!(a, "0.333");
    }
}
