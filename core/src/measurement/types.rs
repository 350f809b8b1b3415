//! Measurement value types.

use crate::numeric::{Similar, Tolerance};
use crate::units::{Dimension, DisplayUnits, SpecificUnits, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value with an uncertainty and a physical dimension.
///
/// Value and uncertainty are always stored in canonical base units, so two
/// measurements entered in different units compare directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    /// Absolute uncertainty, never negative
    pub uncertainty: f64,
    pub dimension: Dimension,
}

impl Measurement {
    /// Create a measurement already expressed in canonical units
    pub fn new(value: f64, uncertainty: f64, dimension: Dimension) -> Self {
        Self {
            value,
            uncertainty: uncertainty.abs(),
            dimension,
        }
    }

    /// Dimensionless value without uncertainty
    pub fn exact(value: f64) -> Self {
        Self::new(value, 0.0, Dimension::new())
    }

    /// Dimensionless value with uncertainty
    pub fn dimensionless(value: f64, uncertainty: f64) -> Self {
        Self::new(value, uncertainty, Dimension::new())
    }

    /// Create a measurement from a value typed in concrete units.
    ///
    /// Each unit's conversion factor is folded into value and uncertainty.
    /// Angle units scale the numbers but add no dimension.
    pub fn with_units(value: f64, uncertainty: f64, units: &SpecificUnits) -> Self {
        let (factor, dimension) = units.to_canonical();
        Self::new(value * factor, uncertainty * factor, dimension)
    }

    pub fn with_unit(value: f64, uncertainty: f64, unit: Unit) -> Self {
        Self::with_units(value, uncertainty, &SpecificUnits::single(unit))
    }

    /// Multiply this measurement by concrete units, e.g. `(4±2) * feet`
    pub fn times_units(&self, units: &SpecificUnits) -> Self {
        let (factor, dimension) = units.to_canonical();
        Self::new(
            self.value * factor,
            self.uncertainty * factor,
            self.dimension.multiply(&dimension),
        )
    }

    /// Divide this measurement by concrete units, e.g. `(65±2) * miles / hour`
    pub fn per_units(&self, units: &SpecificUnits) -> Self {
        let (factor, dimension) = units.to_canonical();
        Self::new(
            self.value / factor,
            self.uncertainty / factor,
            self.dimension.divide(&dimension),
        )
    }

    pub fn times_unit(&self, unit: Unit) -> Self {
        self.times_units(&SpecificUnits::single(unit))
    }

    pub fn per_unit(&self, unit: Unit) -> Self {
        self.per_units(&SpecificUnits::single(unit))
    }

    /// Same numbers, different canonical dimension
    pub fn with_dimension(&self, dimension: Dimension) -> Self {
        Self::new(self.value, self.uncertainty, dimension)
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_empty()
    }

    pub fn is_exact(&self) -> bool {
        self.uncertainty == 0.0
    }

    /// `uncertainty / |value|`
    pub fn relative_uncertainty(&self) -> f64 {
        self.uncertainty / self.value.abs()
    }

    /// Re-express in the chosen display units and round for presentation
    pub fn convert_to(&self, choice: &DisplayUnits) -> DisplayMeasurement {
        let (factor, units) = self.dimension.iter().fold(
            (1.0, SpecificUnits::new()),
            |(factor, units), (unit_type, power)| {
                let unit = choice.unit_for(unit_type);
                (factor * unit.conversion().powi(power), units.added(unit, power))
            },
        );
        DisplayMeasurement::new(self.value / factor, self.uncertainty / factor, units)
    }

    /// Display form in each dimension's default unit
    pub fn to_display(&self) -> DisplayMeasurement {
        self.convert_to(&DisplayUnits::default())
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display())
    }
}

impl Similar for Measurement {
    fn similar_within(&self, other: &Measurement, tolerance: &Tolerance) -> bool {
        tolerance.scalars_similar(self.value, other.value)
            && tolerance.scalars_similar(self.uncertainty, other.uncertainty)
            && self.dimension == other.dimension
    }
}

/// `value ± uncertainty`
pub fn measurement(value: f64, uncertainty: f64) -> Measurement {
    Measurement::dimensionless(value, uncertainty)
}

/// An exact value in a concrete unit
pub fn with_unit(value: f64, unit: Unit) -> Measurement {
    Measurement::with_unit(value, 0.0, unit)
}

/// Past this many decimal places the display switches to exponent notation
const MAX_DECIMAL_PLACES: usize = 20;

/// A measurement re-expressed in concrete units and rounded for display.
///
/// The uncertainty keeps one or two significant figures and the value is
/// rounded to the same decimal place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMeasurement {
    pub value: f64,
    pub uncertainty: f64,
    pub units: SpecificUnits,
    /// Rounded to a whole number or coarser
    pub uses_integer_rounding: bool,
    /// Decimal places kept by the rounding pass, capped at 20
    pub decimal_places: usize,
}

impl DisplayMeasurement {
    /// Round `value`/`uncertainty` (already in `units`) for display
    pub fn new(value: f64, uncertainty: f64, units: SpecificUnits) -> Self {
        let uncertainty = uncertainty.abs();

        if uncertainty == 0.0 || !uncertainty.is_finite() || !value.is_finite() {
            return Self {
                value,
                uncertainty,
                units,
                uses_integer_rounding: false,
                decimal_places: 0,
            };
        }

        // Order chosen from the uncertainty alone; the value is scaled once below
        let mut mantissa = uncertainty;
        let mut order_of_magnitude: i32 = 0;
        while mantissa >= 20.0 {
            mantissa /= 10.0;
            order_of_magnitude += 1;
        }
        while mantissa < 2.0 {
            mantissa *= 10.0;
            order_of_magnitude -= 1;
        }

        let scale = 10f64.powi(order_of_magnitude.abs());
        let (value, uncertainty) = if order_of_magnitude >= 0 {
            ((value / scale).round() * scale, mantissa.round() * scale)
        } else if scale.is_finite() {
            let scaled = value * scale;
            // beyond f64 range the value is already coarser than the rounding place
            let value = if scaled.is_finite() { scaled.round() / scale } else { value };
            (value, mantissa.round() / scale)
        } else {
            (value, mantissa.round() * 10f64.powi(order_of_magnitude))
        };

        let decimal_places = order_of_magnitude.min(0).unsigned_abs() as usize;
        Self {
            // avoids rendering "-0.0"
            value: if value == 0.0 { 0.0 } else { value },
            uncertainty,
            units,
            uses_integer_rounding: order_of_magnitude >= 0,
            decimal_places: decimal_places.min(MAX_DECIMAL_PLACES),
        }
    }
}

impl fmt::Display for DisplayMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uses_integer_rounding {
            write!(f, "{:.0}±{:.0}", self.value, self.uncertainty)?;
        } else if self.uncertainty == 0.0 {
            write!(f, "{}±{}", self.value, self.uncertainty)?;
        } else if self.decimal_places >= MAX_DECIMAL_PLACES {
            write!(f, "{:e}±{:e}", self.value, self.uncertainty)?;
        } else {
            let places = self.decimal_places;
            write!(f, "{:.*}±{:.*}", places, self.value, places, self.uncertainty)?;
        }
        if !self.units.is_empty() {
            write!(f, " {}", self.units)?;
        }
        Ok(())
    }
}

impl Similar for DisplayMeasurement {
    fn similar_within(&self, other: &DisplayMeasurement, tolerance: &Tolerance) -> bool {
        tolerance.scalars_similar(self.value, other.value)
            && tolerance.scalars_similar(self.uncertainty, other.uncertainty)
            && self.units == other.units
    }
}
