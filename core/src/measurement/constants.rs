//! Physical constants.

use super::types::Measurement;
use crate::formula::{Formula, Operand};
use crate::units::{joules, SpecificUnits, Unit};

/// Speed of light in vacuum, exact by definition of the meter
pub fn speed_of_light() -> Measurement {
    Measurement::with_units(299_792_458.0, 0.0, &Unit::Meters.per(Unit::Seconds))
}

/// Planck constant in J·s
pub fn planck_constant() -> Measurement {
    let units = joules().multiply(&SpecificUnits::single(Unit::Seconds));
    Measurement::with_units(6.626_069_57e-34, 0.0, &units)
}

/// `1 / sqrt(1 - v²/c²)` for a speed `v`
pub fn lorentz_factor(speed: impl Into<Operand<Measurement>>) -> Formula {
    let c = speed_of_light();
    let beta_squared = Formula::divide(
        Formula::power(speed, 2.0),
        Formula::power(c, 2.0),
    );
    Formula::divide(1.0, Formula::sqrt(Formula::subtract(1.0, beta_squared)))
}
