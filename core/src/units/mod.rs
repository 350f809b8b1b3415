//! Physical dimensions and concrete units.
//!
//! Measurements store their dimension as a [`Dimension`] (a bag of abstract
//! [`UnitType`]s) in canonical base units. Concrete [`Unit`]s only appear
//! when a value is entered or displayed.

mod bag;

pub use bag::Bag;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Abstract dimension tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitType {
    Distance,
    Time,
    Mass,
    Angle,
    Current,
}

impl UnitType {
    /// Canonical unit values of this dimension are stored in
    pub fn default_unit(&self) -> Unit {
        match self {
            Self::Distance => Unit::Meters,
            Self::Time => Unit::Seconds,
            Self::Mass => Unit::Kilograms,
            Self::Angle => Unit::Radians,
            Self::Current => Unit::Amperes,
        }
    }
}

/// Concrete unit a value can be entered or displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Unit {
    Meters,
    Kilometers,
    Miles,
    Decimeters,
    Centimeters,
    Millimeters,
    Seconds,
    Hours,
    Kilograms,
    Grams,
    Degrees,
    Radians,
    Amperes,
}

impl Unit {
    /// Factor converting a value in this unit into the dimension's default unit
    pub fn conversion(&self) -> f64 {
        match self {
            Self::Meters | Self::Seconds | Self::Kilograms | Self::Radians | Self::Amperes => 1.0,
            Self::Kilometers => 1000.0,
            Self::Miles => 1609.344,
            Self::Decimeters => 0.1,
            Self::Centimeters => 0.01,
            Self::Millimeters => 0.001,
            Self::Hours => 3600.0,
            Self::Grams => 0.001,
            Self::Degrees => std::f64::consts::PI / 180.0,
        }
    }

    pub fn unit_type(&self) -> UnitType {
        match self {
            Self::Meters
            | Self::Kilometers
            | Self::Miles
            | Self::Decimeters
            | Self::Centimeters
            | Self::Millimeters => UnitType::Distance,
            Self::Seconds | Self::Hours => UnitType::Time,
            Self::Kilograms | Self::Grams => UnitType::Mass,
            Self::Degrees | Self::Radians => UnitType::Angle,
            Self::Amperes => UnitType::Current,
        }
    }

    /// Angles are dimensionless once converted to radians
    pub fn is_dimensionally_inert(&self) -> bool {
        self.unit_type() == UnitType::Angle
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::Kilometers => "km",
            Self::Miles => "mi",
            Self::Decimeters => "dm",
            Self::Centimeters => "cm",
            Self::Millimeters => "mm",
            Self::Seconds => "s",
            Self::Hours => "hr",
            Self::Kilograms => "kg",
            Self::Grams => "g",
            Self::Degrees => "°",
            Self::Radians => "rad",
            Self::Amperes => "A",
        }
    }

    /// This unit raised to an integer power
    pub fn pow(self, power: i32) -> SpecificUnits {
        SpecificUnits::new().added(self, power)
    }

    pub fn per(self, other: Unit) -> SpecificUnits {
        SpecificUnits::from_pairs([(self, 1), (other, -1)])
    }

    pub fn times(self, other: Unit) -> SpecificUnits {
        SpecificUnits::from_pairs([(self, 1), (other, 1)])
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Dimension of a canonical measurement, e.g. `Distance¹·Time⁻¹`
pub type Dimension = Bag<UnitType>;

/// Concrete units of an entered or displayed value, e.g. `mi/hr`
pub type SpecificUnits = Bag<Unit>;

impl Bag<UnitType> {
    pub fn dimensionless() -> Self {
        Self::new()
    }

    /// The same dimension expressed in each tag's default unit
    pub fn default_units(&self) -> SpecificUnits {
        self.iter()
            .map(|(unit_type, power)| (unit_type.default_unit(), power))
            .collect()
    }
}

impl fmt::Display for Bag<UnitType> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("dimensionless")
        } else {
            write!(f, "[{}]", self.default_units())
        }
    }
}

impl Bag<Unit> {
    /// Accumulated conversion factor and abstract dimension of these units.
    ///
    /// Angle units contribute to the factor but not to the dimension.
    pub fn to_canonical(&self) -> (f64, Dimension) {
        self.iter()
            .fold((1.0, Dimension::new()), |(factor, dimension), (unit, power)| {
                let factor = factor * unit.conversion().powi(power);
                if unit.is_dimensionally_inert() {
                    (factor, dimension)
                } else {
                    (factor, dimension.added(unit.unit_type(), power))
                }
            })
    }

    /// `kg·m/s²` style rendering: positive exponents first, then each
    /// negative exponent as a `/unit` suffix.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (unit, power) in self.iter().filter(|(_, p)| *p > 0) {
            if !out.is_empty() {
                out.push('·');
            }
            out.push_str(unit.symbol());
            out.push_str(&superscript(power));
        }
        for (unit, power) in self.iter().filter(|(_, p)| *p < 0) {
            if out.is_empty() {
                out.push('1');
            }
            out.push('/');
            out.push_str(unit.symbol());
            out.push_str(&superscript(-power));
        }
        out
    }
}

impl fmt::Display for Bag<Unit> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn superscript(power: i32) -> String {
    if power == 1 {
        return String::new();
    }
    power
        .to_string()
        .chars()
        .map(|c| match c {
            '-' => '⁻',
            '0' => '⁰',
            '1' => '¹',
            '2' => '²',
            '3' => '³',
            '4' => '⁴',
            '5' => '⁵',
            '6' => '⁶',
            '7' => '⁷',
            '8' => '⁸',
            _ => '⁹',
        })
        .collect()
}

// Derived SI units

pub fn newtons() -> SpecificUnits {
    SpecificUnits::from_pairs([(Unit::Kilograms, 1), (Unit::Meters, 1), (Unit::Seconds, -2)])
}

pub fn joules() -> SpecificUnits {
    newtons().multiply(&SpecificUnits::single(Unit::Meters))
}

pub fn watts() -> SpecificUnits {
    joules().divide(&SpecificUnits::single(Unit::Seconds))
}

pub fn volts() -> SpecificUnits {
    watts().divide(&SpecificUnits::single(Unit::Amperes))
}

pub fn ohms() -> SpecificUnits {
    watts().divide(&Unit::Amperes.pow(2))
}

pub fn hertz() -> SpecificUnits {
    Unit::Seconds.pow(-1)
}

pub fn liter() -> SpecificUnits {
    Unit::Decimeters.pow(3)
}

/// Caller-chosen concrete unit per dimension for display.
///
/// Dimensions without an entry render in [`UnitType::default_unit`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayUnits {
    pub units: BTreeMap<UnitType, Unit>,
}

impl DisplayUnits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the display unit for the unit's own dimension
    pub fn with(mut self, unit: Unit) -> Self {
        self.units.insert(unit.unit_type(), unit);
        self
    }

    /// Unit to render `unit_type` in
    pub fn unit_for(&self, unit_type: UnitType) -> Unit {
        match self.units.get(&unit_type) {
            Some(unit) if unit.unit_type() == unit_type => *unit,
            Some(unit) => {
                tracing::warn!(
                    "Display unit {} is not a {:?} unit, using {}",
                    unit,
                    unit_type,
                    unit_type.default_unit()
                );
                unit_type.default_unit()
            }
            None => unit_type.default_unit(),
        }
    }

    /// Load a unit choice from JSON, e.g. `{"units":{"Distance":"Centimeters"}}`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl FromIterator<Unit> for DisplayUnits {
    fn from_iter<I: IntoIterator<Item = Unit>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |choice, unit| choice.with(unit))
    }
}
