//! Operations over columns of measurements.

use super::types::Measurement;
use crate::formula::{Bindings, EvalError, Formula};
use crate::units::{SpecificUnits, Unit};

/// Mean value, with the RMS of the uncertainties.
///
/// The result carries the dimension of the last element. Returns `None`
/// for an empty list.
pub fn mean(list: &[Measurement]) -> Option<Measurement> {
    let last = list.last()?;
    let count = list.len() as f64;
    let total: f64 = list.iter().map(|m| m.value).sum();
    let squared_errors: f64 = list.iter().map(|m| m.uncertainty * m.uncertainty).sum();
    Some(Measurement::new(
        total / count,
        (squared_errors / count).sqrt(),
        last.dimension.clone(),
    ))
}

/// Evaluate one formula per row of parallel columns.
///
/// `formula` receives the row's measurements in column order. Rows beyond
/// the shortest column are ignored.
pub fn list_compute<F>(columns: &[&[Measurement]], formula: F) -> Result<Vec<Measurement>, EvalError>
where
    F: Fn(&[Measurement]) -> Formula,
{
    let rows = columns.iter().map(|column| column.len()).min().unwrap_or(0);
    let bindings = Bindings::new();

    (0..rows)
        .map(|index| {
            let row: Vec<Measurement> = columns.iter().map(|column| column[index].clone()).collect();
            formula(&row).evaluate(&bindings)
        })
        .collect()
}

/// Multiply every measurement by `units`
pub fn apply_units(list: &[Measurement], units: &SpecificUnits) -> Vec<Measurement> {
    list.iter().map(|m| m.times_units(units)).collect()
}

pub fn apply_unit(list: &[Measurement], unit: Unit) -> Vec<Measurement> {
    apply_units(list, &SpecificUnits::single(unit))
}
