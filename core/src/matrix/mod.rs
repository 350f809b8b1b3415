//! Row reduction and inversion of dense real matrices.

pub mod reduction;

pub use reduction::{
    apply_steps, invert, is_strong_echelon, is_weak_echelon, pivot_column, reduce_to_echelon,
    to_weak_echelon, RowStep,
};
