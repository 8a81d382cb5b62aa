//! Units of measure.
//!
//! Unit definitions, rounding, precision comparison and the conversion
//! service used to move quantities between purchase and stock units.

pub mod converter;
pub mod error;
pub mod precision;
pub mod unit;

pub use converter::{StandardConverter, UnitContext, UnitConverter};
pub use error::UomError;
pub use precision::{RoundingMethod, compare, float_round, is_zero, round_to_digits};
pub use unit::{UnitOfMeasure, UomCatalog, UomType};
