//! Quantity conversion between units of measure.

use rust_decimal::Decimal;

use stockledger_core::UomId;

use crate::error::UomError;
use crate::precision::{RoundingMethod, float_round};
use crate::unit::{UnitOfMeasure, UomCatalog};

/// Conversion service between two unit definitions.
///
/// `rounding: None` returns the exact converted amount; otherwise the result
/// is rounded to the target unit's rounding precision with the given method.
pub trait UnitConverter: Send + Sync {
    fn convert(
        &self,
        quantity: Decimal,
        from: &UnitOfMeasure,
        to: &UnitOfMeasure,
        rounding: Option<RoundingMethod>,
    ) -> Result<Decimal, UomError>;
}

/// Ratio-based conversion through the category reference unit.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardConverter;

impl UnitConverter for StandardConverter {
    fn convert(
        &self,
        quantity: Decimal,
        from: &UnitOfMeasure,
        to: &UnitOfMeasure,
        rounding: Option<RoundingMethod>,
    ) -> Result<Decimal, UomError> {
        if from.id == to.id {
            return Ok(quantity);
        }
        if from.category != to.category {
            return Err(UomError::IncompatibleUnits {
                from: from.name.clone(),
                to: to.name.clone(),
            });
        }

        let amount = to.from_reference(from.to_reference(quantity)?)?;
        Ok(match rounding {
            Some(method) => float_round(amount, to.rounding, method),
            None => amount,
        })
    }
}

/// A catalog paired with a converter, so callers convert by unit id.
#[derive(Clone, Copy)]
pub struct UnitContext<'a> {
    catalog: &'a UomCatalog,
    converter: &'a dyn UnitConverter,
}

impl<'a> UnitContext<'a> {
    pub fn new(catalog: &'a UomCatalog, converter: &'a dyn UnitConverter) -> Self {
        Self { catalog, converter }
    }

    pub fn catalog(&self) -> &'a UomCatalog {
        self.catalog
    }

    pub fn unit(&self, id: UomId) -> Result<&'a UnitOfMeasure, UomError> {
        self.catalog.get(id)
    }

    pub fn convert(
        &self,
        quantity: Decimal,
        from: UomId,
        to: UomId,
        rounding: Option<RoundingMethod>,
    ) -> Result<Decimal, UomError> {
        if from == to {
            return Ok(quantity);
        }
        let from = self.catalog.get(from)?;
        let to = self.catalog.get(to)?;
        self.converter.convert(quantity, from, to, rounding)
    }
}

impl core::fmt::Debug for UnitContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UnitContext")
            .field("units", &self.catalog.len())
            .finish()
    }
}
