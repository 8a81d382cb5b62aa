//! Unit of measure definitions.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{Entity, UomId};

use crate::error::UomError;

/// Position of a unit relative to the reference unit of its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UomType {
    Reference,
    Bigger,
    Smaller,
}

/// A unit of measure within a category (e.g. "Unit", "Dozen" in "Unit").
///
/// `ratio` relates the unit to the category reference: a dozen is a bigger
/// unit with ratio 12, a gram is a smaller unit with ratio 1000 against a
/// kilogram reference. The reference unit has ratio 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOfMeasure {
    pub id: UomId,
    pub name: String,
    pub category: String,
    pub uom_type: UomType,
    pub ratio: Decimal,
    /// Rounding precision of quantities expressed in this unit (e.g. 0.01).
    pub rounding: Decimal,
}

impl UnitOfMeasure {
    /// Reference unit of its category.
    pub fn reference(id: UomId, name: impl Into<String>, category: impl Into<String>, rounding: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            uom_type: UomType::Reference,
            ratio: Decimal::ONE,
            rounding,
        }
    }

    /// Unit worth `ratio` reference units.
    pub fn bigger(
        id: UomId,
        name: impl Into<String>,
        category: impl Into<String>,
        ratio: Decimal,
        rounding: Decimal,
    ) -> Result<Self, UomError> {
        Self::scaled(id, name.into(), category.into(), UomType::Bigger, ratio, rounding)
    }

    /// Unit worth `1 / ratio` reference units.
    pub fn smaller(
        id: UomId,
        name: impl Into<String>,
        category: impl Into<String>,
        ratio: Decimal,
        rounding: Decimal,
    ) -> Result<Self, UomError> {
        Self::scaled(id, name.into(), category.into(), UomType::Smaller, ratio, rounding)
    }

    fn scaled(
        id: UomId,
        name: String,
        category: String,
        uom_type: UomType,
        ratio: Decimal,
        rounding: Decimal,
    ) -> Result<Self, UomError> {
        if ratio <= Decimal::ZERO {
            return Err(UomError::InvalidRatio(name));
        }
        Ok(Self {
            id,
            name,
            category,
            uom_type,
            ratio,
            rounding,
        })
    }

    /// Express `quantity` of this unit in the category reference unit.
    pub fn to_reference(&self, quantity: Decimal) -> Result<Decimal, UomError> {
        self.ensure_ratio()?;
        Ok(match self.uom_type {
            UomType::Reference => quantity,
            UomType::Bigger => quantity * self.ratio,
            UomType::Smaller => quantity / self.ratio,
        })
    }

    /// Express a reference-unit `quantity` in this unit.
    pub fn from_reference(&self, quantity: Decimal) -> Result<Decimal, UomError> {
        self.ensure_ratio()?;
        Ok(match self.uom_type {
            UomType::Reference => quantity,
            UomType::Bigger => quantity / self.ratio,
            UomType::Smaller => quantity * self.ratio,
        })
    }

    fn ensure_ratio(&self) -> Result<(), UomError> {
        if self.ratio <= Decimal::ZERO {
            return Err(UomError::InvalidRatio(self.name.clone()));
        }
        Ok(())
    }
}

impl Entity for UnitOfMeasure {
    type Id = UomId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Lookup table of the units known to the system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UomCatalog {
    units: HashMap<UomId, UnitOfMeasure>,
}

impl UomCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit: UnitOfMeasure) {
        self.units.insert(unit.id, unit);
    }

    pub fn with(mut self, unit: UnitOfMeasure) -> Self {
        self.insert(unit);
        self
    }

    pub fn get(&self, id: UomId) -> Result<&UnitOfMeasure, UomError> {
        self.units.get(&id).ok_or(UomError::UnknownUnit(id))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl FromIterator<UnitOfMeasure> for UomCatalog {
    fn from_iter<I: IntoIterator<Item = UnitOfMeasure>>(iter: I) -> Self {
        let mut catalog = UomCatalog::new();
        for unit in iter {
            catalog.insert(unit);
        }
        catalog
    }
}
