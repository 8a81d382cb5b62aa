use serde::{Deserialize, Serialize};

use stockledger_core::{Entity, LocationId};

/// What a location is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationUsage {
    Supplier,
    View,
    Internal,
    Customer,
    Inventory,
    Production,
    Transit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub usage: LocationUsage,
    /// Set for locations belonging to the valuing company (matters for transit).
    #[serde(default)]
    pub company_owned: bool,
}

impl Location {
    pub fn new(id: LocationId, name: impl Into<String>, usage: LocationUsage) -> Self {
        Self {
            id,
            name: name.into(),
            usage,
            company_owned: matches!(usage, LocationUsage::Internal),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.usage == LocationUsage::Internal
    }

    /// Stock held here is part of the company's valuation.
    pub fn should_be_valued(&self) -> bool {
        match self.usage {
            LocationUsage::Internal => true,
            LocationUsage::Transit => self.company_owned,
            _ => false,
        }
    }
}

impl Entity for Location {
    type Id = LocationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_internal_and_company_transit_are_valued() {
        assert!(Location::new(LocationId::new(), "WH/Stock", LocationUsage::Internal).should_be_valued());
        assert!(!Location::new(LocationId::new(), "Customers", LocationUsage::Customer).should_be_valued());
        assert!(!Location::new(LocationId::new(), "Vendors", LocationUsage::Supplier).should_be_valued());

        let mut transit = Location::new(LocationId::new(), "Transit", LocationUsage::Transit);
        assert!(!transit.should_be_valued());
        transit.company_owned = true;
        assert!(transit.should_be_valued());
    }
}
