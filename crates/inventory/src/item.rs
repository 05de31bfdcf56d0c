use serde::{Deserialize, Serialize};

use vendo_core::{Entity, ItemId, Money, VendingError};

/// A sellable catalog item. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    name: String,
    /// Unit price.
    price: Money,
}

impl Item {
    pub fn new(id: ItemId, name: impl Into<String>, price: Money) -> Result<Self, VendingError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(VendingError::validation("name cannot be empty"));
        }
        Ok(Self { id, name, price })
    }

    pub fn item_id(&self) -> &ItemId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
