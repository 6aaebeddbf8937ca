//! Catalog entries that can be picked into a proposal.

use serde::{Deserialize, Serialize};

use super::Selectable;
use crate::{Money, ProductId, ServiceId};

/// Snapshot of a product taken when it was picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductItem {
    pub id: ProductId,
    pub description: String,
    pub sell_price: Money,
    pub cost_price: Money,
}

impl Selectable for ProductItem {
    type Id = ProductId;

    const CACHE_KEY: &'static str = "selectedProducts";
    const TRACKS_PROFIT: bool = true;

    fn id(&self) -> ProductId {
        self.id
    }

    fn unit_price(&self) -> Money {
        self.sell_price
    }

    fn unit_profit(&self) -> Option<Money> {
        self.sell_price.checked_sub(self.cost_price)
    }
}

/// Snapshot of a service taken when it was picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceItem {
    pub id: ServiceId,
    pub label: String,
    pub price: Money,
}

impl Selectable for ServiceItem {
    type Id = ServiceId;

    const CACHE_KEY: &'static str = "selectedServices";

    fn id(&self) -> ServiceId {
        self.id
    }

    fn unit_price(&self) -> Money {
        self.price
    }
}
