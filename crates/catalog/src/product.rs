use serde::{Deserialize, Serialize};

use vending_core::{Amount, ProductId};

/// Catalog record of a purchasable product.
///
/// Fields are private: records are created only through `Catalog::add`, which
/// enforces a non-reserved id, a non-empty name and a positive price, and the
/// stock only moves through `Catalog::decrement_stock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Amount,
    stock: u64,
}

impl Product {
    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price in the smallest currency unit.
    pub fn price(&self) -> Amount {
        self.price
    }

    pub fn stock(&self) -> u64 {
        self.stock
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    pub(crate) fn take_one(&mut self) {
        self.stock -= 1;
    }
}

/// Input of `Catalog::add` (not yet validated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Amount,
    pub stock: u64,
}

impl NewProduct {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Amount, stock: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
        }
    }

    pub(crate) fn into_product(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            price: self.price,
            stock: self.stock,
        }
    }
}

impl From<Product> for NewProduct {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            stock: product.stock,
        }
    }
}
