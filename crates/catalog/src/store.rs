use std::collections::HashMap;

use vending_core::{Amount, DomainError, DomainResult, ProductId};

use crate::product::{NewProduct, Product};

/// Insertion-ordered product catalog.
///
/// Records live in a `Vec` in first-seen order; `index` maps an id to its
/// slot. Products are never removed, so slots never shift.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a new product.
    ///
    /// Checks run in a fixed order: reserved id, duplicate id, zero price,
    /// blank name. The catalog is untouched on rejection.
    pub fn add(&mut self, new: NewProduct) -> DomainResult<&Product> {
        if new.id.is_reserved() {
            return Err(DomainError::invalid_id(new.id.to_string()));
        }
        if self.index.contains_key(&new.id) {
            return Err(DomainError::DuplicateIdentifier(new.id));
        }
        if new.price == 0 {
            return Err(DomainError::InvalidPrice);
        }
        if new.name.trim().is_empty() {
            return Err(DomainError::InvalidName);
        }

        let slot = self.products.len();
        self.index.insert(new.id, slot);
        self.products.push(new.into_product());
        Ok(&self.products[slot])
    }

    pub fn get(&self, id: ProductId) -> DomainResult<&Product> {
        self.index
            .get(&id)
            .map(|&slot| &self.products[slot])
            .ok_or(DomainError::ProductNotFound(id))
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.index.contains_key(&id)
    }

    /// All products in insertion order. Call again to restart.
    pub fn list(&self) -> impl ExactSizeIterator<Item = &Product> + '_ {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Remove one unit from stock and return the unit price to charge.
    pub fn decrement_stock(&mut self, id: ProductId) -> DomainResult<Amount> {
        let slot = *self.index.get(&id).ok_or(DomainError::ProductNotFound(id))?;
        let product = &mut self.products[slot];
        if !product.in_stock() {
            return Err(DomainError::OutOfStock(id));
        }
        product.take_one();
        Ok(product.price())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn coke() -> NewProduct {
        NewProduct::new(1, "Coca Cola", 10, 1)
    }

    #[test]
    fn add_then_get_returns_record() {
        let mut catalog = Catalog::new();
        catalog.add(NewProduct::new(1, "Coca Cola", 10, 10)).unwrap();

        let product = catalog.get(ProductId::new(1)).unwrap();
        assert_eq!(product.name(), "Coca Cola");
        assert_eq!(product.price(), 10);
        assert_eq!(product.stock(), 10);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains(ProductId::new(1)));
    }

    #[test]
    fn add_rejects_reserved_id() {
        let mut catalog = Catalog::new();
        let err = catalog.add(NewProduct::new(0, "Invalid", 10, 10)).unwrap_err();
        assert_eq!(err, DomainError::InvalidIdentifier("0".to_string()));
        assert!(catalog.is_empty());
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let mut catalog = Catalog::new();
        catalog.add(coke()).unwrap();

        let err = catalog.add(NewProduct::new(1, "Pepsi", 12, 3)).unwrap_err();
        assert_eq!(err, DomainError::DuplicateIdentifier(ProductId::new(1)));
        assert_eq!(catalog.get(ProductId::new(1)).unwrap().name(), "Coca Cola");
    }

    #[test]
    fn add_rejects_zero_price() {
        let mut catalog = Catalog::new();
        let err = catalog.add(NewProduct::new(1, "Free Item", 0, 10)).unwrap_err();
        assert_eq!(err, DomainError::InvalidPrice);
        assert!(!catalog.contains(ProductId::new(1)));
    }

    #[test]
    fn add_rejects_blank_name() {
        let mut catalog = Catalog::new();
        let err = catalog.add(NewProduct::new(1, "   ", 10, 10)).unwrap_err();
        assert_eq!(err, DomainError::InvalidName);
    }

    #[test]
    fn reserved_id_is_reported_before_price() {
        let mut catalog = Catalog::new();
        let err = catalog.add(NewProduct::new(0, "Free", 0, 1)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidIdentifier(_)));
    }

    #[test]
    fn add_accepts_zero_stock() {
        let mut catalog = Catalog::new();
        let product = catalog.add(NewProduct::new(5, "Sold out at launch", 3, 0)).unwrap();
        assert!(!product.in_stock());
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        let catalog = Catalog::new();
        assert_eq!(
            catalog.get(ProductId::new(999)).unwrap_err(),
            DomainError::ProductNotFound(ProductId::new(999))
        );
    }

    #[test]
    fn list_preserves_insertion_order_and_restarts() {
        let mut catalog = Catalog::new();
        catalog.add(NewProduct::new(7, "Coca", 10, 10)).unwrap();
        catalog.add(NewProduct::new(2, "Chips", 5, 20)).unwrap();
        catalog.add(NewProduct::new(4, "Water", 3, 1)).unwrap();

        let names: Vec<&str> = catalog.list().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Coca", "Chips", "Water"]);

        let again: Vec<ProductId> = catalog.list().map(|p| p.id()).collect();
        assert_eq!(again, vec![ProductId::new(7), ProductId::new(2), ProductId::new(4)]);
        assert_eq!(catalog.list().len(), 3);
    }

    #[test]
    fn decrement_returns_price_until_out_of_stock() {
        let mut catalog = Catalog::new();
        catalog.add(coke()).unwrap();

        assert_eq!(catalog.decrement_stock(ProductId::new(1)).unwrap(), 10);
        assert_eq!(catalog.get(ProductId::new(1)).unwrap().stock(), 0);

        assert_eq!(
            catalog.decrement_stock(ProductId::new(1)).unwrap_err(),
            DomainError::OutOfStock(ProductId::new(1))
        );
        assert_eq!(catalog.get(ProductId::new(1)).unwrap().stock(), 0);
    }

    #[test]
    fn decrement_unknown_is_not_found() {
        let mut catalog = Catalog::new();
        assert_eq!(
            catalog.decrement_stock(ProductId::new(3)).unwrap_err(),
            DomainError::ProductNotFound(ProductId::new(3))
        );
    }

    #[test]
    fn product_record_layout_is_stable() {
        let mut catalog = Catalog::new();
        let product = catalog.add(NewProduct::new(3, "Chips", 5, 20)).unwrap();

        let json = serde_json::to_value(product).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 3, "name": "Chips", "price": 5, "stock": 20 })
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: stock never underflows and only successful decrements remove units.
        #[test]
        fn stock_never_goes_negative(
            initial in 0u64..20,
            attempts in 0usize..40
        ) {
            let mut catalog = Catalog::new();
            catalog.add(NewProduct::new(1, "Item", 4, initial)).unwrap();

            let mut sold = 0u64;
            for _ in 0..attempts {
                match catalog.decrement_stock(ProductId::new(1)) {
                    Ok(price) => {
                        prop_assert_eq!(price, 4);
                        sold += 1;
                    }
                    Err(err) => prop_assert_eq!(err, DomainError::OutOfStock(ProductId::new(1))),
                }
            }

            let stock = catalog.get(ProductId::new(1)).unwrap().stock();
            prop_assert_eq!(sold, initial.min(attempts as u64));
            prop_assert_eq!(stock, initial - sold);
        }

        /// Property: listing order is first-seen order regardless of id values.
        #[test]
        fn listing_follows_insertion_order(
            ids in prop::collection::hash_set(1u64..10_000, 1..30)
        ) {
            let ids: Vec<u64> = ids.into_iter().collect();
            let mut catalog = Catalog::new();
            for id in &ids {
                catalog.add(NewProduct::new(*id, format!("item-{id}"), 1, 1)).unwrap();
            }

            let listed: Vec<u64> = catalog.list().map(|p| p.id().get()).collect();
            prop_assert_eq!(listed, ids);
        }
    }
}
