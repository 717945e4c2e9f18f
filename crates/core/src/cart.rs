//! Cart and checkout session state.
//!
//! The cart is the ordered set of services a front-desk user has selected:
//! insertion order is display order, entries are unique by id, and fee
//! records can never be added directly. The cart serialises to JSON so an
//! external durable-storage collaborator can save and restore it verbatim;
//! the core never performs the storage I/O itself.
//!
//! [`CheckoutSession`] pairs a cart with a fee resolver and re-derives the
//! applied fees after every mutation, so fees are always a pure function of
//! the current selection.

use crate::catalog::{Catalog, ServiceItem};
use crate::error::{CheckoutError, CheckoutResult};
use crate::fees::{FeeResolver, WaiverRule};
use rust_decimal::Decimal;

/// Ordered, id-unique selection of non-fee services.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<ServiceItem>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service to the end of the cart.
    ///
    /// Returns `true` if the service was added, `false` if it was already
    /// present (the cart is unchanged).
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::FeeNotAddable` for fee records; fees are
    /// applied automatically from the selection, never picked by hand.
    pub fn add(&mut self, service: &ServiceItem) -> CheckoutResult<bool> {
        if service.is_fee {
            return Err(CheckoutError::FeeNotAddable(service.id));
        }
        if self.contains(service.id) {
            return Ok(false);
        }
        self.items.push(service.clone());
        Ok(true)
    }

    /// Removes a service by id. Returns `true` if it was present.
    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Adds the service if absent, removes it if present. Returns `true` if
    /// the service is in the cart afterwards.
    pub fn toggle(&mut self, service: &ServiceItem) -> CheckoutResult<bool> {
        if self.contains(service.id) {
            self.remove(service.id);
            Ok(false)
        } else {
            self.add(service)?;
            Ok(true)
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// Selected services in insertion order.
    pub fn items(&self) -> &[ServiceItem] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of the selected services' prices, excluding fees.
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(|item| item.price).sum()
    }

    /// Serialises the cart for the durable-storage collaborator.
    pub fn to_json(&self) -> CheckoutResult<String> {
        serde_json::to_string(&self.items).map_err(CheckoutError::CartSerialization)
    }

    /// Rebuilds a cart from a stored snapshot.
    ///
    /// Snapshots written by older sessions are not trusted: fee records are
    /// rejected and duplicate ids collapse to their first occurrence.
    pub fn from_json(json: &str) -> CheckoutResult<Self> {
        let items: Vec<ServiceItem> =
            serde_json::from_str(json).map_err(CheckoutError::CartDeserialization)?;
        let mut cart = Cart::new();
        for item in &items {
            cart.add(item)?;
        }
        Ok(cart)
    }
}

/// A cart bound to a catalog's fee rules.
///
/// Every mutation re-runs fee resolution, mirroring the way the front desk
/// sees fees appear and disappear as services are picked.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    cart: Cart,
    resolver: FeeResolver,
}

impl CheckoutSession {
    /// Creates an empty session over the catalog with the built-in waivers.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            cart: Cart::new(),
            resolver: FeeResolver::new(catalog),
        }
    }

    /// Creates an empty session with an explicit waiver table.
    pub fn with_waivers(catalog: &Catalog, waivers: Vec<WaiverRule>) -> Self {
        Self {
            cart: Cart::new(),
            resolver: FeeResolver::with_waivers(catalog, waivers),
        }
    }

    /// Adds a service and re-derives fees.
    pub fn add_service(&mut self, service: &ServiceItem) -> CheckoutResult<bool> {
        let added = self.cart.add(service)?;
        self.reapply_fees();
        Ok(added)
    }

    /// Removes a service by id and re-derives fees.
    pub fn remove_service(&mut self, id: u32) -> bool {
        let removed = self.cart.remove(id);
        self.reapply_fees();
        removed
    }

    /// Toggles a service and re-derives fees.
    pub fn toggle_service(&mut self, service: &ServiceItem) -> CheckoutResult<bool> {
        let in_cart = self.cart.toggle(service)?;
        self.reapply_fees();
        Ok(in_cart)
    }

    /// Empties the cart and the applied fees.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.reapply_fees();
    }

    /// Replaces the cart from a stored snapshot and re-derives fees.
    pub fn restore(&mut self, json: &str) -> CheckoutResult<()> {
        self.cart = Cart::from_json(json)?;
        self.reapply_fees();
        Ok(())
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Fees owed for the current selection, in first-encounter order.
    pub fn applied_fees(&self) -> &[ServiceItem] {
        self.resolver.applied_fees()
    }

    pub fn subtotal(&self) -> Decimal {
        self.cart.subtotal()
    }

    pub fn fees_total(&self) -> Decimal {
        self.resolver.total_fees()
    }

    /// Grand total: subtotal plus applied fees.
    pub fn total(&self) -> Decimal {
        self.subtotal() + self.fees_total()
    }

    fn reapply_fees(&mut self) {
        self.resolver.resolve(self.cart.items.as_slice());
    }
}
