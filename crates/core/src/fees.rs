//! Dependent-fee resolution.
//!
//! Selected services declare the fee types they require; the resolver turns
//! those declarations into concrete fee records from the catalog's fee
//! partition. Resolution is a full recompute on every call: applied fees are
//! a pure function of the selection and the catalog, never merged
//! incrementally.
//!
//! Waivers are data, not code: a [`WaiverRule`] suppresses one fee type
//! whenever its trigger service is in the selection. The built-in table
//! carries the clinic's one standing rule, the Immigration Physical, which
//! bundles its own blood draw and so waives the venipuncture fee.

use crate::catalog::{Catalog, ServiceItem};
use crate::constants::IMMIGRATION_PHYSICAL_SERVICE_ID;
use crate::error::{CheckoutError, CheckoutResult};
use crate::FeeTypeKey;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Suppresses `waived_fee_type` whenever the service with `trigger_item_id`
/// is in the selection. Fee-type comparison is case-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaiverRule {
    pub trigger_item_id: u32,
    pub waived_fee_type: FeeTypeKey,
}

/// The built-in waiver table.
pub fn default_waiver_rules() -> Vec<WaiverRule> {
    vec![WaiverRule {
        trigger_item_id: IMMIGRATION_PHYSICAL_SERVICE_ID,
        waived_fee_type: FeeTypeKey::new("Venipuncture").expect("static fee type key"),
    }]
}

/// Parses waiver rules from a JSON array.
pub fn waiver_rules_from_json_str(json: &str) -> CheckoutResult<Vec<WaiverRule>> {
    serde_json::from_str(json).map_err(CheckoutError::WaiverRulesParse)
}

/// Loads waiver rules from a JSON file on disk.
pub fn waiver_rules_from_json_file(path: impl AsRef<Path>) -> CheckoutResult<Vec<WaiverRule>> {
    let contents = std::fs::read_to_string(path).map_err(CheckoutError::WaiverRulesRead)?;
    waiver_rules_from_json_str(&contents)
}

/// Resolves the auxiliary fees owed for a selection of services.
///
/// Bound to a fixed catalog's fee partition at construction. `resolve`
/// recomputes the applied-fee sequence from scratch; `total_fees` sums the
/// last-resolved sequence.
#[derive(Debug, Clone)]
pub struct FeeResolver {
    fee_services: Vec<ServiceItem>,
    waivers: Vec<WaiverRule>,
    applied: Vec<ServiceItem>,
}

impl FeeResolver {
    /// Creates a resolver over the catalog's fee partition with the built-in
    /// waiver table.
    pub fn new(catalog: &Catalog) -> Self {
        Self::with_waivers(catalog, default_waiver_rules())
    }

    /// Creates a resolver with an explicit waiver table.
    pub fn with_waivers(catalog: &Catalog, waivers: Vec<WaiverRule>) -> Self {
        Self {
            fee_services: catalog.fee_services().cloned().collect(),
            waivers,
            applied: Vec::new(),
        }
    }

    /// Recomputes the applied fees for the given selection.
    ///
    /// Fee types whose key contains "admin" (case-insensitive) are charged
    /// once per triggering item; every other fee type at most once per
    /// selection. A fee type with no matching record in the fee partition is
    /// dropped with a warning rather than failing the checkout.
    pub fn resolve(&mut self, selected: &[ServiceItem]) -> &[ServiceItem] {
        self.applied.clear();

        let counts = self.required_fee_counts(selected);
        for (fee_type, count) in counts {
            match self.fee_service_for(&fee_type).cloned() {
                Some(fee_service) => {
                    for _ in 0..count {
                        self.applied.push(fee_service.clone());
                    }
                }
                None => {
                    tracing::warn!(
                        fee_type = %fee_type,
                        "no fee service in catalog for required fee type, dropping"
                    );
                }
            }
        }

        &self.applied
    }

    /// The fee sequence from the most recent [`FeeResolver::resolve`] call.
    pub fn applied_fees(&self) -> &[ServiceItem] {
        &self.applied
    }

    /// Sum of prices over the last-resolved fee sequence.
    pub fn total_fees(&self) -> Decimal {
        self.applied.iter().map(|fee| fee.price).sum()
    }

    /// Counts required fee types in first-encounter order.
    fn required_fee_counts(&self, selected: &[ServiceItem]) -> IndexMap<FeeTypeKey, usize> {
        let waived: Vec<&FeeTypeKey> = self
            .waivers
            .iter()
            .filter(|rule| selected.iter().any(|item| item.id == rule.trigger_item_id))
            .map(|rule| &rule.waived_fee_type)
            .collect();

        let mut counts: IndexMap<FeeTypeKey, usize> = IndexMap::new();
        for item in selected {
            for fee_type in &item.requires_fees {
                if waived.iter().any(|w| w.eq_ignore_case(fee_type.as_str())) {
                    tracing::debug!(
                        fee_type = %fee_type,
                        service = item.id,
                        "fee waived by rule, skipping"
                    );
                    continue;
                }

                if fee_type.is_admin() {
                    *counts.entry(fee_type.clone()).or_insert(0) += 1;
                } else {
                    counts.entry(fee_type.clone()).or_insert(1);
                }
            }
        }
        counts
    }

    /// Finds the fee record satisfying a fee type, by exact key match.
    fn fee_service_for(&self, fee_type: &FeeTypeKey) -> Option<&ServiceItem> {
        self.fee_services
            .iter()
            .find(|fee| fee.fee_type.as_ref() == Some(fee_type))
    }
}
