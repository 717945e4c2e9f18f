//! Service catalog types and loading.
//!
//! The catalog is a static, ordered list of billable service and fee records
//! loaded once at process start and treated as read-only for the process
//! lifetime. It is always passed in explicitly rather than read from ambient
//! state, so tests can run against synthetic catalogs.

use crate::error::{CheckoutError, CheckoutResult};
use crate::FeeTypeKey;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A lab-test code attached to a service. Lab tests may carry a single code
/// or an ordered list of codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabCode {
    /// A single lab code, e.g. `"7750"`.
    Single(String),
    /// An ordered list of lab codes for panels spanning several tests.
    Many(Vec<String>),
}

impl LabCode {
    /// Iterates over the codes, whether one or many.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        match self {
            LabCode::Single(code) => std::slice::from_ref(code).iter(),
            LabCode::Many(codes) => codes.iter(),
        }
        .map(String::as_str)
    }
}

/// A billable service or auxiliary fee record from the catalog.
///
/// Records with `is_fee == true` are never added to a cart directly; they are
/// materialised by the fee resolver when a selected service declares the
/// matching fee type in `requires_fees`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceItem {
    /// Unique catalog identifier.
    pub id: u32,
    /// Display name, the primary search target.
    pub name: String,
    /// Price in currency units. Non-negative.
    pub price: Decimal,
    /// External billing/procedure code.
    pub billing_code: String,
    /// Optional free-text grouping label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Optional long-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional free-text labels consulted by search.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Optional lab code(s) for laboratory tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_code: Option<LabCode>,
    /// Marks this record as an auxiliary fee.
    #[serde(default)]
    pub is_fee: bool,
    /// The fee-dependency rule this fee record satisfies. Present only when
    /// `is_fee` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_type: Option<FeeTypeKey>,
    /// Fee types this (non-fee) service requires when selected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_fees: Vec<FeeTypeKey>,
}

/// The read-only service catalog.
///
/// Construction validates structural invariants once so the search and fee
/// components can assume a well-formed catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<ServiceItem>,
}

impl Catalog {
    /// Builds a catalog from an ordered list of service records.
    ///
    /// # Errors
    ///
    /// Returns an error if two records share an id, a price is negative, or a
    /// fee record is missing its fee type key.
    pub fn new(items: Vec<ServiceItem>) -> CheckoutResult<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id) {
                return Err(CheckoutError::DuplicateServiceId(item.id));
            }
            if item.price < Decimal::ZERO {
                return Err(CheckoutError::NegativePrice(item.id));
            }
            if item.is_fee && item.fee_type.is_none() {
                return Err(CheckoutError::MissingFeeType(item.id));
            }
        }
        Ok(Self { items })
    }

    /// Parses a catalog from a JSON array of service records.
    pub fn from_json_str(json: &str) -> CheckoutResult<Self> {
        let items: Vec<ServiceItem> =
            serde_json::from_str(json).map_err(CheckoutError::CatalogParse)?;
        Self::new(items)
    }

    /// Loads a catalog from a JSON file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the JSON cannot be
    /// parsed, or the records fail structural validation.
    pub fn from_json_file(path: impl AsRef<Path>) -> CheckoutResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(CheckoutError::CatalogRead)?;
        Self::from_json_str(&contents)
    }

    /// All records in catalog order.
    pub fn items(&self) -> &[ServiceItem] {
        &self.items
    }

    /// Looks up a record by id.
    pub fn get(&self, id: u32) -> Option<&ServiceItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// The fee partition of the catalog, in catalog order.
    pub fn fee_services(&self) -> impl Iterator<Item = &ServiceItem> {
        self.items.iter().filter(|item| item.is_fee)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u32, name: &str) -> ServiceItem {
        ServiceItem {
            id,
            name: name.to_string(),
            price: Decimal::from(50),
            billing_code: "99000".to_string(),
            category: None,
            description: None,
            tags: Vec::new(),
            lab_code: None,
            is_fee: false,
            fee_type: None,
            requires_fees: Vec::new(),
        }
    }

    #[test]
    fn test_new_accepts_valid_catalog() {
        let catalog = Catalog::new(vec![item(1, "Visit"), item(2, "Physical")]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(2).unwrap().name, "Physical");
    }

    #[test]
    fn test_new_rejects_duplicate_ids() {
        let result = Catalog::new(vec![item(1, "Visit"), item(1, "Other")]);
        assert!(matches!(result, Err(CheckoutError::DuplicateServiceId(1))));
    }

    #[test]
    fn test_new_rejects_negative_price() {
        let mut bad = item(3, "Broken");
        bad.price = Decimal::from(-1);
        let result = Catalog::new(vec![bad]);
        assert!(matches!(result, Err(CheckoutError::NegativePrice(3))));
    }

    #[test]
    fn test_new_rejects_fee_without_fee_type() {
        let mut fee = item(4, "Mystery Fee");
        fee.is_fee = true;
        let result = Catalog::new(vec![fee]);
        assert!(matches!(result, Err(CheckoutError::MissingFeeType(4))));
    }

    #[test]
    fn test_fee_services_partition() {
        let mut fee = item(9, "Venipuncture");
        fee.is_fee = true;
        fee.fee_type = Some(FeeTypeKey::new("Venipuncture").unwrap());
        let catalog = Catalog::new(vec![item(1, "Visit"), fee]).unwrap();
        let fees: Vec<_> = catalog.fee_services().collect();
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].id, 9);
    }

    #[test]
    fn test_from_json_str_parses_optional_fields() {
        let json = r#"[
            {
                "id": 10,
                "name": "Apolipoprotein B",
                "price": 45.00,
                "billing_code": "82172",
                "category": "Diagnostics",
                "tags": ["lab", "lipid"],
                "lab_code": "7750",
                "requires_fees": ["Venipuncture"]
            },
            {
                "id": 11,
                "name": "Basic Metabolic Panel",
                "price": 30,
                "billing_code": "80048",
                "lab_code": ["1234", "5678"]
            }
        ]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        let apo = catalog.get(10).unwrap();
        assert_eq!(
            apo.lab_code.as_ref().unwrap().codes().collect::<Vec<_>>(),
            vec!["7750"]
        );
        assert_eq!(apo.requires_fees.len(), 1);
        let bmp = catalog.get(11).unwrap();
        assert_eq!(
            bmp.lab_code.as_ref().unwrap().codes().collect::<Vec<_>>(),
            vec!["1234", "5678"]
        );
        assert!(bmp.tags.is_empty());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "name": "Visit", "price": "75.50", "billing_code": "99213"}]"#,
        )
        .unwrap();
        let catalog = Catalog::from_json_file(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get(1).unwrap().price,
            "75.50".parse::<Decimal>().unwrap()
        );
    }

    #[test]
    fn test_from_json_file_missing() {
        let result = Catalog::from_json_file("/nonexistent/services.json");
        assert!(matches!(result, Err(CheckoutError::CatalogRead(_))));
    }

    #[test]
    fn test_serialize_skips_absent_optionals() {
        let json = serde_json::to_string(&item(1, "Visit")).unwrap();
        assert!(!json.contains("category"));
        assert!(!json.contains("lab_code"));
        assert!(!json.contains("fee_type"));
    }
}
