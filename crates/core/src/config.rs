//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into core services. The intent is to avoid reading
//! process-wide environment variables during request handling, which can lead
//! to inconsistent behaviour in multi-threaded runtimes and test harnesses.

use crate::catalog::Catalog;
use crate::constants::{
    CATALOG_FILENAME, DATA_DIR_NAME, KEYWORD_MAP_FILENAME, WAIVER_RULES_FILENAME,
};
use crate::error::{CheckoutError, CheckoutResult};
use crate::fees::{self, WaiverRule};
use crate::keywords::KeywordMap;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig` rooted at a data directory.
    ///
    /// The directory must exist and contain the catalog file; the keyword map
    /// and waiver-rule files are optional overrides of the built-in defaults.
    pub fn new(data_dir: PathBuf) -> CheckoutResult<Self> {
        if !data_dir.join(CATALOG_FILENAME).is_file() {
            return Err(CheckoutError::InvalidInput(format!(
                "data directory does not contain {}",
                CATALOG_FILENAME
            )));
        }
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILENAME)
    }

    /// Loads and validates the service catalog.
    pub fn load_catalog(&self) -> CheckoutResult<Catalog> {
        Catalog::from_json_file(self.catalog_path())
    }

    /// Loads the keyword map override if present, else the built-in map.
    pub fn load_keyword_map(&self) -> CheckoutResult<KeywordMap> {
        let path = self.data_dir.join(KEYWORD_MAP_FILENAME);
        if path.is_file() {
            KeywordMap::from_json_file(path)
        } else {
            Ok(KeywordMap::builtin())
        }
    }

    /// Loads the waiver-rule override if present, else the built-in table.
    pub fn load_waiver_rules(&self) -> CheckoutResult<Vec<WaiverRule>> {
        let path = self.data_dir.join(WAIVER_RULES_FILENAME);
        if path.is_file() {
            fees::waiver_rules_from_json_file(path)
        } else {
            Ok(fees::default_waiver_rules())
        }
    }
}

/// Resolve the data directory without reading environment variables.
///
/// If `override_dir` is provided, it must be a directory containing the
/// catalog file. Otherwise this searches for `data/` relative to the current
/// working directory and then walks up from `CARGO_MANIFEST_DIR`.
pub fn resolve_data_dir(override_dir: Option<PathBuf>) -> CheckoutResult<PathBuf> {
    fn looks_like_data_dir(path: &Path) -> bool {
        path.join(CATALOG_FILENAME).is_file()
    }

    if let Some(data_dir) = override_dir {
        if data_dir.is_dir() && looks_like_data_dir(&data_dir) {
            return Ok(data_dir);
        }
        return Err(CheckoutError::InvalidInput(format!(
            "data directory override is not a directory containing {}",
            CATALOG_FILENAME
        )));
    }

    let cwd_relative = PathBuf::from(DATA_DIR_NAME);
    if cwd_relative.is_dir() && looks_like_data_dir(&cwd_relative) {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(DATA_DIR_NAME);
        if candidate.is_dir() && looks_like_data_dir(&candidate) {
            return Ok(candidate);
        }
    }

    Err(CheckoutError::InvalidInput(format!(
        "could not locate {}/ directory containing {}",
        DATA_DIR_NAME, CATALOG_FILENAME
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_catalog(dir: &Path) {
        std::fs::write(
            dir.join(CATALOG_FILENAME),
            r#"[{"id": 1, "name": "Visit", "price": 75, "billing_code": "99213"}]"#,
        )
        .unwrap();
    }

    #[test]
    fn test_new_requires_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CoreConfig::new(dir.path().to_path_buf()).is_err());

        write_catalog(dir.path());
        let cfg = CoreConfig::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(cfg.load_catalog().unwrap().len(), 1);
    }

    #[test]
    fn test_load_keyword_map_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path());
        let cfg = CoreConfig::new(dir.path().to_path_buf()).unwrap();
        let map = cfg.load_keyword_map().unwrap();
        assert!(!map.is_empty());
    }

    #[test]
    fn test_load_keyword_map_override() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path());
        std::fs::write(
            dir.path().join(KEYWORD_MAP_FILENAME),
            r#"{"flu": ["influenza"]}"#,
        )
        .unwrap();
        let cfg = CoreConfig::new(dir.path().to_path_buf()).unwrap();
        let map = cfg.load_keyword_map().unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_load_waiver_rules_override() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path());
        std::fs::write(
            dir.path().join(WAIVER_RULES_FILENAME),
            r#"[{"trigger_item_id": 7, "waived_fee_type": "Admin Fee"}]"#,
        )
        .unwrap();
        let cfg = CoreConfig::new(dir.path().to_path_buf()).unwrap();
        let rules = cfg.load_waiver_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].trigger_item_id, 7);
    }

    #[test]
    fn test_resolve_data_dir_rejects_bad_override() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolve_data_dir(Some(dir.path().to_path_buf()));
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_data_dir_accepts_valid_override() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path());
        let resolved = resolve_data_dir(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(resolved, dir.path());
    }

    #[test]
    fn test_bundled_catalog_loads_and_matches_waiver_table() {
        let data_dir = resolve_data_dir(None).unwrap();
        let cfg = CoreConfig::new(data_dir).unwrap();
        let catalog = cfg.load_catalog().unwrap();

        // The default waiver trigger must exist in the shipped catalog, and
        // every fee type referenced by a service must resolve to a fee record.
        let trigger = crate::constants::IMMIGRATION_PHYSICAL_SERVICE_ID;
        assert!(catalog.get(trigger).is_some());
        let fee_types: Vec<_> = catalog
            .fee_services()
            .filter_map(|fee| fee.fee_type.clone())
            .collect();
        for item in catalog.items() {
            for required in &item.requires_fees {
                assert!(
                    fee_types.contains(required),
                    "service {} requires unmatched fee type {}",
                    item.id,
                    required
                );
            }
        }
    }
}
