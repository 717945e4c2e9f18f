//! Constants used throughout the self-pay core crate.
//!
//! This module contains path, filename, and business-rule constants to ensure
//! consistency across the codebase and make maintenance easier.

/// Directory name for bundled data files (catalog, keyword map, waivers).
pub const DATA_DIR_NAME: &str = "data";

/// Filename for the service catalog JSON file.
pub const CATALOG_FILENAME: &str = "services.json";

/// Filename for the optional keyword-map override JSON file.
pub const KEYWORD_MAP_FILENAME: &str = "keywords.json";

/// Filename for the optional waiver-rules override JSON file.
pub const WAIVER_RULES_FILENAME: &str = "waivers.json";

/// Minimum relevance score for an item to appear in search results.
pub const RELEVANCE_THRESHOLD: u32 = 5;

/// Query tokens shorter than this many characters are discarded before
/// expansion.
pub const MIN_TOKEN_LEN: usize = 2;

/// Catalog id of the Immigration Physical service. The default waiver-rule
/// table suppresses the venipuncture fee when this service is in the cart.
pub const IMMIGRATION_PHYSICAL_SERVICE_ID: u32 = 105;
