//! Keyword synonym graph and query-term expansion.
//!
//! The map relates a lowercase keyword to an ordered list of related terms
//! (synonyms, broader/narrower terms). Entries are independently authored and
//! may be one-directional; the expansion pass compensates by also matching a
//! token against the related-term side of every entry.
//!
//! The map is loaded once and treated as read-only. Construction lowercases
//! every keyword and term and builds a flat reverse index over related terms
//! so the substring pass scans one precomputed slice instead of re-walking
//! the nested map per token.

use crate::constants::MIN_TOKEN_LEN;
use crate::error::{CheckoutError, CheckoutResult};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::path::Path;

/// Built-in synonym graph for the clinic's service catalog.
///
/// Curated alongside the catalog: patient-facing vocabulary on the left,
/// catalog vocabulary on the right. Kept as data so a deployment can replace
/// it wholesale with a `keywords.json` file.
const BUILTIN_KEYWORDS: &[(&str, &[&str])] = &[
    // Mental health related terms
    (
        "mental health",
        &[
            "psychiatry",
            "psychiatric",
            "therapy",
            "counseling",
            "mental",
            "behavioral health",
            "spravato",
            "ketamine",
            "depression",
        ],
    ),
    (
        "psychiatry",
        &[
            "mental health",
            "psychiatric",
            "therapy",
            "counseling",
            "mental",
            "behavioral health",
            "medication management",
        ],
    ),
    (
        "therapy",
        &["psychiatry", "mental health", "counseling", "behavioral health"],
    ),
    (
        "depression",
        &["mental health", "psychiatry", "spravato", "ketamine", "therapy"],
    ),
    (
        "spravato",
        &["mental health", "psychiatry", "ketamine", "depression", "treatment"],
    ),
    (
        "ketamine",
        &["mental health", "psychiatry", "spravato", "depression", "treatment"],
    ),
    // Telemedicine related terms
    (
        "telemedicine",
        &[
            "virtual",
            "tele",
            "remote",
            "video",
            "online",
            "digital",
            "virtual care",
            "tele visit",
            "telehealth",
        ],
    ),
    (
        "virtual",
        &[
            "telemedicine",
            "tele",
            "remote",
            "video",
            "online",
            "digital",
            "virtual care",
            "tele visit",
            "telehealth",
        ],
    ),
    ("remote", &["telemedicine", "virtual", "tele", "video", "online"]),
    (
        "telehealth",
        &["telemedicine", "virtual", "tele", "video", "online", "digital"],
    ),
    // Physical examination related terms
    (
        "physical",
        &[
            "exam",
            "checkup",
            "check-up",
            "examination",
            "health check",
            "wellness exam",
            "pre-op",
            "clearance",
        ],
    ),
    ("examination", &["physical", "exam", "checkup", "check-up"]),
    ("exam", &["physical", "examination", "checkup", "check-up"]),
    ("pre-op", &["physical", "clearance", "surgery", "examination"]),
    // Women's health related terms
    (
        "women",
        &[
            "women's health",
            "gynecological",
            "gynecology",
            "female",
            "women's physical",
            "pap",
            "smear",
            "cervical",
        ],
    ),
    (
        "gynecology",
        &["women", "women's health", "female", "women's physical", "pap smear"],
    ),
    (
        "pap",
        &["women", "smear", "hpv", "cervical", "screening", "women's health"],
    ),
    ("iud", &["women", "contraception", "gynecology", "women's health"]),
    // Travel related terms
    (
        "travel",
        &[
            "international",
            "abroad",
            "vacation",
            "trip",
            "travel visit",
            "travel consultation",
            "yellow fever",
            "typhoid",
        ],
    ),
    // Drug testing related terms
    (
        "drug test",
        &[
            "urine drug",
            "panel",
            "drug screen",
            "drug screening",
            "substance screening",
            "uds",
        ],
    ),
    ("urine", &["drug test", "urinalysis", "collection", "specimen"]),
    (
        "uds",
        &["drug test", "urine", "screening", "panel", "substance", "testing"],
    ),
    // COVID related terms
    (
        "covid",
        &["coronavirus", "covid-19", "covid19", "covid test", "pcr", "rapid"],
    ),
    // CDL/DOT related terms
    (
        "cdl",
        &[
            "dot",
            "commercial driver",
            "driver",
            "truck driver",
            "driving test",
            "driver physical",
            "certificate",
        ],
    ),
    ("dot", &["cdl", "commercial driver", "driver physical", "commercial"]),
    // Immigration related terms
    (
        "immigration",
        &[
            "visa",
            "foreign national",
            "immigrant",
            "i-693",
            "form i-693",
            "rpr",
            "quantiferon",
        ],
    ),
    // Nutrition related terms
    (
        "nutrition",
        &[
            "diet",
            "dietary",
            "food",
            "eating",
            "dietitian",
            "nutritionist",
            "nutrition counseling",
        ],
    ),
    // Weight loss related terms
    (
        "weight",
        &["weight loss", "obesity", "diet", "weight management", "semaglutide"],
    ),
    (
        "weight loss",
        &["weight", "obesity", "diet", "weight management", "semaglutide"],
    ),
    ("semaglutide", &["weight", "weight loss", "obesity", "injection"]),
    // Regular visit related terms
    ("visit", &["appointment", "consultation", "checkup", "regular visit"]),
    (
        "regular",
        &["standard", "routine", "primary care", "visit", "general", "primary"],
    ),
    ("primary", &["primary care", "general care", "regular visit", "general"]),
    // Follow up related terms
    ("follow up", &["follow-up", "subsequent", "return visit", "check back"]),
    // Vaccination related terms
    (
        "vaccine",
        &["vaccination", "shot", "immunization", "flu shot", "ppd", "flu vaccine"],
    ),
    ("flu", &["influenza", "flu shot", "flu vaccine", "flu test", "flu wash"]),
    (
        "immunization",
        &["vaccine", "vaccination", "shot", "flu shot", "ppd"],
    ),
    // Hearing and vision related terms
    ("hearing", &["audio", "audiometry", "ear", "auditory", "hearing test"]),
    ("vision", &["eye", "visual", "sight", "vision test", "vision screening"]),
    // Substance treatment related terms
    (
        "suboxone",
        &["addiction", "substance use", "bridge", "buprenorphine", "treatment"],
    ),
    (
        "addiction",
        &["suboxone", "substance use", "treatment", "substance treatment"],
    ),
    ("substance", &["addiction", "suboxone", "treatment", "substance use"]),
    // Procedures and treatments
    (
        "wound",
        &["laceration", "repair", "suture", "dressing", "care", "treatment", "i & d"],
    ),
    ("injection", &["medication", "administration", "shot"]),
    ("infusion", &["iv", "fluids", "hydration", "immunity"]),
    ("iv", &["infusion", "fluids", "hydration", "therapy"]),
    // Laboratory and diagnostics
    (
        "lab",
        &["test", "laboratory", "diagnostic", "screening", "panel", "blood", "specimen"],
    ),
    (
        "blood",
        &["test", "lab", "laboratory", "draw", "venipuncture", "specimen"],
    ),
    ("x-ray", &["radiology", "imaging", "diagnostic"]),
    ("std", &["screening", "test", "sexual health", "infection"]),
    // Primary care related terms
    ("primary care", &["regular", "general", "routine", "visit", "checkup"]),
    // Occupational health
    (
        "occupational",
        &["employment", "job", "workplace", "commercial", "cdl", "dot"],
    ),
    // Blood work specific terms
    (
        "blood work",
        &["blood test", "venipuncture", "lab", "laboratory", "panel"],
    ),
    ("venipuncture", &["blood draw", "phlebotomy", "blood test"]),
    // Category-specific terms
    ("diagnostics", &["test", "screening", "panel", "lab"]),
    ("medications", &["injection", "drug", "shot", "treatment"]),
    ("procedures", &["treatment", "care", "removal", "therapy"]),
    // Lab code related terms
    ("lab code", &["test code", "cpt", "code", "laboratory code"]),
    ("test code", &["lab code", "cpt", "laboratory code"]),
    ("cpt", &["test code", "lab code", "billing code"]),
    ("7750", &["apolipoprotein b", "apo b", "lipid", "cholesterol"]),
];

/// One authored entry: a keyword and its ordered related terms.
#[derive(Debug, Clone)]
struct KeywordGroup {
    key: String,
    terms: Vec<String>,
}

/// The keyword synonym graph with precomputed lookup structures.
#[derive(Debug, Clone)]
pub struct KeywordMap {
    /// Authored entries in document order.
    groups: Vec<KeywordGroup>,
    /// Exact keyword → group indices.
    exact: HashMap<String, Vec<usize>>,
    /// Flat reverse index over related terms: `(term, group index)`.
    related: Vec<(String, usize)>,
}

impl KeywordMap {
    /// Builds the map from `(keyword, related terms)` entries.
    ///
    /// Keywords and terms are lowercased; entry order is preserved so
    /// expansion output is deterministic.
    pub fn from_entries<K, T>(entries: impl IntoIterator<Item = (K, Vec<T>)>) -> Self
    where
        K: AsRef<str>,
        T: AsRef<str>,
    {
        let groups: Vec<KeywordGroup> = entries
            .into_iter()
            .map(|(key, terms)| KeywordGroup {
                key: key.as_ref().to_lowercase(),
                terms: terms.iter().map(|t| t.as_ref().to_lowercase()).collect(),
            })
            .collect();

        let mut exact: HashMap<String, Vec<usize>> = HashMap::with_capacity(groups.len());
        let mut related = Vec::new();
        for (idx, group) in groups.iter().enumerate() {
            exact.entry(group.key.clone()).or_default().push(idx);
            for term in &group.terms {
                related.push((term.clone(), idx));
            }
        }

        Self {
            groups,
            exact,
            related,
        }
    }

    /// The built-in synonym graph shipped with the catalog.
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_KEYWORDS
                .iter()
                .map(|(key, terms)| (*key, terms.to_vec())),
        )
    }

    /// Parses a map from a JSON object of `{"keyword": ["term", ...]}`.
    ///
    /// Document order of the object's entries is preserved.
    pub fn from_json_str(json: &str) -> CheckoutResult<Self> {
        let entries: IndexMap<String, Vec<String>> =
            serde_json::from_str(json).map_err(CheckoutError::KeywordMapParse)?;
        Ok(Self::from_entries(entries))
    }

    /// Loads a map from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> CheckoutResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(CheckoutError::KeywordMapRead)?;
        Self::from_json_str(&contents)
    }

    /// Number of authored entries.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Splits a query into lowercase tokens, discarding single-character
    /// tokens, and expands each token through the synonym graph.
    ///
    /// A token contributes:
    /// 1. itself;
    /// 2. every related term of an entry whose keyword equals the token;
    /// 3. for every entry where the token is a substring of a related term or
    ///    a related term is a substring of the token: the keyword and all of
    ///    that entry's related terms.
    ///
    /// The result is deduplicated preserving first-seen order, so expansion is
    /// deterministic for a fixed map and query.
    pub fn expand_query(&self, query: &str) -> Vec<String> {
        let tokens: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|word| word.len() >= MIN_TOKEN_LEN)
            .map(str::to_string)
            .collect();

        let mut expanded: IndexSet<String> = tokens.iter().cloned().collect();

        for token in &tokens {
            if let Some(group_ids) = self.exact.get(token) {
                for &idx in group_ids {
                    expanded.extend(self.groups[idx].terms.iter().cloned());
                }
            }

            // Substring pass over the flat reverse index. Matching groups are
            // collected first so each group's keyword and terms are inserted
            // once, in authored order.
            let mut matched: IndexSet<usize> = IndexSet::new();
            for (term, idx) in &self.related {
                if term.contains(token.as_str()) || token.contains(term.as_str()) {
                    matched.insert(*idx);
                }
            }
            for idx in matched {
                let group = &self.groups[idx];
                expanded.insert(group.key.clone());
                expanded.extend(group.terms.iter().cloned());
            }
        }

        expanded.into_iter().collect()
    }
}

impl Default for KeywordMap {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_map() -> KeywordMap {
        KeywordMap::from_entries(vec![
            ("physical", vec!["exam", "checkup", "pre-op", "clearance"]),
            ("pre-op", vec!["physical", "clearance", "surgery", "examination"]),
            ("lab", vec!["test", "panel", "blood"]),
        ])
    }

    #[test]
    fn test_expand_includes_token_itself() {
        let expanded = small_map().expand_query("unrelated");
        assert_eq!(expanded, vec!["unrelated".to_string()]);
    }

    #[test]
    fn test_expand_direct_key_hit() {
        let expanded = small_map().expand_query("lab");
        assert!(expanded.contains(&"test".to_string()));
        assert!(expanded.contains(&"panel".to_string()));
        assert!(expanded.contains(&"blood".to_string()));
        // Token first, synonyms after.
        assert_eq!(expanded[0], "lab");
    }

    #[test]
    fn test_expand_reverse_substring_hit() {
        // "pre-op" is a related term of "physical", so the "physical" entry is
        // pulled in alongside the direct "pre-op" entry.
        let expanded = small_map().expand_query("pre-op");
        for term in ["physical", "clearance", "surgery", "examination", "exam", "checkup"] {
            assert!(expanded.contains(&term.to_string()), "missing {term}");
        }
    }

    #[test]
    fn test_expand_discards_single_char_tokens() {
        let expanded = small_map().expand_query("x lab");
        assert!(!expanded.contains(&"x".to_string()));
        assert!(expanded.contains(&"lab".to_string()));
    }

    #[test]
    fn test_expand_empty_query() {
        assert!(small_map().expand_query("").is_empty());
        assert!(small_map().expand_query("   ").is_empty());
    }

    #[test]
    fn test_expand_deduplicates_preserving_first_seen_order() {
        let map = KeywordMap::from_entries(vec![
            ("blood", vec!["test", "lab"]),
            ("lab", vec!["test", "blood"]),
        ]);
        let expanded = map.expand_query("blood lab");
        let unique: std::collections::HashSet<_> = expanded.iter().collect();
        assert_eq!(unique.len(), expanded.len());
        assert_eq!(&expanded[..2], &["blood".to_string(), "lab".to_string()]);
    }

    #[test]
    fn test_expand_is_deterministic() {
        let map = small_map();
        assert_eq!(map.expand_query("pre-op lab"), map.expand_query("pre-op lab"));
    }

    #[test]
    fn test_builtin_pre_op_scenario() {
        let expanded = KeywordMap::builtin().expand_query("pre-op");
        for term in ["physical", "clearance", "surgery", "examination"] {
            assert!(expanded.contains(&term.to_string()), "missing {term}");
        }
    }

    #[test]
    fn test_from_json_str_preserves_order_and_lowercases() {
        let map = KeywordMap::from_json_str(r#"{"Flu": ["Influenza", "FLU SHOT"]}"#).unwrap();
        let expanded = map.expand_query("flu");
        assert_eq!(
            expanded,
            vec!["flu".to_string(), "influenza".to_string(), "flu shot".to_string()]
        );
    }

    #[test]
    fn test_from_json_str_rejects_malformed() {
        assert!(KeywordMap::from_json_str(r#"{"flu": "influenza"}"#).is_err());
    }
}
