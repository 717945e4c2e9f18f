//! Relevance-scored catalog search.
//!
//! Free-text queries are expanded through the keyword map, every catalog item
//! is scored against the expanded term set plus the full query phrase, and
//! items at or above the relevance threshold are returned in descending score
//! order. The pass is a pure function of the query, the catalog, and the
//! keyword map bound at construction.

use crate::catalog::{Catalog, ServiceItem};
use crate::constants::RELEVANCE_THRESHOLD;
use crate::keywords::KeywordMap;

/// Score weights for the individual match signals.
///
/// Exact and contains variants of the same signal are additive where both can
/// hold; the `*_CONTAINS` lab and category term weights apply only when the
/// value is not an exact match.
const NAME_CONTAINS_TERM: u32 = 10;
const NAME_CONTAINS_PHRASE: u32 = 30;
const CATEGORY_EQUALS_TERM: u32 = 20;
const CATEGORY_EQUALS_PHRASE: u32 = 50;
const CATEGORY_CONTAINS_TERM: u32 = 8;
const CATEGORY_CONTAINS_PHRASE: u32 = 25;
const TAG_MATCHES_TERM: u32 = 5;
const LAB_CODE_EQUALS_TERM: u32 = 25;
const LAB_CODE_CONTAINS_TERM: u32 = 15;
const LAB_CODE_EQUALS_PHRASE: u32 = 40;
const LAB_CODE_CONTAINS_PHRASE: u32 = 20;
const BILLING_CODE_CONTAINS_TERM: u32 = 1;
const BILLING_CODE_EQUALS_PHRASE: u32 = 15;

/// Search over a read-only catalog using a fixed keyword map.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    keywords: KeywordMap,
}

/// Lowercased views of the searchable fields of one item.
struct ItemText {
    name: String,
    billing_code: String,
    category: Option<String>,
    tags: Vec<String>,
    lab_codes: Vec<String>,
}

impl ItemText {
    fn of(item: &ServiceItem) -> Self {
        Self {
            name: item.name.to_lowercase(),
            billing_code: item.billing_code.to_lowercase(),
            category: item.category.as_ref().map(|c| c.to_lowercase()),
            tags: item.tags.iter().map(|t| t.to_lowercase()).collect(),
            lab_codes: item
                .lab_code
                .iter()
                .flat_map(|lc| lc.codes())
                .map(str::to_lowercase)
                .collect(),
        }
    }
}

impl SearchEngine {
    /// Creates an engine bound to the given keyword map.
    pub fn new(keywords: KeywordMap) -> Self {
        Self { keywords }
    }

    /// Searches the catalog for items relevant to a free-text query.
    ///
    /// An empty or whitespace-only query returns the full catalog in original
    /// order without a scoring pass. Otherwise items scoring below the
    /// relevance threshold are excluded and the survivors are sorted by
    /// descending score; equal scores preserve catalog order.
    pub fn search<'a>(&self, query: &str, catalog: &'a Catalog) -> Vec<&'a ServiceItem> {
        self.search_scored(query, catalog)
            .into_iter()
            .map(|(item, _)| item)
            .collect()
    }

    /// Like [`SearchEngine::search`], but also returns each item's score.
    pub fn search_scored<'a>(&self, query: &str, catalog: &'a Catalog) -> Vec<(&'a ServiceItem, u32)> {
        if query.trim().is_empty() {
            return catalog.items().iter().map(|item| (item, 0)).collect();
        }

        let phrase = query.to_lowercase();
        let terms = self.keywords.expand_query(query);

        let mut scored: Vec<(&ServiceItem, u32)> = catalog
            .items()
            .iter()
            .map(|item| (item, score_item(item, &terms, &phrase)))
            .filter(|(_, score)| *score >= RELEVANCE_THRESHOLD)
            .collect();

        // Stable sort keeps catalog order for equal scores.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored
    }
}

fn score_item(item: &ServiceItem, terms: &[String], phrase: &str) -> u32 {
    let text = ItemText::of(item);
    let mut score = 0;

    for term in terms {
        let term = term.as_str();

        if text.name.contains(term) {
            score += NAME_CONTAINS_TERM;
        }

        if let Some(category) = &text.category {
            if category == term {
                score += CATEGORY_EQUALS_TERM;
            } else if category.contains(term) {
                score += CATEGORY_CONTAINS_TERM;
            }
        }

        // At most one tag bonus per term, however many tags match.
        if text
            .tags
            .iter()
            .any(|tag| tag.contains(term) || term.contains(tag.as_str()))
        {
            score += TAG_MATCHES_TERM;
        }

        if text.lab_codes.iter().any(|code| code == term) {
            score += LAB_CODE_EQUALS_TERM;
        }
        if text
            .lab_codes
            .iter()
            .any(|code| code != term && code.contains(term))
        {
            score += LAB_CODE_CONTAINS_TERM;
        }

        if text.billing_code.contains(term) {
            score += BILLING_CODE_CONTAINS_TERM;
        }
    }

    // Full-phrase bonuses, applied once per item.
    if text.lab_codes.iter().any(|code| code == phrase) {
        score += LAB_CODE_EQUALS_PHRASE;
    }
    if text
        .lab_codes
        .iter()
        .any(|code| code != phrase && code.contains(phrase))
    {
        score += LAB_CODE_CONTAINS_PHRASE;
    }

    if text.name.contains(phrase) {
        score += NAME_CONTAINS_PHRASE;
    }

    if let Some(category) = &text.category {
        if category.contains(phrase) {
            score += CATEGORY_CONTAINS_PHRASE;
        }
        if category == phrase {
            score += CATEGORY_EQUALS_PHRASE;
        }
    }

    if text.billing_code == phrase {
        score += BILLING_CODE_EQUALS_PHRASE;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LabCode;
    use rust_decimal::Decimal;

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

    fn engine() -> SearchEngine {
        SearchEngine::new(KeywordMap::builtin())
    }

    /// Engine with no synonym entries, so scores come from the raw tokens
    /// alone and the arithmetic below stays exact.
    fn plain_engine() -> SearchEngine {
        SearchEngine::new(KeywordMap::from_entries(Vec::<(&str, Vec<&str>)>::new()))
    }

    #[test]
    fn test_empty_query_returns_catalog_in_order() {
        let catalog =
            Catalog::new(vec![item(1, "Visit"), item(2, "Physical"), item(3, "Flu Shot")])
                .unwrap();
        let results = engine().search("", &catalog);
        let ids: Vec<u32> = results.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let results = engine().search("   ", &catalog);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_threshold_excludes_weak_matches() {
        // Only signal: billing code contains the term (+1), below threshold.
        let mut weak = item(1, "Unrelated");
        weak.billing_code = "visit99".to_string();
        let catalog = Catalog::new(vec![weak]).unwrap();
        let results = engine().search("visit", &catalog);
        assert!(results.is_empty());
    }

    #[test]
    fn test_name_match_scores() {
        let catalog = Catalog::new(vec![item(1, "Office Visit"), item(2, "Flu Shot")]).unwrap();
        let scored = engine().search_scored("office visit", &catalog);
        assert_eq!(scored[0].0.id, 1);
        // "office" +10, "visit" +10, phrase "office visit" +30, plus synonym
        // hits do not apply to item 2 at all.
        assert!(scored[0].1 >= 50);
        assert!(scored.iter().all(|(item, _)| item.id != 2));
    }

    #[test]
    fn test_category_exact_beats_category_substring() {
        let mut exact = item(1, "Apolipoprotein B");
        exact.category = Some("Diagnostics".to_string());
        let mut partial = item(2, "Imaging Review");
        partial.category = Some("Diagnostics and Imaging".to_string());
        let catalog = Catalog::new(vec![partial, exact]).unwrap();

        let scored = plain_engine().search_scored("diagnostics", &catalog);
        assert_eq!(scored[0].0.id, 1);
        // Exact: ==term +20, phrase contains +25, phrase == +50.
        assert_eq!(scored[0].1, 95);
        // Substring only: contains term +8, phrase contains +25.
        assert_eq!(scored[1].1, 33);
    }

    #[test]
    fn test_exact_lab_code_ranks_above_containing_code() {
        let mut exact = item(1, "Apolipoprotein B");
        exact.lab_code = Some(LabCode::Single("7750".to_string()));
        let mut partial = item(2, "Extended Lipid Panel");
        partial.lab_code = Some(LabCode::Many(vec!["77503".to_string(), "8100".to_string()]));
        let catalog = Catalog::new(vec![partial, exact]).unwrap();

        let scored = plain_engine().search_scored("7750", &catalog);
        assert_eq!(scored[0].0.id, 1);
        // Exact: term ==code +25, phrase ==code +40.
        assert_eq!(scored[0].1, 65);
        // Containing: term in code +15, phrase in code +20.
        assert_eq!(scored[1].1, 35);

        // The ranking survives synonym expansion ("7750" maps to the
        // apolipoprotein vocabulary, which also matches item 1's name).
        let results = engine().search("7750", &catalog);
        assert_eq!(results[0].id, 1);
        assert_eq!(results[1].id, 2);
    }

    #[test]
    fn test_lab_code_list_exact_and_contains_are_additive() {
        let mut both = item(1, "Lipid Bundle");
        both.lab_code = Some(LabCode::Many(vec!["7750".to_string(), "77501".to_string()]));
        let catalog = Catalog::new(vec![both]).unwrap();
        let scored = plain_engine().search_scored("7750", &catalog);
        // ==code +25, other code contains +15, phrase ==code +40,
        // phrase in other code +20.
        assert_eq!(scored[0].1, 100);
    }

    #[test]
    fn test_pre_op_expansion_reaches_physical_category() {
        let mut physical = item(1, "Basic Physical");
        physical.category = Some("Physical".to_string());
        let catalog = Catalog::new(vec![physical]).unwrap();

        let scored = engine().search_scored("pre-op", &catalog);
        assert_eq!(scored.len(), 1);
        // Expansion brings in "physical": name contains +10, category == +20.
        assert!(scored[0].1 >= 8);
    }

    #[test]
    fn test_tag_bonus_awarded_once_per_term() {
        let mut tagged = item(1, "Urinalysis");
        tagged.tags = vec!["screening".to_string(), "drug screening".to_string()];
        let mut single = item(2, "Hemoglobin A1c");
        single.tags = vec!["screening".to_string()];
        let catalog = Catalog::new(vec![tagged, single]).unwrap();

        let scored = plain_engine().search_scored("screening", &catalog);
        // One +5 for the term however many tags match, which is the whole
        // score for both items here.
        assert_eq!(scored.len(), 2);
        assert!(scored.iter().all(|(_, score)| *score == 5));
    }

    #[test]
    fn test_billing_code_exact_phrase() {
        let mut coded = item(1, "Office Visit Level 3");
        coded.billing_code = "99213".to_string();
        let catalog = Catalog::new(vec![coded]).unwrap();
        let scored = plain_engine().search_scored("99213", &catalog);
        // Term contains +1, phrase equals +15.
        assert_eq!(scored[0].1, 16);
    }

    #[test]
    fn test_equal_scores_preserve_catalog_order() {
        let catalog =
            Catalog::new(vec![item(1, "Flu Shot Adult"), item(2, "Flu Shot Child")]).unwrap();
        let results = engine().search("flu shot", &catalog);
        let ids: Vec<u32> = results.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_search_is_pure() {
        let mut lab = item(1, "Apolipoprotein B");
        lab.lab_code = Some(LabCode::Single("7750".to_string()));
        let catalog = Catalog::new(vec![lab, item(2, "Office Visit")]).unwrap();
        let e = engine();
        let first: Vec<u32> = e.search("7750", &catalog).iter().map(|i| i.id).collect();
        let second: Vec<u32> = e.search("7750", &catalog).iter().map(|i| i.id).collect();
        assert_eq!(first, second);
    }
}
