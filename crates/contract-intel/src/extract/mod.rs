//! Pattern-based field extraction.
//!
//! Each category is handled by a stateless sub-extractor registered in
//! [`REGISTRY`]. Sub-extractors read the shared text and write disjoint parts
//! of the [`ExtractedData`] record. A failing or panicking sub-extractor only
//! zeroes its own category.

pub mod contact;
pub mod financial;
pub mod parties;
pub mod payment;
pub mod revenue;
pub mod sla;

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, debug_span, warn};

use crate::model::{
    Category, ContactInfo, ExtractedData, FinancialDetails, Party, PaymentStructure,
    RevenueClassification, ServiceLevelTerms,
};

/// Content produced by one sub-extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryContent {
    Financial(FinancialDetails),
    Parties(Vec<Party>),
    Payment(PaymentStructure),
    Revenue(RevenueClassification),
    Sla(ServiceLevelTerms),
    Contact(ContactInfo),
}

impl CategoryContent {
    pub fn category(&self) -> Category {
        match self {
            CategoryContent::Financial(_) => Category::Financial,
            CategoryContent::Parties(_) => Category::Parties,
            CategoryContent::Payment(_) => Category::Payment,
            CategoryContent::Revenue(_) => Category::Revenue,
            CategoryContent::Sla(_) => Category::Sla,
            CategoryContent::Contact(_) => Category::Contact,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CategoryContent::Financial(f) => f.is_empty(),
            CategoryContent::Parties(p) => p.is_empty(),
            CategoryContent::Payment(p) => p.is_empty(),
            CategoryContent::Revenue(r) => r.is_empty(),
            CategoryContent::Sla(s) => s.is_empty(),
            CategoryContent::Contact(c) => c.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryOutput {
    pub content: CategoryContent,
    pub confidence: f64,
}

#[derive(Debug, Clone, Error)]
#[error("{category} extraction failed: {reason}")]
pub struct SubExtractionFault {
    pub category: Category,
    pub reason: String,
}

pub type ExtractorFn = fn(&str) -> Result<CategoryOutput, SubExtractionFault>;

/// One registry entry: a named extractor for a single category.
#[derive(Clone, Copy)]
pub struct SubExtractor {
    pub name: &'static str,
    pub category: Category,
    pub run: ExtractorFn,
    pub required_fields: &'static [&'static str],
}

impl std::fmt::Debug for SubExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubExtractor")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("required_fields", &self.required_fields)
            .finish()
    }
}

pub const REGISTRY: &[SubExtractor] = &[
    SubExtractor {
        name: "financial",
        category: Category::Financial,
        run: financial::extract,
        required_fields: &[
            "financial_details.total_value",
            "financial_details.currency",
        ],
    },
    SubExtractor {
        name: "parties",
        category: Category::Parties,
        run: parties::extract,
        required_fields: &["parties"],
    },
    SubExtractor {
        name: "payment",
        category: Category::Payment,
        run: payment::extract,
        required_fields: &[
            "payment_structure.payment_terms",
            "payment_structure.payment_methods",
        ],
    },
    SubExtractor {
        name: "revenue",
        category: Category::Revenue,
        run: revenue::extract,
        required_fields: &[],
    },
    SubExtractor {
        name: "sla",
        category: Category::Sla,
        run: sla::extract,
        required_fields: &["sla.performance_metrics", "sla.support_terms"],
    },
    SubExtractor {
        name: "contact",
        category: Category::Contact,
        run: contact::extract,
        required_fields: &["contact_info.emails", "contact_info.phones"],
    },
];

/// Runs every registered sub-extractor over a document's text.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    registry: Vec<SubExtractor>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self::with_registry(REGISTRY.to_vec())
    }

    pub fn with_registry(registry: Vec<SubExtractor>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &[SubExtractor] {
        &self.registry
    }

    pub fn extract_fields(&self, text: &str) -> ExtractedData {
        let mut data = ExtractedData::default();

        for entry in &self.registry {
            let _span = debug_span!("sub_extractor", name = entry.name).entered();

            match run_isolated(entry, text) {
                Ok(output) if output.content.category() != entry.category => {
                    warn!(
                        "Sub-extractor '{}' returned {} content, expected {}",
                        entry.name,
                        output.content.category(),
                        entry.category
                    );
                    data.confidence_scores.insert(entry.category, 0.0);
                }
                Ok(output) => {
                    let confidence = if output.content.is_empty() {
                        0.0
                    } else {
                        clamp_confidence(output.confidence)
                    };
                    debug!(confidence, "Category extracted");
                    apply(&mut data, output.content);
                    data.confidence_scores.insert(entry.category, confidence);
                }
                Err(fault) => {
                    warn!("{}", fault);
                    data.confidence_scores.insert(entry.category, 0.0);
                }
            }
        }

        data
    }
}

fn run_isolated(entry: &SubExtractor, text: &str) -> Result<CategoryOutput, SubExtractionFault> {
    let run = entry.run;
    match panic::catch_unwind(AssertUnwindSafe(|| run(text))) {
        Ok(result) => result,
        Err(payload) => Err(SubExtractionFault {
            category: entry.category,
            reason: panic_message(payload.as_ref()),
        }),
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

fn apply(data: &mut ExtractedData, content: CategoryContent) {
    match content {
        CategoryContent::Financial(f) => data.financial_details = f,
        CategoryContent::Parties(p) => data.parties = p,
        CategoryContent::Payment(p) => data.payment_structure = p,
        CategoryContent::Revenue(r) => data.revenue_classification = r,
        CategoryContent::Sla(s) => data.sla = s,
        CategoryContent::Contact(c) => data.contact_info = c,
    }
}

pub(crate) fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Slice of `text` around `start..end`, widened by `radius` bytes and
/// snapped to char boundaries.
pub(crate) fn window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let mut from = start.saturating_sub(radius);
    while from > 0 && !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + radius).min(text.len());
    while to < text.len() && !text.is_char_boundary(to) {
        to += 1;
    }
    &text[from..to]
}

/// Pushes `value` unless an equal entry (ignoring ASCII case) is present.
pub(crate) fn push_unique(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() || list.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        return;
    }
    list.push(value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{COMPLETE_CONTRACT, ONE_PARTY_CONTRACT};

    fn failing_financial(_: &str) -> Result<CategoryOutput, SubExtractionFault> {
        Err(SubExtractionFault {
            category: Category::Financial,
            reason: "malformed amount".to_string(),
        })
    }

    fn panicking_financial(_: &str) -> Result<CategoryOutput, SubExtractionFault> {
        panic!("unexpected token in amount")
    }

    fn registry_with_financial(run: ExtractorFn) -> Vec<SubExtractor> {
        REGISTRY
            .iter()
            .map(|entry| {
                if entry.category == Category::Financial {
                    SubExtractor { run, ..*entry }
                } else {
                    *entry
                }
            })
            .collect()
    }

    // ── Registry ──

    #[test]
    fn test_registry_covers_every_category_once() {
        for category in Category::ALL {
            let count = REGISTRY.iter().filter(|e| e.category == category).count();
            assert_eq!(count, 1, "category {} registered {} times", category, count);
        }
    }

    #[test]
    fn test_every_category_has_confidence_key() {
        let data = FieldExtractor::new().extract_fields("");
        for category in Category::ALL {
            assert_eq!(data.confidence_scores.get(&category), Some(&0.0));
        }
    }

    // ── Complete and partial documents ──

    #[test]
    fn test_complete_contract_populates_every_category() {
        let data = FieldExtractor::new().extract_fields(COMPLETE_CONTRACT);

        assert_eq!(data.parties.len(), 2);
        assert!(data.financial_details.total_value.is_some());
        assert_eq!(data.financial_details.currency.as_deref(), Some("USD"));
        assert_eq!(
            data.payment_structure.payment_terms.as_deref(),
            Some("Net 30")
        );
        assert!(data.payment_structure.payment_methods.contains("Credit Card"));
        assert_eq!(data.sla.performance_metrics.len(), 1);
        assert!(data.sla.support_terms.is_some());
        assert_eq!(data.contact_info.emails.len(), 1);
        assert_eq!(data.contact_info.phones.len(), 1);
        for category in [
            Category::Financial,
            Category::Parties,
            Category::Payment,
            Category::Sla,
            Category::Contact,
        ] {
            assert!(data.confidence(category) >= 0.5, "{} too low", category);
        }
    }

    #[test]
    fn test_one_party_contract_has_no_financial_content() {
        let data = FieldExtractor::new().extract_fields(ONE_PARTY_CONTRACT);

        assert_eq!(data.parties.len(), 1);
        assert_eq!(data.parties[0].name, "Initech Inc.");
        assert!(data.financial_details.total_value.is_none());
        assert_eq!(data.confidence(Category::Financial), 0.0);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let extractor = FieldExtractor::new();
        let first = extractor.extract_fields(COMPLETE_CONTRACT);
        let second = extractor.extract_fields(COMPLETE_CONTRACT);
        assert_eq!(first, second);
    }

    // ── Isolation ──

    #[test]
    fn test_failing_sub_extractor_is_isolated() {
        let baseline = FieldExtractor::new().extract_fields(COMPLETE_CONTRACT);
        let extractor = FieldExtractor::with_registry(registry_with_financial(failing_financial));

        let data = extractor.extract_fields(COMPLETE_CONTRACT);

        assert_eq!(data.confidence(Category::Financial), 0.0);
        assert!(data.financial_details.is_empty());
        assert_eq!(data.parties, baseline.parties);
        assert_eq!(data.payment_structure, baseline.payment_structure);
        assert_eq!(data.sla, baseline.sla);
        assert_eq!(data.contact_info, baseline.contact_info);
        assert_eq!(
            data.confidence(Category::Parties),
            baseline.confidence(Category::Parties)
        );
    }

    #[test]
    fn test_panicking_sub_extractor_is_isolated() {
        let extractor =
            FieldExtractor::with_registry(registry_with_financial(panicking_financial));

        let data = extractor.extract_fields(COMPLETE_CONTRACT);

        assert_eq!(data.confidence(Category::Financial), 0.0);
        assert!(data.financial_details.is_empty());
        assert_eq!(data.parties.len(), 2);
        assert!(data.confidence(Category::Contact) > 0.0);
    }

    #[test]
    fn test_mismatched_content_is_discarded() {
        fn wrong_category(_: &str) -> Result<CategoryOutput, SubExtractionFault> {
            Ok(CategoryOutput {
                content: CategoryContent::Parties(vec![Party::named("Rogue Ltd")]),
                confidence: 1.0,
            })
        }
        let extractor = FieldExtractor::with_registry(registry_with_financial(wrong_category));

        let data = extractor.extract_fields("nothing here");

        assert!(data.parties.is_empty());
        assert_eq!(data.confidence(Category::Financial), 0.0);
    }

    // ── Helpers ──

    #[test]
    fn test_window_respects_char_boundaries() {
        let text = "\u{20AC}100 total";
        let w = window(text, 3, 6, 2);
        assert!(w.starts_with('\u{20AC}'));
    }

    #[test]
    fn test_push_unique_ignores_case() {
        let mut list = vec!["Net 30".to_string()];
        push_unique(&mut list, "net 30");
        push_unique(&mut list, "  ");
        push_unique(&mut list, "Net 45");
        assert_eq!(list, vec!["Net 30".to_string(), "Net 45".to_string()]);
    }
}
