use tracing::debug;

use crate::model::{Category, Criticality, ExtractedData, Gap};

/// Category confidence below which a present field still counts as a gap.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// One required field of the completeness checklist.
pub struct ChecklistItem {
    pub field: &'static str,
    pub category: Category,
    pub criticality: Criticality,
    pub description: &'static str,
    present: fn(&ExtractedData) -> bool,
}

/// Declaration order is the order gaps are reported in.
pub const CHECKLIST: &[ChecklistItem] = &[
    ChecklistItem {
        field: "financial_details.total_value",
        category: Category::Financial,
        criticality: Criticality::High,
        description: "Missing total contract value",
        present: |d| d.financial_details.total_value.is_some(),
    },
    ChecklistItem {
        field: "financial_details.currency",
        category: Category::Financial,
        criticality: Criticality::Medium,
        description: "Currency not specified",
        present: |d| d.financial_details.currency.is_some(),
    },
    ChecklistItem {
        field: "parties",
        category: Category::Parties,
        criticality: Criticality::High,
        description: "Contract parties not fully identified",
        present: |d| d.parties.len() >= 2,
    },
    ChecklistItem {
        field: "payment_structure.payment_terms",
        category: Category::Payment,
        criticality: Criticality::Medium,
        description: "Payment terms not specified",
        present: |d| d.payment_structure.payment_terms.is_some(),
    },
    ChecklistItem {
        field: "payment_structure.payment_methods",
        category: Category::Payment,
        criticality: Criticality::Medium,
        description: "Payment methods not specified",
        present: |d| !d.payment_structure.payment_methods.is_empty(),
    },
    ChecklistItem {
        field: "sla.performance_metrics",
        category: Category::Sla,
        criticality: Criticality::Medium,
        description: "No performance metrics defined",
        present: |d| !d.sla.performance_metrics.is_empty(),
    },
    ChecklistItem {
        field: "sla.support_terms",
        category: Category::Sla,
        criticality: Criticality::Low,
        description: "Support terms not specified",
        present: |d| d.sla.support_terms.is_some(),
    },
    ChecklistItem {
        field: "contact_info.emails",
        category: Category::Contact,
        criticality: Criticality::Low,
        description: "No contact email found",
        present: |d| !d.contact_info.emails.is_empty(),
    },
    ChecklistItem {
        field: "contact_info.phones",
        category: Category::Contact,
        criticality: Criticality::Low,
        description: "No contact phone found",
        present: |d| !d.contact_info.phones.is_empty(),
    },
];

/// Walks [`CHECKLIST`] against a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapAnalyzer {
    min_confidence: f64,
}

impl Default for GapAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

impl GapAnalyzer {
    /// Out-of-range or NaN thresholds fall back to the default.
    pub fn new(min_confidence: f64) -> Self {
        let min_confidence = if (0.0..=1.0).contains(&min_confidence) {
            min_confidence
        } else {
            DEFAULT_MIN_CONFIDENCE
        };
        Self { min_confidence }
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    pub fn analyze(&self, data: &ExtractedData) -> Vec<Gap> {
        let gaps: Vec<Gap> = CHECKLIST
            .iter()
            .filter_map(|item| {
                let present = (item.present)(data);
                let confident = data.confidence(item.category) >= self.min_confidence;
                if present && confident {
                    return None;
                }
                let description = if present {
                    format!("{} (low confidence)", item.description)
                } else {
                    item.description.to_string()
                };
                Some(Gap {
                    field: item.field.to_string(),
                    description,
                    criticality: item.criticality,
                })
            })
            .collect();

        debug!(gaps = gaps.len(), threshold = self.min_confidence, "Gap analysis finished");
        gaps
    }
}
