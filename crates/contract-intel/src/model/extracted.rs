//! Structured record produced by field extraction and semantic enhancement.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-level field groups of an [`ExtractedData`] record.
///
/// Declaration order is the checklist order used by gap analysis and the key
/// order of serialized confidence maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Financial,
    Parties,
    Payment,
    Revenue,
    Sla,
    Contact,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Financial,
        Category::Parties,
        Category::Payment,
        Category::Revenue,
        Category::Sla,
        Category::Contact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Financial => "financial",
            Category::Parties => "parties",
            Category::Payment => "payment",
            Category::Revenue => "revenue",
            Category::Sla => "sla",
            Category::Contact => "contact",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub legal_entity: Option<String>,
    #[serde(default)]
    pub signatories: BTreeSet<String>,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Party {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Option<u32>,
    pub unit_price: Option<Decimal>,
    pub total: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FinancialDetails {
    pub total_value: Option<Decimal>,
    pub currency: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub tax_info: Vec<String>,
    /// Fees charged on top of the contract value: late, setup, overage and the like.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_fees: Vec<String>,
}

impl FinancialDetails {
    pub fn is_empty(&self) -> bool {
        self.total_value.is_none()
            && self.currency.is_none()
            && self.line_items.is_empty()
            && self.tax_info.is_empty()
            && self.additional_fees.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentStructure {
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub payment_methods: BTreeSet<String>,
    #[serde(default)]
    pub payment_schedules: Vec<String>,
    #[serde(default)]
    pub due_dates: Vec<String>,
    #[serde(default)]
    pub banking_details: Vec<String>,
    /// Customer-side account identifiers, as opposed to bank accounts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub account_numbers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_details: Option<String>,
}

impl PaymentStructure {
    pub fn is_empty(&self) -> bool {
        self.payment_terms.is_none()
            && self.payment_methods.is_empty()
            && self.payment_schedules.is_empty()
            && self.due_dates.is_empty()
            && self.banking_details.is_empty()
            && self.account_numbers.is_empty()
            && self.billing_details.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevenueClassification {
    pub recurring_payments: bool,
    pub one_time_payments: bool,
    pub billing_cycle: Option<String>,
    pub auto_renewal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal_terms: Option<String>,
}

impl RevenueClassification {
    pub fn is_empty(&self) -> bool {
        !self.recurring_payments
            && !self.one_time_payments
            && self.billing_cycle.is_none()
            && !self.auto_renewal
            && self.subscription_model.is_none()
            && self.renewal_terms.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceLevelTerms {
    #[serde(default)]
    pub performance_metrics: Vec<String>,
    pub support_terms: Option<String>,
    #[serde(default)]
    pub penalty_clauses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remedies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_terms: Option<String>,
}

impl ServiceLevelTerms {
    pub fn is_empty(&self) -> bool {
        self.performance_metrics.is_empty()
            && self.support_terms.is_none()
            && self.penalty_clauses.is_empty()
            && self.remedies.is_empty()
            && self.maintenance_terms.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub emails: BTreeSet<String>,
    #[serde(default)]
    pub phones: BTreeSet<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phones.is_empty()
    }
}

/// Structured output of the extraction stages for one document.
///
/// `confidence_scores` always carries one entry per [`Category`]; a category
/// without content is recorded as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedData {
    pub parties: Vec<Party>,
    pub financial_details: FinancialDetails,
    pub payment_structure: PaymentStructure,
    pub revenue_classification: RevenueClassification,
    pub sla: ServiceLevelTerms,
    pub contact_info: ContactInfo,
    pub confidence_scores: BTreeMap<Category, f64>,
}

impl Default for ExtractedData {
    fn default() -> Self {
        Self {
            parties: Vec::new(),
            financial_details: FinancialDetails::default(),
            payment_structure: PaymentStructure::default(),
            revenue_classification: RevenueClassification::default(),
            sla: ServiceLevelTerms::default(),
            contact_info: ContactInfo::default(),
            confidence_scores: Category::ALL.iter().map(|c| (*c, 0.0)).collect(),
        }
    }
}

impl ExtractedData {
    pub fn confidence(&self, category: Category) -> f64 {
        self.confidence_scores.get(&category).copied().unwrap_or(0.0)
    }

    /// True when the record holds any extracted content for `category`.
    pub fn has_content(&self, category: Category) -> bool {
        match category {
            Category::Financial => !self.financial_details.is_empty(),
            Category::Parties => !self.parties.is_empty(),
            Category::Payment => !self.payment_structure.is_empty(),
            Category::Revenue => !self.revenue_classification.is_empty(),
            Category::Sla => !self.sla.is_empty(),
            Category::Contact => !self.contact_info.is_empty(),
        }
    }

    pub fn has_party(&self, name: &str) -> bool {
        self.parties
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_zero_confidence_for_every_category() {
        let data = ExtractedData::default();
        assert_eq!(data.confidence_scores.len(), Category::ALL.len());
        for category in Category::ALL {
            assert_eq!(data.confidence(category), 0.0);
            assert!(!data.has_content(category));
        }
    }

    #[test]
    fn test_confidence_keys_serialize_as_snake_case() {
        let json = serde_json::to_value(ExtractedData::default()).unwrap();
        let scores = json["confidence_scores"].as_object().unwrap();
        let keys: Vec<&str> = scores.keys().map(|k| k.as_str()).collect();
        assert!(keys.contains(&"financial"));
        assert!(keys.contains(&"sla"));
        assert!(keys.contains(&"contact"));
    }

    #[test]
    fn test_record_survives_json_round_trip() {
        let mut data = ExtractedData::default();
        data.parties.push(Party::named("Acme Corporation"));
        data.financial_details.total_value = Some(Decimal::new(10_000_050, 2));
        data.confidence_scores.insert(Category::Parties, 0.5);

        let json = serde_json::to_string(&data).unwrap();
        let back: ExtractedData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_supplementary_fields_count_as_content() {
        let mut data = ExtractedData::default();
        data.sla.maintenance_terms = Some("Scheduled maintenance on Sundays".to_string());
        data.payment_structure.account_numbers.push("CUST-00451".to_string());

        assert!(data.has_content(Category::Sla));
        assert!(data.has_content(Category::Payment));
        assert!(!data.has_content(Category::Revenue));
    }

    #[test]
    fn test_absent_supplementary_fields_are_omitted_and_defaulted() {
        let json = serde_json::to_value(ExtractedData::default()).unwrap();
        assert!(json["sla"].get("remedies").is_none());
        assert!(json["revenue_classification"].get("renewal_terms").is_none());

        let legacy = r#"{"performance_metrics":["99.9% uptime"],"support_terms":null,"penalty_clauses":[]}"#;
        let sla: ServiceLevelTerms = serde_json::from_str(legacy).unwrap();
        assert!(sla.remedies.is_empty());
        assert!(sla.maintenance_terms.is_none());
    }

    #[test]
    fn test_has_party_ignores_case() {
        let mut data = ExtractedData::default();
        data.parties.push(Party::named("Globex LLC"));
        assert!(data.has_party("globex llc"));
        assert!(!data.has_party("Initech"));
    }
}
