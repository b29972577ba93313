//! Recurring versus one-time revenue, billing cadence and renewal terms.

use std::sync::LazyLock;

use regex::Regex;

use super::{CategoryContent, CategoryOutput, SubExtractionFault};
use crate::model::RevenueClassification;

pub const PAYMENT_KIND_WEIGHT: f64 = 0.4;
pub const BILLING_CYCLE_WEIGHT: f64 = 0.3;
pub const AUTO_RENEWAL_WEIGHT: f64 = 0.3;

static RECURRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:recurring|subscription|per[ \t]+(?:month|year|annum|quarter)|each[ \t]+(?:month|year|quarter)|every[ \t]+(?:month|year|quarter)|monthly[ \t]+(?:fee|charge|payment)s?|annual[ \t]+(?:fee|charge|subscription)s?)\b")
        .unwrap()
});

static ONE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:one[ \t-]time|single[ \t]+payment|lump[ \t-]sum|setup[ \t]+fee|set-up[ \t]+fee|implementation[ \t]+fee|onboarding[ \t]+fee|upfront[ \t]+(?:fee|payment))\b")
        .unwrap()
});

/// Canonical cycle names, most specific first so "semi-annual" is not read as
/// "annual".
static BILLING_CYCLES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\b(?:bi-?weekly|every[ \t]+(?:two|2)[ \t]+weeks)\b", "Bi-weekly"),
        (r"(?i)\b(?:semi-?annual(?:ly)?|bi-?annual(?:ly)?|every[ \t]+(?:six|6)[ \t]+months)\b", "Semi-annual"),
        (r"(?i)\b(?:monthly|per[ \t]+month|each[ \t]+month|every[ \t]+month)\b", "Monthly"),
        (r"(?i)\b(?:quarterly|per[ \t]+quarter|each[ \t]+quarter|every[ \t]+quarter)\b", "Quarterly"),
        (r"(?i)\b(?:annual(?:ly)?|yearly|per[ \t]+(?:year|annum)|each[ \t]+year|every[ \t]+year)\b", "Annual"),
        (r"(?i)\b(?:weekly|per[ \t]+week|each[ \t]+week|every[ \t]+week)\b", "Weekly"),
    ]
    .into_iter()
    .map(|(pattern, name)| (Regex::new(pattern).unwrap(), name))
    .collect()
});

static AUTO_RENEWAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:auto(?:matic(?:ally)?)?[ \t-]?renew(?:s|al|ed)?|renews?[ \t]+automatically|evergreen)\b")
        .unwrap()
});

/// Pricing models, most specific first.
static SUBSCRIPTION_MODELS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\b(?:usage-based|pay-as-you-go|pay[ \t]+per[ \t]+use|metered[ \t]+(?:billing|usage)|per[ \t]+(?:transaction|api[ \t]+call|request))\b", "Usage-based"),
        (r"(?i)\b(?:per[ \t]+(?:seat|user|licen[cs]e|named[ \t]+user)|seat-based|per-seat|per-user)\b", "Per-seat"),
        (r"(?i)\b(?:tiered[ \t]+(?:pricing|plan|subscription)|pricing[ \t]+tiers?)\b", "Tiered"),
        (r"(?i)\b(?:flat[ \t-]+(?:rate|fee)[ \t]+subscription|fixed[ \t]+(?:monthly|annual)[ \t]+(?:fee|subscription))\b", "Flat-rate"),
    ]
    .into_iter()
    .map(|(pattern, name)| (Regex::new(pattern).unwrap(), name))
    .collect()
});

static RENEWAL_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[^.\n]{0,80}\brenew(?:s|ed|als?)?\b[^.\n]{0,120}").unwrap()
});

pub fn extract(text: &str) -> Result<CategoryOutput, SubExtractionFault> {
    let classification = RevenueClassification {
        recurring_payments: mentions_recurring(text),
        one_time_payments: ONE_TIME.is_match(text),
        billing_cycle: billing_cycle(text).map(str::to_string),
        auto_renewal: AUTO_RENEWAL.is_match(text),
        subscription_model: subscription_model(text).map(str::to_string),
        renewal_terms: RENEWAL_TERMS
            .find(text)
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty()),
    };
    let confidence = confidence_for(&classification);

    Ok(CategoryOutput {
        content: CategoryContent::Revenue(classification),
        confidence,
    })
}

pub fn confidence_for(classification: &RevenueClassification) -> f64 {
    let mut confidence = 0.0;
    if classification.recurring_payments || classification.one_time_payments {
        confidence += PAYMENT_KIND_WEIGHT;
    }
    if classification.billing_cycle.is_some() {
        confidence += BILLING_CYCLE_WEIGHT;
    }
    if classification.auto_renewal {
        confidence += AUTO_RENEWAL_WEIGHT;
    }
    f64::min(confidence, 1.0)
}

/// "non-recurring" is a one-time signal, not a recurring one.
fn mentions_recurring(text: &str) -> bool {
    RECURRING.find_iter(text).any(|m| !negated(text, m.start()))
}

/// Only the four bytes ahead of `start` are inspected.
fn negated(text: &str, start: usize) -> bool {
    text.get(start.saturating_sub(4)..start)
        .is_some_and(|before| before.eq_ignore_ascii_case("non-") || before.eq_ignore_ascii_case("non "))
}

fn subscription_model(text: &str) -> Option<&'static str> {
    SUBSCRIPTION_MODELS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, name)| *name)
}

/// Cycle mentioned earliest in the text; ties go to the more specific name.
fn billing_cycle(text: &str) -> Option<&'static str> {
    BILLING_CYCLES
        .iter()
        .filter_map(|(re, name)| re.find(text).map(|m| (m.start(), *name)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification_of(text: &str) -> RevenueClassification {
        match extract(text).unwrap().content {
            CategoryContent::Revenue(r) => r,
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn test_recurring_subscription() {
        let r = classification_of("The subscription fee of $99 is charged per month.");
        assert!(r.recurring_payments);
        assert!(!r.one_time_payments);
        assert_eq!(r.billing_cycle.as_deref(), Some("Monthly"));
    }

    #[test]
    fn test_non_recurring_is_not_recurring() {
        let r = classification_of("A non-recurring setup fee applies.");
        assert!(!r.recurring_payments);
        assert!(r.one_time_payments);
    }

    #[test]
    fn test_negation_checks_only_adjacent_prefix() {
        let r = classification_of("NON RECURRING charges: none.");
        assert!(!r.recurring_payments);

        // A negated mention early on does not mask a later plain one.
        let r = classification_of("A non-recurring setup fee. Support is a recurring charge.");
        assert!(r.recurring_payments);

        // Multibyte text right before the match must not split a char.
        let r = classification_of("Gebühr recurring");
        assert!(r.recurring_payments);
    }

    #[test]
    fn test_many_recurring_mentions_scan_linearly() {
        let text = "non-recurring item. ".repeat(20_000) + "Annual subscription applies.";
        let r = classification_of(&text);
        assert!(r.recurring_payments);
        assert!(!r.one_time_payments);
    }

    #[test]
    fn test_subscription_model_most_specific_first() {
        let r = classification_of("Licensed per user per month, with pay-as-you-go overage.");
        assert_eq!(r.subscription_model.as_deref(), Some("Usage-based"));

        let r = classification_of("Fees are charged per seat under tiered pricing.");
        assert_eq!(r.subscription_model.as_deref(), Some("Per-seat"));

        assert!(classification_of("A single payment of $500.").subscription_model.is_none());
    }

    #[test]
    fn test_renewal_terms_capture_clause() {
        let r = classification_of(
            "Term: 12 months. This Agreement shall renew for successive one-year periods unless terminated. Notices follow.",
        );
        assert_eq!(
            r.renewal_terms.as_deref(),
            Some("This Agreement shall renew for successive one-year periods unless terminated")
        );
        assert!(!r.auto_renewal);
        assert_eq!(extract("This Agreement shall renew yearly.").unwrap().confidence, 0.3);
    }

    #[test]
    fn test_semi_annual_not_read_as_annual() {
        let r = classification_of("Invoices are issued semi-annually.");
        assert_eq!(r.billing_cycle.as_deref(), Some("Semi-annual"));
    }

    #[test]
    fn test_earliest_cycle_wins() {
        let r = classification_of("Billed quarterly, with an annual true-up.");
        assert_eq!(r.billing_cycle.as_deref(), Some("Quarterly"));
    }

    #[test]
    fn test_auto_renewal_phrases() {
        assert!(classification_of("This Agreement renews automatically.").auto_renewal);
        assert!(classification_of("Subject to auto-renewal for one year.").auto_renewal);
        assert!(classification_of("The term shall automatically renew.").auto_renewal);
        assert!(!classification_of("The term ends on expiry.").auto_renewal);
    }

    #[test]
    fn test_confidence_saturates() {
        let output = extract("Recurring monthly subscription that auto-renews each year.").unwrap();
        assert_eq!(output.confidence, 1.0);

        let output = extract("Plain services description.").unwrap();
        assert_eq!(output.confidence, 0.0);
        assert!(output.content.is_empty());
    }
}
