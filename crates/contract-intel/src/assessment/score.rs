use std::collections::BTreeMap;

use crate::model::{Category, ExtractedData, ScoreResult};

/// One rubric line: `points` awarded when `present` holds.
struct Rule {
    category: Category,
    points: u8,
    present: fn(&ExtractedData) -> bool,
}

/// Scored categories and their maxima. Revenue is not scored.
pub const SCORED_CATEGORIES: [(Category, u8); 5] = [
    (Category::Financial, 30),
    (Category::Parties, 25),
    (Category::Payment, 20),
    (Category::Sla, 15),
    (Category::Contact, 10),
];

const RUBRIC: &[Rule] = &[
    Rule {
        category: Category::Financial,
        points: 15,
        present: |d| d.financial_details.total_value.is_some(),
    },
    Rule {
        category: Category::Financial,
        points: 10,
        present: |d| d.financial_details.currency.is_some(),
    },
    Rule {
        category: Category::Financial,
        points: 5,
        present: |d| !d.financial_details.line_items.is_empty(),
    },
    Rule {
        category: Category::Parties,
        points: 25,
        present: |d| d.parties.len() >= 2,
    },
    Rule {
        category: Category::Parties,
        points: 15,
        present: |d| d.parties.len() == 1,
    },
    Rule {
        category: Category::Payment,
        points: 12,
        present: |d| d.payment_structure.payment_terms.is_some(),
    },
    Rule {
        category: Category::Payment,
        points: 8,
        present: |d| !d.payment_structure.payment_methods.is_empty(),
    },
    Rule {
        category: Category::Sla,
        points: 10,
        present: |d| !d.sla.performance_metrics.is_empty(),
    },
    Rule {
        category: Category::Sla,
        points: 5,
        present: |d| d.sla.support_terms.is_some(),
    },
    Rule {
        category: Category::Contact,
        points: 5,
        present: |d| !d.contact_info.emails.is_empty(),
    },
    Rule {
        category: Category::Contact,
        points: 5,
        present: |d| !d.contact_info.phones.is_empty(),
    },
];

/// Scores field presence only; confidences do not affect the result.
///
/// The breakdown always lists every scored category and `overall` is its
/// exact sum.
pub fn score(data: &ExtractedData) -> ScoreResult {
    let mut breakdown: BTreeMap<Category, u8> =
        SCORED_CATEGORIES.iter().map(|(c, _)| (*c, 0)).collect();

    for rule in RUBRIC.iter().filter(|r| (r.present)(data)) {
        if let Some(points) = breakdown.get_mut(&rule.category) {
            *points += rule.points;
        }
    }

    let overall = breakdown.values().map(|p| u32::from(*p)).sum::<u32>();
    ScoreResult {
        overall: overall.min(100) as u8,
        breakdown,
    }
}
