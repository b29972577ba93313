//! Service-level commitments: measurable metrics, support coverage, penalties
//! and the remedies and maintenance windows around them.

use std::sync::LazyLock;

use regex::Regex;

use super::{push_unique, CategoryContent, CategoryOutput, SubExtractionFault};
use crate::model::ServiceLevelTerms;

pub const SINGLE_METRIC_WEIGHT: f64 = 0.4;
pub const MULTIPLE_METRICS_WEIGHT: f64 = 0.5;
pub const SUPPORT_WEIGHT: f64 = 0.5;
pub const PENALTY_BONUS: f64 = 0.1;

const MAX_ENTRIES: usize = 10;

static METRICS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b\d{2,3}(?:\.\d{1,3})?[ \t]*%[ \t]+(?:monthly[ \t]+|annual[ \t]+)?(?:uptime|availability|service[ \t]+availability)\b",
        r"(?i)\b(?:uptime|availability)(?:[ \t]+(?:of|target|commitment))?[ \t]*(?::|of|is)?[ \t]*\d{2,3}(?:\.\d{1,3})?[ \t]*%",
        r"(?i)\b(?:initial[ \t]+)?response[ \t]+times?[^.\n]{0,20}?\d+[ \t]*(?:business[ \t]+)?(?:minutes?|hours?|days?)\b",
        r"(?i)\bresolution[ \t]+times?[^.\n]{0,20}?\d+[ \t]*(?:business[ \t]+)?(?:minutes?|hours?|days?)\b",
        r"(?i)\brespond(?:s|ed)?[ \t]+within[ \t]+\d+[ \t]*(?:business[ \t]+)?(?:minutes?|hours?|days?)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static SUPPORT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:24/7|24x7|24[ \t]+hours?|round-the-clock|business[ \t]+hours?|premium|standard|priority|dedicated|phone|email)[ \t]+(?:technical[ \t]+|customer[ \t]+)?support\b",
        r"(?i)\bsupport[ \t]+(?:is|will[ \t]+be)[ \t]+(?:available|provided|offered)[^.\n]{0,60}",
        r"(?m)^[ \t]*Support[ \t]*:[ \t]*([^\n]{3,80})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static PENALTIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:service[ \t]+credits?|penalt(?:y|ies)|liquidated[ \t]+damages|fee[ \t]+reductions?)\b[^.\n]{0,80}")
        .unwrap()
});

static REMEDIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(?:sole[ \t]+and[ \t]+exclusive|exclusive|sole)[ \t]+remed(?:y|ies)|right[ \t]+to[ \t]+terminate|refunds?[ \t]+of|pro-?rata[ \t]+refunds?|re-?perform(?:ance)?[ \t]+of)\b[^.\n]{0,80}")
        .unwrap()
});

static MAINTENANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:scheduled|planned|routine|preventive|emergency)[ \t]+maintenance\b[^.\n]{0,100}|\bmaintenance[ \t]+windows?\b[^.\n]{0,100}")
        .unwrap()
});

pub fn extract(text: &str) -> Result<CategoryOutput, SubExtractionFault> {
    let terms = ServiceLevelTerms {
        performance_metrics: performance_metrics(text),
        support_terms: support_terms(text),
        penalty_clauses: penalty_clauses(text),
        remedies: remedies(text),
        maintenance_terms: MAINTENANCE
            .find(text)
            .map(|m| m.as_str().trim().to_string()),
    };
    let confidence = confidence_for(&terms);

    Ok(CategoryOutput {
        content: CategoryContent::Sla(terms),
        confidence,
    })
}

pub fn confidence_for(terms: &ServiceLevelTerms) -> f64 {
    let mut confidence = match terms.performance_metrics.len() {
        0 => 0.0,
        1 => SINGLE_METRIC_WEIGHT,
        _ => MULTIPLE_METRICS_WEIGHT,
    };
    if terms.support_terms.is_some() {
        confidence += SUPPORT_WEIGHT;
    }
    if !terms.penalty_clauses.is_empty() {
        confidence += PENALTY_BONUS;
    }
    f64::min(confidence, 1.0)
}

/// Metric phrases in document order; overlapping hits keep the earliest.
fn performance_metrics(text: &str) -> Vec<String> {
    let mut hits: Vec<(usize, usize)> = METRICS
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| (m.start(), m.end())))
        .collect();
    hits.sort();

    let mut metrics = Vec::new();
    let mut covered_to = 0;
    for (start, end) in hits {
        if start < covered_to {
            continue;
        }
        covered_to = end;
        push_unique(&mut metrics, &text[start..end]);
        if metrics.len() >= MAX_ENTRIES {
            break;
        }
    }
    metrics
}

fn support_terms(text: &str) -> Option<String> {
    SUPPORT
        .iter()
        .filter_map(|re| re.captures(text))
        .filter_map(|caps| {
            let m = caps.get(1).or_else(|| caps.get(0))?;
            Some((m.start(), m.as_str().trim().trim_end_matches('.').to_string()))
        })
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, term)| term)
}

fn penalty_clauses(text: &str) -> Vec<String> {
    let mut clauses = Vec::new();
    for m in PENALTIES.find_iter(text) {
        push_unique(&mut clauses, m.as_str());
        if clauses.len() >= MAX_ENTRIES {
            break;
        }
    }
    clauses
}

fn remedies(text: &str) -> Vec<String> {
    let mut remedies = Vec::new();
    for m in REMEDIES.find_iter(text) {
        push_unique(&mut remedies, m.as_str());
        if remedies.len() >= MAX_ENTRIES {
            break;
        }
    }
    remedies
}
