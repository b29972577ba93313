use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{CategoryContent, CategoryOutput, SubExtractionFault};
use crate::model::ContactInfo;

pub const EMAIL_WEIGHT: f64 = 0.5;
pub const PHONE_WEIGHT: f64 = 0.5;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[A-Z0-9._%+\-]+@[A-Z0-9.\-]+\.[A-Z]{2,}\b").unwrap());

/// North American numbers; each pattern captures area code, exchange, line.
static PHONES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\+1[-.\s]?\(?(\d{3})\)?[-.\s](\d{3})[-.\s](\d{4})\b",
        r"\((\d{3})\)\s*(\d{3})[-.\s](\d{4})\b",
        r"\b(\d{3})[-.](\d{3})[-.](\d{4})\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

pub fn extract(text: &str) -> Result<CategoryOutput, SubExtractionFault> {
    let info = ContactInfo {
        emails: EMAIL
            .find_iter(text)
            .map(|m| m.as_str().to_ascii_lowercase())
            .collect(),
        phones: phones(text),
    };
    let confidence = confidence_for(&info);

    Ok(CategoryOutput {
        content: CategoryContent::Contact(info),
        confidence,
    })
}

pub fn confidence_for(info: &ContactInfo) -> f64 {
    let mut confidence = 0.0;
    if !info.emails.is_empty() {
        confidence += EMAIL_WEIGHT;
    }
    if !info.phones.is_empty() {
        confidence += PHONE_WEIGHT;
    }
    confidence
}

/// Phone numbers normalised to `(555) 123-4567`.
fn phones(text: &str) -> BTreeSet<String> {
    PHONES
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| {
            Some(format!(
                "({}) {}-{}",
                caps.get(1)?.as_str(),
                caps.get(2)?.as_str(),
                caps.get(3)?.as_str()
            ))
        })
        .collect()
}
