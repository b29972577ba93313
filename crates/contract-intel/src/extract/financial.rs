//! Currency, contract value, line items and tax references.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::{push_unique, window, CategoryContent, CategoryOutput, SubExtractionFault};
use crate::model::{FinancialDetails, LineItem};

pub const TOTAL_VALUE_WEIGHT: f64 = 0.4;
pub const CURRENCY_WEIGHT: f64 = 0.3;
pub const LINE_ITEMS_WEIGHT: f64 = 0.3;
pub const TAX_INFO_WEIGHT: f64 = 0.1;

const MAX_LINE_ITEMS: usize = 50;
const MAX_TAX_ENTRIES: usize = 5;
const MAX_FEE_ENTRIES: usize = 10;
const TOTAL_CONTEXT_RADIUS: usize = 60;
const TOTAL_KEYWORDS: &[&str] = &[
    "total",
    "contract value",
    "contract price",
    "contract amount",
    "aggregate",
    "sum of",
];

const AMOUNT: &str = r"(\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)";

/// Checked in order; explicit codes win over the bare dollar sign.
static CURRENCY_MARKERS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bUSD\b|\bUS\$|\bU\.S\.\s*[Dd]ollars?\b|\bUS [Dd]ollars?\b", "USD"),
        (r"\bEUR\b|\u{20AC}|\b[Ee]uros?\b", "EUR"),
        (r"\bGBP\b|\u{00A3}|\b[Pp]ounds? [Ss]terling\b", "GBP"),
        (r"\bCAD\b|\bCA\$|\bC\$|\bCanadian [Dd]ollars?\b", "CAD"),
        (r"\bAUD\b|\bAU\$|\bA\$|\bAustralian [Dd]ollars?\b", "AUD"),
        (r"\bJPY\b|\u{00A5}|\b[Yy]en\b", "JPY"),
        (r"\$", "USD"),
    ]
    .into_iter()
    .map(|(pattern, code)| (Regex::new(pattern).unwrap(), code))
    .collect()
});

static AMOUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?:US\$|CA\$|AU\$|C\$|A\$|\$|\u{{20AC}}|\u{{00A3}}|\u{{00A5}})[ \t]?{AMOUNT}"),
        format!(r"\b(?:USD|EUR|GBP|CAD|AUD|JPY)[ \t]?{AMOUNT}"),
        format!(r"{AMOUNT}[ \t]?(?:USD|EUR|GBP|CAD|AUD|JPY)\b"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const MONEY: &str = r"(?:(?:USD|EUR|GBP|CAD|AUD)[ \t]*)?[$\u{20AC}\u{00A3}]?[ \t]*";

static QUANTITY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t]*(?:[-*][ \t]*|\d+[.)][ \t]*)?([A-Za-z][^:\n]{{2,60}}?)[ \t]*[-:,][ \t]*(?:Quantity|Qty)[ \t]*:?[ \t]*(\d+)[ \t]*[-:,x][ \t]*(?:Unit[ \t]+Price|Price|Rate)[ \t]*:?[ \t]*{MONEY}{AMOUNT}(?:[ \t]*[-:,][ \t]*Total[ \t]*:?[ \t]*{MONEY}{AMOUNT})?"
    ))
    .unwrap()
});

static PRICED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t]*(?:[-*]|\d+[.)])[ \t]+([A-Za-z][^:\n$]{{2,60}}?)[ \t]*:[ \t]*(?:[$\u{{20AC}}\u{{00A3}}]|(?:USD|EUR|GBP|CAD|AUD)[ \t]*)[ \t]*{AMOUNT}"
    ))
    .unwrap()
});

static TAX_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:sales[ \t]+tax(?:es)?|tax(?:es)?|VAT|GST|HST)\b[^.\n]{0,80}").unwrap()
});

static ADDITIONAL_FEE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:late(?:[ \t]+payment)?|setup|set-up|implementation|onboarding|installation|termination|early[ \t]+termination|cancellation|overage|processing|administrative|admin|restocking|travel)[ \t]+(?:fees?|charges?|surcharges?)\b[^.\n]{0,80}")
        .unwrap()
});

pub fn extract(text: &str) -> Result<CategoryOutput, SubExtractionFault> {
    let details = FinancialDetails {
        total_value: total_value(text),
        currency: detect_currency(text).map(str::to_string),
        line_items: line_items(text),
        tax_info: tax_info(text),
        additional_fees: additional_fees(text),
    };
    let confidence = confidence_for(&details);

    Ok(CategoryOutput {
        content: CategoryContent::Financial(details),
        confidence,
    })
}

pub fn confidence_for(details: &FinancialDetails) -> f64 {
    let mut confidence = 0.0;
    if details.total_value.is_some() {
        confidence += TOTAL_VALUE_WEIGHT;
    }
    if details.currency.is_some() {
        confidence += CURRENCY_WEIGHT;
    }
    if !details.line_items.is_empty() {
        confidence += LINE_ITEMS_WEIGHT;
    }
    if !details.tax_info.is_empty() {
        confidence += TAX_INFO_WEIGHT;
    }
    f64::min(confidence, 1.0)
}

pub fn detect_currency(text: &str) -> Option<&'static str> {
    CURRENCY_MARKERS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, code)| *code)
}

/// Parses `1,234.50` style numbers.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', "")).ok()
}

fn plausible(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount < Decimal::from(1_000_000_000u64)
}

fn plausible_amount(raw: &str) -> Option<Decimal> {
    parse_amount(raw).filter(|v| plausible(*v))
}

/// Currency-marked amounts keyed by the byte offset of their digits.
fn amounts(text: &str) -> BTreeMap<usize, (Decimal, usize)> {
    let mut found = BTreeMap::new();
    for re in AMOUNT_PATTERNS.iter() {
        for caps in re.captures_iter(text) {
            let Some(number) = caps.get(1) else { continue };
            if let Some(value) = plausible_amount(number.as_str()) {
                found.entry(number.start()).or_insert((value, number.end()));
            }
        }
    }
    found
}

/// Largest amount near a total keyword, else the largest amount overall.
fn total_value(text: &str) -> Option<Decimal> {
    let amounts = amounts(text);
    let near_total = amounts
        .iter()
        .filter(|(start, (_, end))| {
            let context = window(text, **start, *end, TOTAL_CONTEXT_RADIUS).to_ascii_lowercase();
            TOTAL_KEYWORDS.iter().any(|k| context.contains(k))
        })
        .map(|(_, (value, _))| *value)
        .max();

    near_total.or_else(|| amounts.values().map(|(value, _)| *value).max())
}

fn line_items(text: &str) -> Vec<LineItem> {
    let mut items = Vec::new();
    let mut used_lines = Vec::new();

    for caps in QUANTITY_LINE.captures_iter(text) {
        let (Some(whole), Some(description)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let unit_price = caps.get(3).and_then(|m| plausible_amount(m.as_str()));
        let quantity = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        let total = caps
            .get(4)
            .and_then(|m| plausible_amount(m.as_str()))
            .or_else(|| {
                unit_price?
                    .checked_mul(Decimal::from(quantity?))
                    .filter(|v| plausible(*v))
            });
        used_lines.push(line_start(text, whole.start()));
        items.push(LineItem {
            description: description.as_str().trim().to_string(),
            quantity,
            unit_price,
            total,
        });
    }

    for caps in PRICED_LINE.captures_iter(text) {
        let (Some(whole), Some(description), Some(amount)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        if used_lines.contains(&line_start(text, whole.start())) {
            continue;
        }
        items.push(LineItem {
            description: description.as_str().trim().to_string(),
            quantity: None,
            unit_price: None,
            total: plausible_amount(amount.as_str()),
        });
    }

    items.truncate(MAX_LINE_ITEMS);
    items
}

fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn tax_info(text: &str) -> Vec<String> {
    let mut entries = Vec::new();
    for m in TAX_PHRASE.find_iter(text) {
        push_unique(&mut entries, m.as_str());
        if entries.len() >= MAX_TAX_ENTRIES {
            break;
        }
    }
    entries
}

fn additional_fees(text: &str) -> Vec<String> {
    let mut fees = Vec::new();
    for m in ADDITIONAL_FEE.find_iter(text) {
        push_unique(&mut fees, m.as_str());
        if fees.len() >= MAX_FEE_ENTRIES {
            break;
        }
    }
    fees
}
