//! Payment terms, accepted methods, schedules, remittance details and the
//! customer account being billed.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{push_unique, CategoryContent, CategoryOutput, SubExtractionFault};
use crate::model::PaymentStructure;

pub const TERMS_WEIGHT: f64 = 0.6;
pub const SINGLE_METHOD_WEIGHT: f64 = 0.3;
pub const MULTIPLE_METHODS_WEIGHT: f64 = 0.4;
pub const DETAIL_BONUS: f64 = 0.1;

const MAX_ENTRIES: usize = 10;

static NET_TERMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnet[ \t-]*(\d{1,3})\b").unwrap());

static DUE_WITHIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:due|payable|paid)[ \t]+within[ \t]+(\d{1,3})[ \t]+(?:calendar[ \t]+|business[ \t]+)?days?\b")
        .unwrap()
});

static DAYS_OF_INVOICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})[ \t]+days?[ \t]+(?:of|from|after)[ \t]+(?:the[ \t]+)?(?:date[ \t]+of[ \t]+)?(?:receipt[ \t]+of[ \t]+)?invoice").unwrap()
});

static DUE_ON_RECEIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:due|payable)[ \t]+(?:up)?on[ \t]+receipt\b").unwrap()
});

/// Canonical method names and the phrases that indicate them.
static METHODS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\bcredit[ \t]+cards?\b", "Credit Card"),
        (r"(?i)\bdebit[ \t]+cards?\b", "Debit Card"),
        (r"(?i)\b(?:wire[ \t]+transfers?|bank[ \t]+wires?|by[ \t]+wire)\b", "Wire Transfer"),
        (r"\bACH\b", "ACH"),
        (r"(?i)\b(?:cheques?|(?:by|via|with)[ \t]+checks?|check[ \t]+payments?|checks?[ \t]+payable)\b", "Check"),
        (r"(?i)\bbank[ \t]+transfers?\b", "Bank Transfer"),
        (r"(?i)\belectronic[ \t]+(?:payments?|funds[ \t]+transfers?)|\bEFT\b", "Electronic Payment"),
        (r"(?i)\bdirect[ \t]+deposits?\b", "Direct Deposit"),
        (r"(?i)\bpaypal\b", "PayPal"),
    ]
    .into_iter()
    .map(|(pattern, name)| (Regex::new(pattern).unwrap(), name))
    .collect()
});

static SCHEDULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:payable|invoiced|billed|paid)[ \t]+(?:in[ \t]+advance[ \t]+)?(?:monthly|quarterly|annually|yearly|weekly|semi-annually|in[ \t]+(?:\d+|two|three|four)[ \t]+installments?)\b[^.\n]{0,60}|\b(?:\d+|two|three|four)[ \t]+(?:equal[ \t]+)?installments?\b[^.\n]{0,60}|\bmilestone[ \t]+payments?\b[^.\n]{0,60}")
        .unwrap()
});

static DUE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bdue[ \t]+(?:on|by)[ \t]+((?:the[ \t]+)?(?:\d{1,2}(?:st|nd|rd|th)?[ \t]+(?:day[ \t]+)?of[ \t]+(?:each|every|the)[ \t]+(?:month|quarter|year)|(?:January|February|March|April|May|June|July|August|September|October|November|December)[ \t]+\d{1,2}(?:,[ \t]*\d{4})?|\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4}))")
        .unwrap()
});

static BANKING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:IBAN|SWIFT(?:/BIC)?|BIC|ABA|routing[ \t]+(?:number|no)|account[ \t]+(?:number|no)|sort[ \t]+code)\b\.?[ \t]*(?:#|:)?[ \t]*[A-Z0-9][A-Z0-9 \-]{3,33}[A-Z0-9]")
        .unwrap()
});

/// Customer-side identifiers; bare "account number" belongs to [`BANKING`].
static ACCOUNT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(?:customer|client|billing|subscriber)[ \t]+(?:account[ \t]+)?(?:number|no\.?|id|#)|account[ \t]+(?:id|#))[ \t]*[:#]?[ \t]*([A-Z0-9][A-Z0-9\-]{2,30})\b")
        .unwrap()
});

static BILLING_DETAILS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:billing[ \t]+(?:address|contact|details|information)|bill[ \t]+to|invoices?[ \t]+(?:shall[ \t]+be[ \t]+|will[ \t]+be[ \t]+)?(?:sent|addressed|delivered|emailed)[ \t]+to)[ \t]*:?[ \t]*([^\n]{3,120})")
        .unwrap()
});

pub fn extract(text: &str) -> Result<CategoryOutput, SubExtractionFault> {
    let structure = PaymentStructure {
        payment_terms: payment_terms(text),
        payment_methods: payment_methods(text),
        payment_schedules: collect(&SCHEDULE, text),
        due_dates: due_dates(text),
        banking_details: collect(&BANKING, text),
        account_numbers: account_numbers(text),
        billing_details: billing_details(text),
    };
    let confidence = confidence_for(&structure);

    Ok(CategoryOutput {
        content: CategoryContent::Payment(structure),
        confidence,
    })
}

pub fn confidence_for(structure: &PaymentStructure) -> f64 {
    let mut confidence = 0.0;
    if structure.payment_terms.is_some() {
        confidence += TERMS_WEIGHT;
    }
    confidence += match structure.payment_methods.len() {
        0 => 0.0,
        1 => SINGLE_METHOD_WEIGHT,
        _ => MULTIPLE_METHODS_WEIGHT,
    };
    for present in [
        !structure.payment_schedules.is_empty(),
        !structure.due_dates.is_empty(),
        !structure.banking_details.is_empty(),
    ] {
        if present {
            confidence += DETAIL_BONUS;
        }
    }
    f64::min(confidence, 1.0)
}

/// First recognised terms phrase, normalised. Earlier phrases win.
fn payment_terms(text: &str) -> Option<String> {
    let mut candidates: Vec<(usize, String)> = Vec::new();

    if let Some(caps) = NET_TERMS.captures(text) {
        if let (Some(m), Some(days)) = (caps.get(0), caps.get(1)) {
            candidates.push((m.start(), format!("Net {}", days.as_str())));
        }
    }
    if let Some(caps) = DUE_WITHIN.captures(text) {
        if let (Some(m), Some(days)) = (caps.get(0), caps.get(1)) {
            candidates.push((m.start(), format!("Due within {} days", days.as_str())));
        }
    }
    if let Some(caps) = DAYS_OF_INVOICE.captures(text) {
        if let (Some(m), Some(days)) = (caps.get(0), caps.get(1)) {
            candidates.push((m.start(), format!("{} days from invoice", days.as_str())));
        }
    }
    if let Some(m) = DUE_ON_RECEIPT.find(text) {
        candidates.push((m.start(), "Due on receipt".to_string()));
    }

    candidates.into_iter().min_by_key(|(pos, _)| *pos).map(|(_, t)| t)
}

fn payment_methods(text: &str) -> BTreeSet<String> {
    METHODS
        .iter()
        .filter(|(re, _)| re.is_match(text))
        .map(|(_, name)| name.to_string())
        .collect()
}

fn due_dates(text: &str) -> Vec<String> {
    let mut dates = Vec::new();
    for caps in DUE_DATE.captures_iter(text) {
        if let Some(date) = caps.get(1) {
            push_unique(&mut dates, date.as_str());
        }
        if dates.len() >= MAX_ENTRIES {
            break;
        }
    }
    dates
}

/// Identifiers without a digit are ordinary words ("Customer ID card").
fn account_numbers(text: &str) -> Vec<String> {
    let mut numbers = Vec::new();
    for caps in ACCOUNT_NUMBER.captures_iter(text) {
        if let Some(id) = caps.get(1).filter(|id| id.as_str().bytes().any(|b| b.is_ascii_digit())) {
            push_unique(&mut numbers, id.as_str().trim_end_matches('-'));
        }
        if numbers.len() >= MAX_ENTRIES {
            break;
        }
    }
    numbers
}

fn billing_details(text: &str) -> Option<String> {
    let details = BILLING_DETAILS.captures(text)?.get(1)?.as_str();
    let details = details.trim().trim_end_matches('.').trim_end();
    (!details.is_empty()).then(|| details.to_string())
}

fn collect(re: &Regex, text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for m in re.find_iter(text) {
        push_unique(&mut found, m.as_str());
        if found.len() >= MAX_ENTRIES {
            break;
        }
    }
    found
}
