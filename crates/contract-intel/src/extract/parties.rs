//! Contract parties: corporate names, labelled parties, roles and signatories.

use std::sync::LazyLock;

use regex::Regex;

use super::{CategoryContent, CategoryOutput, SubExtractionFault};
use crate::model::Party;

pub const SINGLE_PARTY_CONFIDENCE: f64 = 0.5;
pub const MULTI_PARTY_CONFIDENCE: f64 = 0.8;
pub const SIGNATORY_BONUS: f64 = 0.1;
pub const LEGAL_ENTITY_BONUS: f64 = 0.1;
pub const MAX_PARTIES: usize = 10;

const SUFFIX: &str =
    r"(?i:incorporated|inc\.?|l\.l\.c\.|llc|llp|corporation|corp\.?|company|co\.|limited|ltd\.?|plc|gmbh)";

static COMPANY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:(?:[A-Z][A-Za-z0-9'\-]*|&)[ \t]+){{0,4}}[A-Z][A-Za-z0-9'\-]*,?[ \t]+{}",
        SUFFIX
    ))
    .unwrap()
});

static SUFFIX_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^{},?$", SUFFIX)).unwrap());

static LABELLED_PARTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:(?:PARTY|Party)[ \t]+(?:[A-Z]|\d{1,2})|(Client|Customer|Service Provider|Provider|Vendor|Supplier|Contractor|Consultant|Licensor|Licensee|Buyer|Seller))[ \t]*:[ \t]*([A-Z][^\n]{1,80})",
    )
    .unwrap()
});

static ROLE_AFTER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s*(?:,\s*(?:a|an)\s+[^()\n]{0,50}?,?\s*)?\(\s*(?i:the\s+|hereinafter\s+(?:referred\s+to\s+as\s+)?(?:the\s+)?)?["']?([A-Za-z][A-Za-z ]{1,30}?)["']?\s*\)"#,
    )
    .unwrap()
});

static SIGNATURE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:By|Name|Signed(?:[ \t]+by)?|Signature|Authorized[ \t]+Signatory)[ \t]*:[ \t]*(?:/s/[ \t]*)?([A-Z][a-z]+(?:[ \t]+[A-Z]\.)?(?:[ \t]+[A-Z][A-Za-z'\-]+){1,2})",
    )
    .unwrap()
});

static TITLED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b([A-Z][a-z]+(?:[ \t]+[A-Z]\.)?[ \t]+[A-Z][A-Za-z'\-]+),[ \t]+(?:Chief[ \t]+[A-Z][a-z]+[ \t]+Officer|CEO|CFO|COO|CTO|Vice[ \t]+President|President|Managing[ \t]+Director|Director|General[ \t]+Counsel|Manager|Partner|Owner)\b",
    )
    .unwrap()
});

/// Words that never identify a party on their own.
const GENERIC_WORDS: &[&str] = &[
    "the", "this", "that", "such", "said", "each", "either", "any", "all", "between", "and",
    "by", "for", "with", "whereas", "of", "party", "parties", "agreement", "contract", "master",
    "services", "service", "client", "customer", "provider", "vendor", "supplier",
    "contractor", "licensor", "licensee", "buyer", "seller", "company", "delaware", "nevada",
    "california", "texas", "new", "york", "state", "limited", "liability",
];

const ROLE_WORDS: &[&str] = &[
    "Service Provider",
    "Client",
    "Customer",
    "Provider",
    "Vendor",
    "Supplier",
    "Contractor",
    "Consultant",
    "Licensor",
    "Licensee",
    "Buyer",
    "Seller",
    "Company",
    "Partner",
    "Lessor",
    "Lessee",
    "Landlord",
    "Tenant",
];

pub fn extract(text: &str) -> Result<CategoryOutput, SubExtractionFault> {
    let mut parties = find_parties(text);
    attach_signatories(text, &mut parties);
    let confidence = confidence_for(&parties);

    Ok(CategoryOutput {
        content: CategoryContent::Parties(parties),
        confidence,
    })
}

/// Confidence for a party list: count tier plus signatory/legal-entity bonuses.
pub fn confidence_for(parties: &[Party]) -> f64 {
    let mut confidence = match parties.len() {
        0 => return 0.0,
        1 => SINGLE_PARTY_CONFIDENCE,
        _ => MULTI_PARTY_CONFIDENCE,
    };
    if parties.iter().any(|p| !p.signatories.is_empty()) {
        confidence += SIGNATORY_BONUS;
    }
    if parties.iter().any(|p| p.legal_entity.is_some()) {
        confidence += LEGAL_ENTITY_BONUS;
    }
    confidence.min(1.0)
}

/// Legal entity type implied by a name's corporate suffix.
pub fn legal_entity_for(name: &str) -> Option<&'static str> {
    let last = name.split_whitespace().last()?;
    let suffix = last
        .trim_end_matches(|c| c == ',' || c == '.')
        .to_ascii_lowercase();
    match suffix.as_str() {
        "inc" | "incorporated" | "corp" | "corporation" => Some("Corporation"),
        "llc" | "l.l.c" => Some("Limited Liability Company"),
        "llp" => Some("Limited Liability Partnership"),
        "ltd" | "limited" => Some("Limited Company"),
        "plc" => Some("Public Limited Company"),
        "gmbh" => Some("GmbH"),
        _ => None,
    }
}

fn find_parties(text: &str) -> Vec<Party> {
    let mut candidates: Vec<(usize, Party)> = Vec::new();

    for m in COMPANY_NAME.find_iter(text) {
        if text[m.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            continue;
        }
        let Some(name) = clean_name(m.as_str()) else {
            continue;
        };
        let mut party = Party::named(name);
        party.legal_entity = legal_entity_for(&party.name).map(str::to_string);
        if let Some(role) = role_after(&text[m.end()..]) {
            party.roles.insert(role.to_string());
        }
        candidates.push((m.start(), party));
    }

    for caps in LABELLED_PARTY.captures_iter(text) {
        let Some(value) = caps.get(2) else { continue };
        let raw = COMPANY_NAME
            .find(value.as_str())
            .map(|m| m.as_str())
            .unwrap_or_else(|| cut_label_value(value.as_str()));
        let Some(name) = clean_name(raw) else {
            continue;
        };
        let mut party = Party::named(name);
        party.legal_entity = legal_entity_for(&party.name).map(str::to_string);
        if let Some(role) = caps.get(1).and_then(|r| canonical_role(r.as_str())) {
            party.roles.insert(role.to_string());
        }
        candidates.push((value.start(), party));
    }

    candidates.sort_by_key(|(offset, _)| *offset);

    let mut parties: Vec<Party> = Vec::new();
    for (_, candidate) in candidates {
        if let Some(existing) = parties
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&candidate.name))
        {
            existing.roles.extend(candidate.roles);
            if existing.legal_entity.is_none() {
                existing.legal_entity = candidate.legal_entity;
            }
            continue;
        }
        if parties.len() < MAX_PARTIES {
            parties.push(candidate);
        }
    }
    parties
}

/// Strips leading filler words and rejects names made only of generic words.
fn clean_name(raw: &str) -> Option<String> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let start = tokens
        .iter()
        .position(|t| !is_generic(t))
        .unwrap_or(tokens.len());
    let tokens = &tokens[start..];

    let body = match tokens.split_last() {
        Some((last, rest)) if SUFFIX_TOKEN.is_match(last) => rest,
        _ => tokens,
    };
    if body.is_empty() || body.iter().all(|t| is_generic(t) || *t == "&") {
        return None;
    }

    let name = tokens.join(" ");
    let name = name.trim_end_matches(',').trim();
    if name.len() < 2 || name.len() > 80 {
        return None;
    }
    Some(name.to_string())
}

fn is_generic(token: &str) -> bool {
    let word = token
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_ascii_lowercase();
    GENERIC_WORDS.contains(&word.as_str())
}

fn cut_label_value(value: &str) -> &str {
    let end = [",", "(", ";", " located", " with ", " whose "]
        .iter()
        .filter_map(|sep| value.find(sep))
        .min()
        .unwrap_or(value.len());
    value[..end].trim().trim_end_matches('.')
}

fn role_after(rest: &str) -> Option<&'static str> {
    let limit = rest
        .char_indices()
        .nth(120)
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    ROLE_AFTER_NAME
        .captures(&rest[..limit])
        .and_then(|caps| caps.get(1))
        .and_then(|term| canonical_role(term.as_str()))
}

fn canonical_role(term: &str) -> Option<&'static str> {
    let term = term.trim();
    ROLE_WORDS
        .iter()
        .find(|role| role.eq_ignore_ascii_case(term))
        .copied()
}

/// Attaches each signatory to the party mentioned closest before it.
fn attach_signatories(text: &str, parties: &mut [Party]) {
    if parties.is_empty() {
        return;
    }

    let mut mentions: Vec<(usize, usize)> = Vec::new();
    for (idx, party) in parties.iter().enumerate() {
        for (offset, _) in text.match_indices(party.name.as_str()) {
            mentions.push((offset, idx));
        }
    }
    mentions.sort_unstable();

    let mut found: Vec<(usize, String)> = Vec::new();
    for re in [&*SIGNATURE_LINE, &*TITLED_NAME] {
        for caps in re.captures_iter(text) {
            if let Some(name) = caps.get(1) {
                found.push((name.start(), name.as_str().to_string()));
            }
        }
    }

    for (offset, name) in found {
        let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.split_whitespace().any(|t| is_generic(t) || SUFFIX_TOKEN.is_match(t)) {
            continue;
        }
        let owner = mentions
            .iter()
            .take_while(|(mention, _)| *mention < offset)
            .last()
            .map(|(_, idx)| *idx)
            .unwrap_or(0);
        parties[owner].signatories.insert(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parties_of(text: &str) -> Vec<Party> {
        match extract(text).unwrap().content {
            CategoryContent::Parties(p) => p,
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn test_two_companies_with_roles() {
        let parties = parties_of(
            "This Agreement is entered into between Acme Corporation (\"Provider\") and Globex LLC (\"Client\").",
        );

        assert_eq!(parties.len(), 2);
        assert_eq!(parties[0].name, "Acme Corporation");
        assert_eq!(parties[0].legal_entity.as_deref(), Some("Corporation"));
        assert!(parties[0].roles.contains("Provider"));
        assert_eq!(parties[1].name, "Globex LLC");
        assert_eq!(
            parties[1].legal_entity.as_deref(),
            Some("Limited Liability Company")
        );
        assert!(parties[1].roles.contains("Client"));
    }

    #[test]
    fn test_leading_filler_words_are_stripped() {
        let parties = parties_of("Agreement Between Initech Inc. and the vendor.");
        assert_eq!(parties.len(), 1);
        assert_eq!(parties[0].name, "Initech Inc.");
    }

    #[test]
    fn test_generic_phrases_are_rejected() {
        let parties = parties_of("The Company shall notify the Delaware Corporation.");
        assert!(parties.is_empty());
    }

    #[test]
    fn test_appositive_before_role_is_skipped() {
        let parties = parties_of(
            "Stark Industries Inc., a Delaware corporation (the \"Company\"), agrees as follows.",
        );
        assert_eq!(parties[0].name, "Stark Industries Inc.");
        assert!(parties[0].roles.contains("Company"));
    }

    #[test]
    fn test_duplicate_mentions_collapse() {
        let parties = parties_of("Globex LLC agrees. Later, GLOBEX LLC pays. Globex LLC signs.");
        assert_eq!(parties.len(), 1);
    }

    #[test]
    fn test_labelled_party_without_suffix() {
        let parties = parties_of("PARTY A: Hooli Systems, located in Palo Alto\nClient: Pied Piper Labs");
        let names: Vec<&str> = parties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Hooli Systems", "Pied Piper Labs"]);
        assert!(parties[1].roles.contains("Client"));
        assert!(parties[0].legal_entity.is_none());
    }

    #[test]
    fn test_signatories_attach_to_nearest_preceding_party() {
        let text = "Acme Corporation and Globex LLC agree.\n\
                    ACME SIGNATURE for Acme Corporation\n\
                    By: Jane Smith\n\
                    For Globex LLC\n\
                    By: Hank Scorpio";
        let parties = parties_of(text);

        assert!(parties[0].signatories.contains("Jane Smith"));
        assert!(parties[1].signatories.contains("Hank Scorpio"));
        assert!(!parties[0].signatories.contains("Hank Scorpio"));
    }

    #[test]
    fn test_titled_name_is_signatory() {
        let parties = parties_of("Umbrella Corp. executes this.\nAlbert Wesker, Chief Executive Officer");
        assert!(parties[0].signatories.contains("Albert Wesker"));
    }

    #[test]
    fn test_party_limit() {
        let text: String = (0..15)
            .map(|i| format!("Vendor{} LLC. ", (b'A' + i as u8) as char))
            .collect();
        assert_eq!(parties_of(&text).len(), MAX_PARTIES);
    }

    // ── Confidence ──

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(confidence_for(&[]), 0.0);
        assert_eq!(confidence_for(&[Party::named("Hooli")]), SINGLE_PARTY_CONFIDENCE);

        let mut a = Party::named("Acme Corporation");
        a.legal_entity = Some("Corporation".to_string());
        a.signatories.insert("Jane Smith".to_string());
        let b = Party::named("Globex");
        let expected = MULTI_PARTY_CONFIDENCE + SIGNATORY_BONUS + LEGAL_ENTITY_BONUS;
        assert!((confidence_for(&[a, b]) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_legal_entity_mapping() {
        assert_eq!(legal_entity_for("Acme Inc."), Some("Corporation"));
        assert_eq!(legal_entity_for("Acme L.L.C."), Some("Limited Liability Company"));
        assert_eq!(legal_entity_for("Acme Ltd"), Some("Limited Company"));
        assert_eq!(legal_entity_for("Acme Company"), None);
    }
}
