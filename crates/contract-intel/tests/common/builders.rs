//! Builders for contract fixtures.
//!
//! Contract text is assembled from clauses the field extractors are known to
//! pick up, so a test can drop exactly the clause it wants to see reported
//! as a gap.

#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, Stream};

/// One clause of a generated contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Title,
    Parties,
    TotalValue,
    Payment,
    ServiceLevel,
    Contact,
}

impl Clause {
    pub const ALL: [Clause; 6] = [
        Clause::Title,
        Clause::Parties,
        Clause::TotalValue,
        Clause::Payment,
        Clause::ServiceLevel,
        Clause::Contact,
    ];

    fn line(self) -> &'static str {
        match self {
            Clause::Title => "MASTER SERVICES AGREEMENT",
            Clause::Parties => {
                "This Agreement is entered into between Acme Corporation (\"Provider\") and Globex LLC (\"Client\")."
            }
            Clause::TotalValue => "The total contract value is $100,000 USD.",
            Clause::Payment => "Payment Terms: Net 30. Payments may be made by Credit Card.",
            Clause::ServiceLevel => {
                "Service Level: 99.9% uptime guaranteed. 24/7 support is included."
            }
            Clause::Contact => "Contact: billing@acme.com or 555-123-4567.",
        }
    }
}

/// Builder for contract text.
pub struct ContractBuilder {
    clauses: Vec<Clause>,
    extra_lines: Vec<String>,
}

impl ContractBuilder {
    /// A contract carrying every clause.
    pub fn complete() -> Self {
        Self {
            clauses: Clause::ALL.to_vec(),
            extra_lines: Vec::new(),
        }
    }

    /// A contract with no clauses at all.
    pub fn empty() -> Self {
        Self {
            clauses: Vec::new(),
            extra_lines: Vec::new(),
        }
    }

    pub fn with(mut self, clause: Clause) -> Self {
        if !self.clauses.contains(&clause) {
            self.clauses.push(clause);
        }
        self
    }

    pub fn without(mut self, clause: Clause) -> Self {
        self.clauses.retain(|c| *c != clause);
        self
    }

    /// Appends a free-form line after the clauses.
    pub fn line(mut self, line: &str) -> Self {
        self.extra_lines.push(line.to_string());
        self
    }

    pub fn lines(&self) -> Vec<String> {
        Clause::ALL
            .iter()
            .filter(|c| self.clauses.contains(c))
            .map(|c| c.line().to_string())
            .chain(self.extra_lines.iter().cloned())
            .collect()
    }

    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    /// Renders the contract as a single-page PDF.
    pub fn pdf(&self) -> Vec<u8> {
        let lines = self.lines();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        pdf_with_pages(&[&refs])
    }
}

/// Builds a PDF whose pages each render the given lines with a base font.
/// A page with no lines has no text layer.
pub fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let content: String = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                format!(
                    "BT /F1 10 Tf 40 {} Td ({}) Tj ET\n",
                    740 - (i as i64) * 14,
                    line.replace('\\', "\\\\")
                        .replace('(', "\\(")
                        .replace(')', "\\)")
                )
            })
            .collect();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to render PDF fixture");
    bytes
}
