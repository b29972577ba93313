//! Fixtures shared by unit tests.

use lopdf::{dictionary, Document, Object, Stream};

/// Contract text that satisfies every scored field.
pub const COMPLETE_CONTRACT: &str = "\
MASTER SERVICES AGREEMENT
This Agreement is entered into between Acme Corporation (\"Provider\") and Globex LLC (\"Client\").
The total contract value is $100,000 USD.
Payment Terms: Net 30. Payments may be made by Credit Card.
Service Level: 99.9% uptime guaranteed. 24/7 support is included.
Contact: billing@acme.com or 555-123-4567.";

/// Contract text naming a single company and no amount.
pub const ONE_PARTY_CONTRACT: &str = "\
Consulting letter issued by Initech Inc. for advisory work.
Invoices are payable Net 45.";

/// Builds a PDF whose pages each render the given lines with a base font.
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
        let mut content = String::new();
        for (i, line) in lines.iter().enumerate() {
            let y = 740 - (i as i64) * 14;
            content.push_str(&format!(
                "BT /F1 10 Tf 40 {} Td ({}) Tj ET\n",
                y,
                escape_pdf_string(line)
            ));
        }
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
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Renders multi-line text as a single-page PDF.
pub fn pdf_from_text(text: &str) -> Vec<u8> {
    let lines: Vec<&str> = text.lines().collect();
    pdf_with_pages(&[&lines])
}

fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}
