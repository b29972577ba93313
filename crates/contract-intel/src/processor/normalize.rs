//! Cleanup applied to raw page text before field extraction.

/// Normalizes one page: typographic punctuation is folded to ASCII, other
/// non-ASCII glyphs are dropped (currency symbols excepted), whitespace runs
/// inside a line collapse to one space and blank lines are removed.
pub fn normalize_page_text(raw: &str) -> String {
    raw.lines()
        .map(normalize_line)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_line(line: &str) -> String {
    let folded: String = line.chars().filter_map(fold_char).collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_char(c: char) -> Option<char> {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201B}' => Some('\''),
        '\u{201C}' | '\u{201D}' | '\u{201F}' => Some('"'),
        '\u{2010}'..='\u{2015}' => Some('-'),
        '\u{00A0}' | '\u{2007}' | '\u{202F}' => Some(' '),
        '\u{2022}' => Some('-'),
        '\u{20AC}' | '\u{00A3}' | '\u{00A5}' => Some(c),
        '\t' => Some(' '),
        c if c.is_ascii_graphic() || c == ' ' => Some(c),
        _ => None,
    }
}
