//! Output field sanitization
//!
//! Every field of both line formats passes through [`sanitize_field`], no
//! exceptions: the files are comma-delimited with CRLF terminators, so a
//! field must never carry a comma, a line break, a diacritic or the mojibake
//! the legacy data is littered with. Sanitizing an already-sanitized token is
//! a no-op.

/// Multi-byte artifacts left behind by legacy exports that double-decoded
/// UTF-8 (and the replacement character, which in this data is always a lost
/// enye).
const MOJIBAKE: &[(&str, &str)] = &[
    ("\u{221A}\u{00C5}", "A"),
    ("\u{221A}\u{00E2}", "E"),
    ("\u{221A}\u{00E7}", "I"),
    ("\u{221A}\u{00EC}", "O"),
    ("\u{221A}\u{00F6}", "U"),
    ("\u{221A}\u{00B0}", "A"),
    ("\u{221A}\u{00A9}", "E"),
    ("\u{221A}\u{2260}", "I"),
    ("\u{221A}\u{2265}", "O"),
    ("\u{221A}\u{222B}", "U"),
    ("\u{221A}\u{00EB}", "N"),
    ("\u{221A}\u{00B1}", "N"),
    ("\u{221A}\u{00FA}", "U"),
    ("\u{221A}\u{00BA}", "U"),
    ("\u{00D4}\u{00F8}\u{03A9}", "N"),
    ("\u{0153}\u{00F8}\u{03A9}", "N"),
    ("\u{FFFD}", "N"),
];

/// Sanitize one output field: commas and line breaks become spaces,
/// whitespace runs collapse, diacritics and mojibake are reduced to ASCII,
/// and the result is upper-cased.
pub fn sanitize_field(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| match c {
            ',' | '\r' | '\n' => ' ',
            other => other,
        })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    to_ascii(&collapsed).to_uppercase()
}

fn to_ascii(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }
    let mut text = value.to_string();
    for (artifact, replacement) in MOJIBAKE {
        if text.contains(artifact) {
            text = text.replace(artifact, replacement);
        }
    }
    text.chars().filter_map(transliterate).collect()
}

/// Map one character to its ASCII rendering; characters with no sensible
/// rendering are dropped.
fn transliterate(c: char) -> Option<char> {
    if c.is_ascii() {
        return Some(c);
    }
    let mapped = match c {
        'Á' | 'á' | 'À' | 'à' | 'Â' | 'â' | 'Ä' | 'ä' | 'Ã' | 'ã' => 'A',
        'É' | 'é' | 'È' | 'è' | 'Ê' | 'ê' | 'Ë' | 'ë' => 'E',
        'Í' | 'í' | 'Ì' | 'ì' | 'Î' | 'î' | 'Ï' | 'ï' => 'I',
        'Ó' | 'ó' | 'Ò' | 'ò' | 'Ô' | 'ô' | 'Ö' | 'ö' | 'Õ' | 'õ' => 'O',
        'Ú' | 'ú' | 'Ù' | 'ù' | 'Û' | 'û' | 'Ü' | 'ü' => 'U',
        'Ñ' | 'ñ' => 'N',
        'Ç' | 'ç' => 'C',
        _ => return None,
    };
    Some(mapped)
}
