//! Text cleanup shared by ingestion and maintenance scripts.

const MAX_ENTITY_LEN: usize = 10;

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "laquo" => '«',
        "raquo" => '»',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "deg" => '°',
        "aacute" => 'á',
        "Aacute" => 'Á',
        "agrave" => 'à',
        "Agrave" => 'À',
        "acirc" => 'â',
        "Acirc" => 'Â',
        "atilde" => 'ã',
        "Atilde" => 'Ã',
        "eacute" => 'é',
        "Eacute" => 'É',
        "ecirc" => 'ê',
        "Ecirc" => 'Ê',
        "iacute" => 'í',
        "Iacute" => 'Í',
        "oacute" => 'ó',
        "Oacute" => 'Ó',
        "ocirc" => 'ô',
        "Ocirc" => 'Ô',
        "otilde" => 'õ',
        "Otilde" => 'Õ',
        "uacute" => 'ú',
        "Uacute" => 'Ú',
        "uuml" => 'ü',
        "ccedil" => 'ç',
        "Ccedil" => 'Ç',
        "ntilde" => 'ñ',
        _ => return None,
    };
    Some(c)
}

fn numeric_entity(body: &str) -> Option<char> {
    let code = if let Some(hex) = body.strip_prefix('x').or_else(|| body.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        body.parse::<u32>().ok()?
    };
    match char::from_u32(code)? {
        '\u{a0}' => Some(' '),
        c => Some(c),
    }
}

fn decode_entity(body: &str) -> Option<char> {
    match body.strip_prefix('#') {
        Some(num) if !num.is_empty() => numeric_entity(num),
        Some(_) => None,
        None => named_entity(body),
    }
}

/// Single left-to-right pass; unknown or unterminated entities are kept verbatim.
fn decode_once(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .char_indices()
            .take(MAX_ENTITY_LEN + 1)
            .find(|(_, c)| *c == ';')
            .and_then(|(semi, _)| decode_entity(&after[..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decodes HTML entities until the text stops changing, so double-escaped
/// feed text (`&amp;quot;`) comes out clean and the result is a fixpoint:
/// `decode_entities(&decode_entities(s)) == decode_entities(s)`.
pub fn decode_entities(input: &str) -> String {
    let mut current = decode_once(input);
    loop {
        let next = decode_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Entity-decoded, whitespace-collapsed text; `None` when nothing is left.
pub fn clean_text(input: &str) -> Option<String> {
    let cleaned = collapse_whitespace(&decode_entities(input));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Splits a scraped fighter name into name and quoted nickname:
/// `Alex "Poatan" Pereira` -> (`Alex Pereira`, `Some("Poatan")`).
pub fn clean_fighter_name(raw: &str) -> (String, Option<String>) {
    let decoded = decode_entities(raw)
        .replace(['“', '”'], "\"");
    let mut nickname = None;
    let mut name = decoded.clone();
    if let Some(open) = decoded.find('"') {
        if let Some(len) = decoded[open + 1..].find('"') {
            let inner = collapse_whitespace(&decoded[open + 1..open + 1 + len]);
            if !inner.is_empty() {
                nickname = Some(inner);
            }
            name = format!("{} {}", &decoded[..open], &decoded[open + 2 + len..]);
        }
    }
    (collapse_whitespace(&name.replace('"', "")), nickname)
}

/// Lowercase alphanumeric words joined by single spaces; used to compare titles.
pub fn normalize_title(input: &str) -> String {
    decode_entities(input)
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
