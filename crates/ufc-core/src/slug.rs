//! Slug rules for events and generic slug generation.

use crate::EventoTipo;

/// Number of a numbered (pay-per-view) card: `ufc-315` or `ufc-315-...`.
pub fn ppv_number(slug: &str) -> Option<u32> {
    let slug = slug.trim().to_ascii_lowercase();
    let rest = slug.strip_prefix("ufc-")?;
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let (digits, tail) = rest.split_at(digits_len);
    if !tail.is_empty() && !tail.starts_with('-') {
        return None;
    }
    digits.parse().ok()
}

/// Event type implied by the slug. `None` when the slug follows neither pattern.
pub fn tipo_from_slug(slug: &str) -> Option<EventoTipo> {
    if ppv_number(slug).is_some() {
        Some(EventoTipo::Ppv)
    } else if slug.to_ascii_lowercase().contains("fight-night") {
        Some(EventoTipo::FightNight)
    } else {
        None
    }
}

/// Canonical display name for numbered cards (`ufc-315` -> `UFC 315`).
pub fn nome_from_slug(slug: &str) -> Option<String> {
    ppv_number(slug).map(|n| format!("UFC {n}"))
}

pub fn slugify(input: &str) -> String {
    input
        .trim()
        .chars()
        .map(fold_accent)
        .map(|c| c.to_ascii_lowercase())
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        other => other,
    }
}
