//! Locale-tolerant parsing of monetary strings
//!
//! Statements mix Brazilian/European (`1.234,56`) and US (`1,234.56`)
//! conventions, sometimes within the same batch. Whichever separator
//! appears rightmost is taken as the decimal separator. Ambiguous
//! three-digit groupings such as `1,234` are read as decimals (`1.234`).

/// Parse a monetary string into a signed amount.
///
/// Never fails: anything that cannot be interpreted yields `0.0`.
pub fn parse_amount(raw: &str) -> f64 {
    let mut cleaned: String = raw
        .replace("R$", "")
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '$' | '€' | '£'))
        .collect();

    if cleaned.is_empty() {
        return 0.0;
    }

    // Accounting notation: (100,00) is an outflow
    let negate = cleaned.starts_with('(') && cleaned.ends_with(')');
    if negate {
        cleaned = cleaned[1..cleaned.len() - 1].to_string();
    }

    let value = parse_cleaned(&cleaned);
    if !value.is_finite() {
        return 0.0;
    }
    if negate {
        -value.abs()
    } else {
        value
    }
}

fn parse_cleaned(s: &str) -> f64 {
    if let Some(value) = parse_plain(s) {
        return value;
    }

    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');

    match (last_comma, last_dot) {
        (Some(comma), dot) if dot.map_or(true, |dot| comma > dot) => {
            parse_plain(&s.replace('.', "").replace(',', ".")).unwrap_or(0.0)
        }
        (comma, Some(dot)) if comma.map_or(true, |comma| dot > comma) => {
            parse_plain(&s.replace(',', "")).unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Plain decimal notation only; rejects `inf`, `nan` and friends
fn parse_plain(s: &str) -> Option<f64> {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    if digits.is_empty()
        || !digits.chars().any(|c| c.is_ascii_digit())
        || !digits.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Whether a cell reads as a number once commas become dots.
///
/// Used to recognize an unnamed value column.
pub fn looks_numeric(raw: &str) -> bool {
    let cleaned = raw.trim().replace(',', ".");
    parse_plain(&cleaned).is_some()
}
