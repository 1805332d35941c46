//! Locale-aware amount parsing.
//!
//! Statements mix `1 234 567,89`, `1,234,567.89`, `245'061.92` and
//! parenthesised negatives. `parse_amount` returns `None` for anything that
//! carries no digits, so an unreadable cell stays distinguishable from `0.0`.

/// Parse a rendered amount into a float.
///
/// Separator rules:
/// - both `,` and `.` present: whichever comes last is the decimal mark, the
///   other is a thousands separator;
/// - only `,` present: it is the decimal mark;
/// - more than one `.` left after that: all but the last are dropped.
///
/// A leading `-`, `−` (U+2212) or surrounding parentheses make the value
/// negative. Any other non-numeric residue (currency codes, apostrophes) is
/// ignored.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();
    if compact.is_empty() {
        return None;
    }

    let mut negative = false;
    let mut body = compact.as_str();
    if body.starts_with('(') && body.ends_with(')') && body.len() >= 2 {
        negative = true;
        body = &body[1..body.len() - 1];
    }
    if let Some(rest) = body.strip_prefix('-').or_else(|| body.strip_prefix('\u{2212}')) {
        negative = true;
        body = rest;
    }

    let last_comma = body.rfind(',');
    let last_dot = body.rfind('.');
    let normalized: String = match (last_comma, last_dot) {
        (Some(c), Some(d)) if d > c => body.replace(',', ""),
        (Some(_), Some(_)) => body.replace('.', "").replace(',', "."),
        (Some(_), None) => body.replace(',', "."),
        _ => body.to_string(),
    };

    let digits: String = normalized
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let collapsed = match digits.rfind('.') {
        Some(pos) if digits.matches('.').count() > 1 => {
            let head: String = digits[..pos].chars().filter(|c| *c != '.').collect();
            format!("{head}{}", &digits[pos..])
        }
        _ => digits,
    };

    let value: f64 = collapsed.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// A token that can be a fragment of an amount: digits plus separators,
/// optionally signed or parenthesised. Fragments such as `30` and `000` that
/// the extractor split apart both qualify.
pub fn is_amount_fragment(text: &str) -> bool {
    let t = text.trim();
    if t.is_empty() {
        return false;
    }
    let t = t.trim_start_matches(['-', '\u{2212}', '(']).trim_end_matches(')');
    !t.is_empty()
        && t.chars().any(|c| c.is_ascii_digit())
        && t
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '\'' | ' ' | '\u{a0}' | '\u{202f}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.map(|v| (v - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn test_space_grouped_comma_decimal() {
        assert!(close(parse_amount("1 234 567,89"), 1_234_567.89));
        assert!(close(parse_amount("1\u{a0}234\u{202f}567,89"), 1_234_567.89));
    }

    #[test]
    fn test_comma_grouped_dot_decimal() {
        assert!(close(parse_amount("1,234,567.89"), 1_234_567.89));
        assert!(close(parse_amount("1,234.50"), 1_234.50));
    }

    #[test]
    fn test_dot_grouped_comma_decimal() {
        assert!(close(parse_amount("1.234.567,89"), 1_234_567.89));
    }

    #[test]
    fn test_negatives() {
        assert!(close(parse_amount("(4 000,00)"), -4000.0));
        assert!(close(parse_amount("-15,00"), -15.0));
        assert!(close(parse_amount("\u{2212}7.5"), -7.5));
    }

    #[test]
    fn test_small_and_residue() {
        assert!(close(parse_amount("0,01"), 0.01));
        assert!(close(parse_amount("245'061.92"), 245_061.92));
        assert!(close(parse_amount("KZT 30 000,00"), 30_000.0));
        assert!(close(parse_amount("1.2.3"), 12.3));
    }

    #[test]
    fn test_unparsable_is_none_not_zero() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("."), None);
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount("н/д"), None);
        assert!(close(parse_amount("0,00"), 0.0));
    }

    #[test]
    fn test_amount_fragments() {
        assert!(is_amount_fragment("30"));
        assert!(is_amount_fragment("000,00"));
        assert!(is_amount_fragment("(4"));
        assert!(!is_amount_fragment("KZT"));
        assert!(!is_amount_fragment("12.01.2024г"));
        assert!(!is_amount_fragment(","));
    }
}
