//! Currency and amount-in-words formatting
//!
//! Amounts use the Indian digit grouping (last three digits, then pairs) and
//! the Indian numbering scale (crore, lakh, thousand, hundred).

/// Rupee sign prefixed to every formatted amount
pub const RUPEE_SIGN: char = '\u{20B9}';

const ONES: [&str; 20] = [
    "Zero",
    "One",
    "Two",
    "Three",
    "Four",
    "Five",
    "Six",
    "Seven",
    "Eight",
    "Nine",
    "Ten",
    "Eleven",
    "Twelve",
    "Thirteen",
    "Fourteen",
    "Fifteen",
    "Sixteen",
    "Seventeen",
    "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const CRORE: u64 = 10_000_000;
const LAKH: u64 = 100_000;
const THOUSAND: u64 = 1_000;
const HUNDRED: u64 = 100;

/// Format an amount as `₹12,34,567.89`.
///
/// With `use_fractions` unset the amount is rounded to whole rupees.
pub fn format_currency(amount: f64, use_fractions: bool) -> String {
    let negative = amount < 0.0 && amount.abs() >= 0.005;
    let magnitude = amount.abs();

    let fixed = if use_fractions {
        format!("{magnitude:.2}")
    } else {
        format!("{magnitude:.0}")
    };

    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + 6);
    if negative {
        out.push('-');
    }
    out.push(RUPEE_SIGN);
    out.push_str(&group_indian(whole));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Insert separators per the 2-3-2 convention: `1234567` -> `12,34,567`
pub fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    let mut out = groups.join(",");
    out.push(',');
    out.push_str(last_three);
    out
}

/// Spell the whole-rupee part of an amount in words.
///
/// Paise are not spelled out. Negative amounts are spelled by magnitude.
pub fn number_to_words(amount: f64) -> String {
    let whole = amount.abs().trunc();
    if !whole.is_finite() || whole < 1.0 {
        return "Zero Rupees Only".to_string();
    }

    format!("{} Rupees Only", spell(whole as u64))
}

/// Spell a positive integer on the Indian scale
fn spell(n: u64) -> String {
    let mut parts: Vec<String> = Vec::new();

    let crores = n / CRORE;
    if crores > 0 {
        parts.push(format!("{} Crore", spell(crores)));
    }

    let lakhs = (n % CRORE) / LAKH;
    if lakhs > 0 {
        parts.push(format!("{} Lakh", below_hundred(lakhs)));
    }

    let thousands = (n % LAKH) / THOUSAND;
    if thousands > 0 {
        parts.push(format!("{} Thousand", below_hundred(thousands)));
    }

    let hundreds = (n % THOUSAND) / HUNDRED;
    if hundreds > 0 {
        parts.push(format!("{} Hundred", ONES[hundreds as usize]));
    }

    let rest = n % HUNDRED;
    if rest > 0 {
        parts.push(below_hundred(rest));
    }

    parts.join(" ")
}

fn below_hundred(n: u64) -> String {
    debug_assert!(n < 100);
    if n < 20 {
        return ONES[n as usize].to_string();
    }

    let tens = TENS[(n / 10) as usize];
    match n % 10 {
        0 => tens.to_string(),
        ones => format!("{} {}", tens, ONES[ones as usize]),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_indian() {
        assert_eq!(group_indian("0"), "0");
        assert_eq!(group_indian("999"), "999");
        assert_eq!(group_indian("1000"), "1,000");
        assert_eq!(group_indian("100000"), "1,00,000");
        assert_eq!(group_indian("1234567"), "12,34,567");
        assert_eq!(group_indian("123456789"), "12,34,56,789");
    }

    #[test]
    fn test_format_currency_with_fractions() {
        assert_eq!(format_currency(1234567.891, true), "\u{20B9}12,34,567.89");
        assert_eq!(format_currency(0.0, true), "\u{20B9}0.00");
        assert_eq!(format_currency(99.5, true), "\u{20B9}99.50");
    }

    #[test]
    fn test_format_currency_whole_rupees() {
        assert_eq!(format_currency(1500.0, false), "\u{20B9}1,500");
        assert_eq!(format_currency(250000.4, false), "\u{20B9}2,50,000");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(-500.0, true), "-\u{20B9}500.00");
        assert_eq!(format_currency(-0.001, true), "\u{20B9}0.00");
    }

    #[test]
    fn test_below_hundred() {
        assert_eq!(below_hundred(7), "Seven");
        assert_eq!(below_hundred(19), "Nineteen");
        assert_eq!(below_hundred(40), "Forty");
        assert_eq!(below_hundred(78), "Seventy Eight");
    }

    #[test]
    fn test_spell_scales() {
        assert_eq!(spell(100), "One Hundred");
        assert_eq!(spell(1_001), "One Thousand One");
        assert_eq!(spell(10_000_000), "One Crore");
        assert_eq!(spell(1_000_000_000), "One Hundred Crore");
    }
}
