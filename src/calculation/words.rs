//! Amounts in English words, as printed on pay slips.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;

const ONES: [&str; 20] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
    "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const SCALES: [(u64, &str); 4] = [
    (1_000_000_000_000, "Trillion"),
    (1_000_000_000, "Billion"),
    (1_000_000, "Million"),
    (1_000, "Thousand"),
];

/// Renders a money amount in words with the cents as a fraction.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::amount_in_words;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(
///     amount_in_words(Decimal::from_str("7692.31").unwrap()),
///     "Seven Thousand Six Hundred Ninety-Two and 31/100 Only"
/// );
/// assert_eq!(amount_in_words(Decimal::ZERO), "Zero and 00/100 Only");
/// ```
pub fn amount_in_words(amount: Decimal) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let whole = rounded.trunc();
    let cents = ((rounded - whole) * Decimal::from(100))
        .to_u64()
        .unwrap_or(0);

    let words = match whole.to_u64() {
        Some(n) => integer_in_words(n),
        None => whole.to_string(),
    };

    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "Minus "
    } else {
        ""
    };
    format!("{}{} and {:02}/100 Only", sign, words, cents)
}

fn integer_in_words(n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }

    let mut parts = Vec::new();
    let mut remainder = n;
    for (scale, name) in SCALES {
        if remainder >= scale {
            parts.push(format!("{} {}", below_thousand(remainder / scale), name));
            remainder %= scale;
        }
    }
    if remainder > 0 {
        parts.push(below_thousand(remainder));
    }
    parts.join(" ")
}

fn below_thousand(n: u64) -> String {
    let hundreds = n / 100;
    let rest = n % 100;
    let mut parts = Vec::new();
    if hundreds > 0 {
        parts.push(format!("{} Hundred", ONES[hundreds as usize]));
    }
    if rest > 0 {
        parts.push(below_hundred(rest));
    }
    parts.join(" ")
}

fn below_hundred(n: u64) -> String {
    if n < 20 {
        return ONES[n as usize].to_string();
    }
    let tens = TENS[(n / 10) as usize];
    match n % 10 {
        0 => tens.to_string(),
        ones => format!("{}-{}", tens, ONES[ones as usize]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_small_numbers() {
        assert_eq!(integer_in_words(7), "Seven");
        assert_eq!(integer_in_words(15), "Fifteen");
        assert_eq!(integer_in_words(40), "Forty");
        assert_eq!(integer_in_words(99), "Ninety-Nine");
    }

    #[test]
    fn test_hundreds_and_scales() {
        assert_eq!(integer_in_words(100), "One Hundred");
        assert_eq!(integer_in_words(1_005), "One Thousand Five");
        assert_eq!(
            integer_in_words(2_500_310),
            "Two Million Five Hundred Thousand Three Hundred Ten"
        );
    }

    #[test]
    fn test_amount_with_cents() {
        assert_eq!(
            amount_in_words(dec("3150")),
            "Three Thousand One Hundred Fifty and 00/100 Only"
        );
        assert_eq!(amount_in_words(dec("0.5")), "Zero and 50/100 Only");
    }

    #[test]
    fn test_negative_amount() {
        assert_eq!(
            amount_in_words(dec("-2000")),
            "Minus Two Thousand and 00/100 Only"
        );
    }
}
