//! Deterministic value formatting for KPI output

/// Currency symbol used for monetary KPIs
pub const CURRENCY_SYMBOL: &str = "$";

/// Format as currency: symbol, thousands separators, two decimals
///
/// Negative amounts keep the sign after the symbol (`$-1,234.50`).
pub fn format_currency(value: f64) -> String {
    format!("{}{}", CURRENCY_SYMBOL, format_number(value, 2))
}

/// Format as a percentage with `decimals` places
///
/// Values at or below 1 are treated as fractions and scaled by 100 first.
pub fn format_percentage(value: f64, decimals: usize) -> String {
    let scaled = if value <= 1.0 { value * 100.0 } else { value };
    format!("{:.*}%", decimals, scaled)
}

/// Format with thousands separators and `decimals` places
pub fn format_number(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    // "-0.00" is not a useful rendering
    let sign = if int_part.chars().chain(frac_part.unwrap_or("").chars()).all(|c| c == '0') {
        ""
    } else {
        sign
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3);
    out.push_str(sign);
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format a count with thousands separators
pub fn format_count(value: usize) -> String {
    group_thousands(&value.to_string())
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
