use thiserror::Error;

/// Amounts are held as integer cents so sums stay exact.
/// 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// Largest magnitude a single amount may have: 10 trillion units.
/// Keeping amounts this far below `i64::MAX` lets millions of them be summed exactly.
pub const MAX_AMOUNT: Cents = 1_000_000_000_000_000;

/// Whether `cents` is within `MAX_AMOUNT` in either direction.
pub fn is_within_limit(cents: Cents) -> bool {
    cents.unsigned_abs() <= MAX_AMOUNT.unsigned_abs()
}

/// Format cents as a plain decimal string.
/// Example: 380000 -> "3800.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a decimal string typed by a user into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000.
/// Digits past the second decimal place are truncated.
/// Amounts beyond `MAX_AMOUNT` are out of range.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(ParseCentsError::InvalidFormat(input.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ParseCentsError::InvalidFormat(input.to_string()));
    }

    let units: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| ParseCentsError::OutOfRange(input.to_string()))?
    };

    let fraction_cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().unwrap_or(0) * 10,
        _ => fraction[..2].parse().unwrap_or(0),
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction_cents))
        .filter(|c| is_within_limit(*c))
        .ok_or_else(|| ParseCentsError::OutOfRange(input.to_string()))?;
    Ok(if negative { -cents } else { cents })
}

/// Convert a stored amount in currency units into cents, rounding to the nearest cent.
/// Returns `None` for NaN, infinities and anything beyond `MAX_AMOUNT`.
pub fn units_to_cents(units: f64) -> Option<Cents> {
    if !units.is_finite() {
        return None;
    }
    let cents = (units * 100.0).round();
    if cents.abs() > MAX_AMOUNT as f64 {
        return None;
    }
    Some(cents as Cents)
}

/// Convert cents back into currency units for storage.
pub fn cents_to_units(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

/// Serde adapter writing cents as a JSON number in currency units (e.g. `12.5`).
/// Whole amounts are written as integers.
pub mod amount_units {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{cents_to_units, units_to_cents, Cents};

    pub fn serialize<S: Serializer>(cents: &Cents, s: S) -> Result<S::Ok, S::Error> {
        if cents % 100 == 0 {
            s.serialize_i64(cents / 100)
        } else {
            s.serialize_f64(cents_to_units(*cents))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Cents, D::Error> {
        let units = f64::deserialize(d)?;
        units_to_cents(units).ok_or_else(|| de::Error::custom(format!("invalid amount {units}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCentsError {
    #[error("invalid money format: '{0}'")]
    InvalidFormat(String),

    #[error("amount out of range: '{0}'")]
    OutOfRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(380000), "3800.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(-1), "-0.01");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("5000"), Ok(500000));
        assert_eq!(parse_cents("12.34"), Ok(1234));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("7."), Ok(700));
        assert_eq!(parse_cents(" -50.00 "), Ok(-5000));
        assert_eq!(parse_cents("100.999"), Ok(10099));
    }

    #[test]
    fn test_parse_cents_invalid() {
        assert!(matches!(
            parse_cents("abc"),
            Err(ParseCentsError::InvalidFormat(_))
        ));
        assert!(parse_cents("12.34.56").is_err());
        assert!(parse_cents("").is_err());
        assert!(parse_cents("-").is_err());
        assert!(parse_cents("1e5").is_err());
        assert!(matches!(
            parse_cents("99999999999999999999"),
            Err(ParseCentsError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_cents_limit() {
        assert_eq!(parse_cents("10000000000000"), Ok(MAX_AMOUNT));
        assert_eq!(parse_cents("-10000000000000.00"), Ok(-MAX_AMOUNT));
        assert!(matches!(
            parse_cents("10000000000000.01"),
            Err(ParseCentsError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_cents("60000000000000000"),
            Err(ParseCentsError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_units_to_cents() {
        assert_eq!(units_to_cents(5000.0), Some(500000));
        assert_eq!(units_to_cents(12.34), Some(1234));
        assert_eq!(units_to_cents(0.1 + 0.2), Some(30));
        assert_eq!(units_to_cents(-7.5), Some(-750));
        assert_eq!(units_to_cents(f64::NAN), None);
        assert_eq!(units_to_cents(f64::INFINITY), None);
        assert_eq!(units_to_cents(1e300), None);
    }

    #[test]
    fn test_units_to_cents_limit() {
        assert_eq!(units_to_cents(1e13), Some(MAX_AMOUNT));
        assert_eq!(units_to_cents(-1e13), Some(-MAX_AMOUNT));
        assert_eq!(units_to_cents(1.5e13), None);
        assert_eq!(units_to_cents(6e16), None);
        assert!(is_within_limit(MAX_AMOUNT));
        assert!(!is_within_limit(MAX_AMOUNT + 1));
        assert!(!is_within_limit(Cents::MIN));
    }

    #[test]
    fn test_cents_to_units() {
        assert_eq!(cents_to_units(1250), 12.5);
        assert_eq!(cents_to_units(-100), -1.0);
    }
}
