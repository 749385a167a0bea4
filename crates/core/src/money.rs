//! Money value object (integer minor units).

use core::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// Non-negative monetary amount stored as cents.
///
/// Rendered as a plain decimal string with two fractional digits (`"100000.00"`);
/// parsed from such a string or a JSON number with at most two. Currency is not modelled; a transaction's amounts share
/// one implicit currency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(u64);

impl Money {
    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Whole currency units (no cents).
    pub fn from_units(units: u64) -> Self {
        Self(units.saturating_mul(100))
    }

    pub fn cents(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::invalid(format!("invalid amount '{s}'")));
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::invalid(format!(
                "invalid amount '{s}' (at most two decimal places)"
            )));
        }

        let units: u64 = whole
            .parse()
            .map_err(|_| DomainError::invalid(format!("amount '{s}' is too large")))?;
        let cents: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().unwrap_or(0) * 10,
            _ => frac.parse::<u64>().unwrap_or(0),
        };

        units
            .checked_mul(100)
            .and_then(|c| c.checked_add(cents))
            .map(Money)
            .ok_or_else(|| DomainError::invalid(format!("amount '{s}' is too large")))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("a non-negative amount with at most two decimal places")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        v.checked_mul(100)
            .map(Money)
            .ok_or_else(|| E::custom(format!("amount '{v}' is too large")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(E::custom(format!("invalid amount '{v}'"))),
        }
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        // Shortest round-trip rendering, so 10000.5 stays "10000.5".
        self.visit_str(&v.to_string())
    }
}

/// Accepts `"100000.00"` as well as bare JSON numbers (`100000`, `100000.5`).
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_two_decimal_amounts() {
        assert_eq!("100000.00".parse::<Money>().unwrap(), Money::from_units(100_000));
        assert_eq!("10000.5".parse::<Money>().unwrap(), Money::from_cents(1_000_050));
        assert_eq!("42".parse::<Money>().unwrap(), Money::from_cents(4_200));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for raw in ["", "-5.00", "1.234", "abc", "1.x", ".50"] {
            assert!(raw.parse::<Money>().is_err(), "expected '{raw}' to be rejected");
        }
    }

    #[test]
    fn renders_with_two_decimals() {
        assert_eq!(Money::from_cents(1_000_005).to_string(), "10000.05");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Money::from_units(200_000)).unwrap();
        assert_eq!(json, "\"200000.00\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_units(200_000));
    }

    #[test]
    fn deserializes_json_numbers() {
        let whole: Money = serde_json::from_str("100000").unwrap();
        assert_eq!(whole, Money::from_units(100_000));
        let decimal: Money = serde_json::from_str("10000.50").unwrap();
        assert_eq!(decimal, Money::from_cents(1_000_050));

        for raw in ["-5", "-5.5", "1.234", "true"] {
            assert!(serde_json::from_str::<Money>(raw).is_err(), "expected {raw} to be rejected");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            .. ProptestConfig::default()
        })]

        #[test]
        fn display_then_parse_is_identity(cents in 0u64..10_000_000_000_000u64) {
            let money = Money::from_cents(cents);
            prop_assert_eq!(money.to_string().parse::<Money>().unwrap(), money);
        }

        #[test]
        fn ordering_follows_cents(a in 0u64..1_000_000_000, b in 0u64..1_000_000_000) {
            prop_assert_eq!(Money::from_cents(a) <= Money::from_cents(b), a <= b);
        }
    }
}
