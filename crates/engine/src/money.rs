use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{EngineError, ResultEngine};

/// Signed money amount represented as **integer cents**.
///
/// Use this type for **all** monetary values in the engine (balances, prices,
/// ledger amounts) to avoid floating-point drift. Two decimal places are the
/// native precision: every derived amount (line total, discount, tax) is
/// rounded to cents exactly once, at the point it is computed.
///
/// The value is signed:
/// - positive = income / increase
/// - negative = expense / decrease
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!("10".parse::<MoneyCents>().unwrap().cents(), 1000);
/// assert_eq!("10,5".parse::<MoneyCents>().unwrap().cents(), 1050);
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_sub(rhs.0).map(MoneyCents)
    }

    /// Multiplies by a unit count, failing on overflow.
    pub fn times(self, quantity: i64) -> ResultEngine<MoneyCents> {
        let product = i128::from(self.0) * i128::from(quantity);
        i64::try_from(product)
            .map(MoneyCents)
            .map_err(|_| EngineError::Validation("amount too large".to_string()))
    }

    /// Divides by an integer, rounding half away from zero.
    ///
    /// Used to derive a per-unit price from a per-dozen price. The operands
    /// stay unrounded; only the result is rounded, once.
    #[must_use]
    pub fn div_round(self, divisor: i64) -> MoneyCents {
        MoneyCents(round_div(i128::from(self.0), i128::from(divisor)))
    }
}

/// Integer division rounding half away from zero.
fn round_div(numer: i128, denom: i128) -> i64 {
    debug_assert!(denom > 0);
    let rounded = if numer >= 0 {
        (numer + denom / 2) / denom
    } else {
        (numer - denom / 2) / denom
    };
    rounded as i64
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 + rhs.0)
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        self.0 += rhs.0;
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 - rhs.0)
    }
}

impl SubAssign for MoneyCents {
    fn sub_assign(&mut self, rhs: MoneyCents) {
        self.0 -= rhs.0;
    }
}

impl Neg for MoneyCents {
    type Output = MoneyCents;

    fn neg(self) -> Self::Output {
        MoneyCents(-self.0)
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s).map(MoneyCents)
    }
}

impl Serialize for MoneyCents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MoneyCents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A percentage with two decimal places, stored as hundredths of a percent.
///
/// `Percent::new(1250)` is 12.50%. Applying a percentage multiplies on the
/// unrounded operands and rounds the result once, half away from zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Percent(i64);

impl Percent {
    #[must_use]
    pub const fn new(hundredths: i64) -> Self {
        Self(hundredths)
    }

    #[must_use]
    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// Computes `self` percent of `base`, rounded once.
    #[must_use]
    pub fn of(self, base: MoneyCents) -> MoneyCents {
        MoneyCents(round_div(
            i128::from(base.cents()) * i128::from(self.0),
            10_000,
        ))
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Percent {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s).map(Percent)
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A discount or tax, either a percentage of the base or an absolute amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Adjustment {
    Percent(Percent),
    Absolute(MoneyCents),
}

impl Adjustment {
    pub const NONE: Adjustment = Adjustment::Absolute(MoneyCents::ZERO);

    /// The amount this adjustment represents against `base`.
    #[must_use]
    pub fn amount_on(&self, base: MoneyCents) -> MoneyCents {
        match self {
            Adjustment::Percent(pct) => pct.of(base),
            Adjustment::Absolute(amount) => *amount,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Adjustment::Percent(_) => "percent",
            Adjustment::Absolute(_) => "absolute",
        }
    }

    pub(crate) fn raw_value(&self) -> i64 {
        match self {
            Adjustment::Percent(pct) => pct.hundredths(),
            Adjustment::Absolute(amount) => amount.cents(),
        }
    }

    pub(crate) fn from_columns(kind: &str, value: i64) -> ResultEngine<Self> {
        match kind {
            "percent" => Ok(Adjustment::Percent(Percent::new(value))),
            "absolute" => Ok(Adjustment::Absolute(MoneyCents::new(value))),
            other => Err(EngineError::Validation(format!(
                "invalid adjustment kind: {other}"
            ))),
        }
    }
}

impl Default for Adjustment {
    fn default() -> Self {
        Adjustment::NONE
    }
}

/// Parses a decimal string with at most two fractional digits into a scaled
/// integer (`"10.50"` becomes `1050`).
fn parse_scaled(s: &str) -> ResultEngine<i64> {
    let empty = || EngineError::Validation("empty amount".to_string());
    let invalid = || EngineError::Validation("invalid amount".to_string());
    let overflow = || EngineError::Validation("amount too large".to_string());

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let (sign, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (-1i64, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (1i64, stripped)
    } else {
        (1i64, trimmed)
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return Err(empty());
    }

    let rest = rest.replace(',', ".");
    let mut parts = rest.split('.');
    let units_str = parts.next().ok_or_else(invalid)?;
    let frac_str = parts.next();

    if parts.next().is_some() {
        return Err(invalid());
    }

    if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let units: i64 = units_str.parse().map_err(|_| invalid())?;

    let hundredths: i64 = match frac_str {
        None => 0,
        Some("") => 0,
        Some(frac) => {
            if !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            match frac.len() {
                0 => 0,
                1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                2 => frac.parse::<i64>().map_err(|_| invalid())?,
                _ => return Err(EngineError::Validation("too many decimals".to_string())),
            }
        }
    };

    let total = units
        .checked_mul(100)
        .and_then(|v| v.checked_add(hundredths))
        .ok_or_else(overflow)?;

    if sign < 0 {
        total.checked_neg().ok_or_else(overflow)
    } else {
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_two_places() {
        assert_eq!(MoneyCents::new(0).to_string(), "0.00");
        assert_eq!(MoneyCents::new(1).to_string(), "0.01");
        assert_eq!(MoneyCents::new(10).to_string(), "0.10");
        assert_eq!(MoneyCents::new(1050).to_string(), "10.50");
        assert_eq!(MoneyCents::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<MoneyCents>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<MoneyCents>().unwrap().cents(), 1050);
        assert_eq!("10,50".parse::<MoneyCents>().unwrap().cents(), 1050);
        assert_eq!("-0.01".parse::<MoneyCents>().unwrap().cents(), -1);
        assert_eq!("+1.00".parse::<MoneyCents>().unwrap().cents(), 100);
        assert_eq!("  2.30 ".parse::<MoneyCents>().unwrap().cents(), 230);
    }

    #[test]
    fn parse_rejects_more_than_two_decimals() {
        assert!("12.345".parse::<MoneyCents>().is_err());
        assert!("0.001".parse::<MoneyCents>().is_err());
    }

    #[test]
    fn percent_rounds_once_half_up() {
        // 12.5% of 10.01 = 1.25125 -> 1.25
        let pct = Percent::new(1250);
        assert_eq!(pct.of(MoneyCents::new(1001)).cents(), 125);
        // 10% of 0.05 = 0.005 -> 0.01 (half away from zero)
        assert_eq!(Percent::new(1000).of(MoneyCents::new(5)).cents(), 1);
        // same magnitude on the negative side
        assert_eq!(Percent::new(1000).of(MoneyCents::new(-5)).cents(), -1);
    }

    #[test]
    fn dozen_price_derives_unit_price() {
        // 25.00 a dozen -> 2.08 a unit (2.08333 rounded once)
        assert_eq!(MoneyCents::new(2500).div_round(12).cents(), 208);
        // 24.00 a dozen divides exactly
        assert_eq!(MoneyCents::new(2400).div_round(12).cents(), 200);
    }

    #[test]
    fn adjustment_amounts() {
        let base = MoneyCents::new(10_000);
        assert_eq!(
            Adjustment::Percent(Percent::new(500)).amount_on(base).cents(),
            500
        );
        assert_eq!(
            Adjustment::Absolute(MoneyCents::new(999)).amount_on(base).cents(),
            999
        );
        assert_eq!(Adjustment::NONE.amount_on(base), MoneyCents::ZERO);
    }
}
