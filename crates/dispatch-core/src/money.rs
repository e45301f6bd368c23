// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Exact monetary amounts.
//!
//! Costs arrive as JSON numbers or strings like `"1 250,50"`. They are held as
//! integer minor units (hundredths) so dashboard sums never drift.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

const MINOR_PER_UNIT: i64 = 100;
const FRACTION_DIGITS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub fn minor(&self) -> i64 {
        self.0
    }

    /// Parse-with-default used at ingestion: anything that is not a number or
    /// a numeric string is zero.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_i64()
                .and_then(|units| units.checked_mul(MINOR_PER_UNIT))
                .map(Money)
                .or_else(|| n.as_f64().and_then(from_float))
                .unwrap_or_default(),
            Value::String(s) => s.parse().unwrap_or_default(),
            _ => Money::ZERO,
        }
    }
}

fn from_float(value: f64) -> Option<Money> {
    let minor = (value * MINOR_PER_UNIT as f64).round();
    if minor.is_finite() && minor.abs() < i64::MAX as f64 {
        Some(Money(minor as i64))
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMoneyError;

impl fmt::Display for ParseMoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("not a monetary amount")
    }
}

impl std::error::Error for ParseMoneyError {}

impl FromStr for Money {
    type Err = ParseMoneyError;

    /// Accepts `1500`, `1200.50`, `-3.5` and `1 250,50`. Digits past the
    /// second decimal round half away from zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();

        let (negative, body) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
        };
        let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() && fraction.is_empty() {
            return Err(ParseMoneyError);
        }
        if !all_digits(whole) || !all_digits(fraction) {
            return Err(ParseMoneyError);
        }

        let mut minor: i64 = 0;
        for c in whole.chars() {
            minor = minor
                .checked_mul(10)
                .and_then(|m| m.checked_add(digit(c)))
                .ok_or(ParseMoneyError)?;
        }
        minor = minor.checked_mul(MINOR_PER_UNIT).ok_or(ParseMoneyError)?;

        let mut cents = 0;
        let mut fraction_digits = fraction.chars();
        for scale in [10, 1] {
            cents += fraction_digits.next().map_or(0, digit) * scale;
        }
        if fraction_digits.next().is_some_and(|c| digit(c) >= 5) {
            cents += 1;
        }
        minor = minor.checked_add(cents).ok_or(ParseMoneyError)?;

        Ok(Money(if negative { -minor } else { minor }))
    }
}

fn digit(c: char) -> i64 {
    c.to_digit(10).map_or(0, i64::from)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_unit = MINOR_PER_UNIT as u64;
        let text = format!(
            "{}{}.{:0width$}",
            sign,
            abs / per_unit,
            abs % per_unit,
            width = FRACTION_DIGITS
        );
        f.pad(&text)
    }
}

/// Serialized as a decimal string so JSON consumers see the exact value.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}
