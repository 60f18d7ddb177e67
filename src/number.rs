//! Exact decimal numbers, and the printed formats they were read from.
//!
//! Filenames carry numbers as text: `001.10` and `1.1` are the same value but not the same name.
//! [`infer_format`] remembers how a literal was written, [`format_number`] writes a new value the same way.

use std::{fmt, ops::Neg, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::error::{Error, Result};

/// Leading `digits.digits` of a literal (sign skipped). Every part is optional, so it always matches.
static FORMAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?([0-9]*)\.?([0-9]*)").expect("valid, static regex"));

/// Digit widths of a numeric literal's integer and fractional parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NumberFormat {
    pub integer_width:    usize,
    pub fractional_width: usize,
}

impl NumberFormat {
    pub const fn new(integer_width: usize, fractional_width: usize) -> Self {
        Self { integer_width, fractional_width }
    }
}

/// Read the format of a literal from its printed form.
///
/// Never fails: text that doesn't start like a number yields `(0, 0)`.
///
/// ```
/// use numincrement::number::{infer_format, NumberFormat};
/// assert_eq!(infer_format("001.10"), NumberFormat::new(3, 2));
/// assert_eq!(infer_format("abc"), NumberFormat::new(0, 0));
/// ```
pub fn infer_format(literal: &str) -> NumberFormat {
    let Some(caps) = FORMAT_RE.captures(literal) else {
        return NumberFormat::default();
    };
    let width = |i| caps.get(i).map_or(0, |m| m.as_str().len());
    NumberFormat::new(width(1), width(2))
}

/// Render `value` using `format`.
///
/// - integer digits are zero padded up to `integer_width`, never truncated
/// - fractional digits are the fewest needed, zero padded on the right up to `fractional_width`
/// - integral values get no decimal point at all
/// - a minus sign sits in front of the padding and doesn't count toward it
pub fn format_number(format: NumberFormat, value: Number) -> String {
    let scale = value.scale as usize;
    // at least one digit left of the point
    let digits = format!("{:0>width$}", value.units.unsigned_abs(), width = scale + 1);
    let (int_part, frac_part) = digits.split_at(digits.len() - scale);

    let sign = if value.is_negative() { "-" } else { "" };
    let mut out = format!("{sign}{int_part:0>width$}", width = format.integer_width);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(&format!("{frac_part:0<width$}", width = format.fractional_width));
    }
    out
}

/// Signed decimal, exact: `units / 10^scale`.
///
/// Kept normalized (no trailing fractional zeros), so derived equality is value equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Number {
    units: i128,
    scale: u32,
}

impl Number {
    pub const ZERO: Number = Number { units: 0, scale: 0 };
    pub const ONE: Number = Number { units: 1, scale: 0 };

    fn normalized(mut units: i128, mut scale: u32) -> Self {
        while scale > 0 && units % 10 == 0 {
            units /= 10;
            scale -= 1;
        }
        Self { units, scale }
    }

    pub fn is_zero(self) -> bool {
        self.units == 0
    }

    pub fn is_negative(self) -> bool {
        self.units < 0
    }

    pub fn is_integral(self) -> bool {
        self.scale == 0
    }

    pub fn abs(self) -> Self {
        Self { units: self.units.saturating_abs(), ..self }
    }

    /// Exact sum; `None` if it doesn't fit.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        let scale = self.scale.max(other.scale);
        let lhs = self.units.checked_mul(10_i128.checked_pow(scale - self.scale)?)?;
        let rhs = other.units.checked_mul(10_i128.checked_pow(scale - other.scale)?)?;
        Some(Self::normalized(lhs.checked_add(rhs)?, scale))
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Self { units: i128::from(n), scale: 0 }
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Self::Output {
        Self { units: self.units.saturating_neg(), ..self }
    }
}

/// Accepts an optional sign, ASCII digits, and at most one `.`; at least one digit overall.
impl FromStr for Number {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let non_numeric = || Error::NonNumeric { text: s.to_owned() };
        let overflow = || Error::Overflow { text: s.to_owned() };

        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_digits, frac_digits) = body.split_once('.').unwrap_or((body, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_digits.is_empty() && frac_digits.is_empty()) || !all_digits(int_digits) || !all_digits(frac_digits) {
            return Err(non_numeric());
        }

        let frac_digits = frac_digits.trim_end_matches('0');
        let scale = u32::try_from(frac_digits.len()).map_err(|_| overflow())?;
        let mut units: i128 = 0;
        for b in int_digits.bytes().chain(frac_digits.bytes()) {
            units = units.checked_mul(10)
                         .and_then(|u| u.checked_add(i128::from(b - b'0')))
                         .ok_or_else(overflow)?;
        }
        if negative {
            units = -units;
        }
        Ok(Self::normalized(units, scale))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_number(NumberFormat::default(), *self))
    }
}
