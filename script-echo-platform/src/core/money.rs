//! Fixed-Point Currency Arithmetic
//!
//! Settlement math runs on integers only. Currency amounts are stored as
//! `i64` scaled by 10^4 and percentages as basis points, so a split never
//! drifts the way binary floats do. Arithmetic saturates at the `i64`
//! range instead of wrapping; the `checked_*` constructors report it.
//!
//! ## Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Money:   raw i64, 4 fractional decimal digits              │
//! │           12.5 units  -> raw 125_000                        │
//! │                                                             │
//! │  Percent: basis points, 10_000 = 100%                       │
//! │           20%          -> 2_000 bps                         │
//! │                                                             │
//! │  share = raw * bps / 10_000   (i128 intermediate, trunc)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

/// Number of fractional decimal digits in [`Money`].
pub const MONEY_DECIMALS: u32 = 4;

/// 1.0 currency unit in raw representation (10_000).
pub const MONEY_SCALE: i64 = 10_i64.pow(MONEY_DECIMALS);

/// Basis points in 100%.
pub const BPS_PER_WHOLE: u32 = 10_000;

// =============================================================================
// MONEY
// =============================================================================

/// Currency amount with exact decimal semantics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(0);

    /// Create from raw scaled value.
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Largest representable amount.
    pub const MAX: Money = Money(i64::MAX);

    /// Create from whole units, saturating at the representable range.
    #[inline]
    pub const fn from_int(units: i64) -> Self {
        Self(units.saturating_mul(MONEY_SCALE))
    }

    /// Create from whole units, `None` if out of range.
    #[inline]
    pub const fn checked_from_int(units: i64) -> Option<Self> {
        match units.checked_mul(MONEY_SCALE) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Create from hundredths (cents / fen), saturating.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor.saturating_mul(MONEY_SCALE / 100))
    }

    /// Raw scaled value.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Whole-unit part, truncated toward zero.
    #[inline]
    pub const fn whole(self) -> i64 {
        self.0 / MONEY_SCALE
    }

    /// Multiply by a count, `None` on overflow.
    #[inline]
    pub fn checked_mul(self, count: u32) -> Option<Money> {
        self.0.checked_mul(count as i64).map(Money)
    }

    /// Take a percentage of this amount.
    ///
    /// Uses an i128 intermediate so large pools cannot overflow; the result
    /// is truncated toward zero at the fourth decimal.
    pub fn percent_of(self, pct: Percent) -> Money {
        let scaled = self.0 as i128 * pct.bps() as i128 / BPS_PER_WHOLE as i128;
        Money(scaled as i64)
    }
}

impl Add for Money {
    type Output = Money;
    #[inline]
    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;
    #[inline]
    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;
    #[inline]
    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Mul<u32> for Money {
    type Output = Money;
    #[inline]
    fn mul(self, rhs: u32) -> Money {
        Money(self.0.saturating_mul(rhs as i64))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = MONEY_SCALE as u64;
        write!(f, "{}{}.{:04}", sign, abs / scale, abs % scale)
    }
}

// =============================================================================
// PERCENT
// =============================================================================

/// Percentage stored in basis points (1/100 of a percent).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(u32);

impl Percent {
    /// 0%.
    pub const ZERO: Percent = Percent(0);

    /// 100%.
    pub const HUNDRED: Percent = Percent(BPS_PER_WHOLE);

    /// Create from whole percent (20 -> 20%), saturating.
    #[inline]
    pub const fn from_whole(pct: u32) -> Self {
        Self(pct.saturating_mul(100))
    }

    /// Create from whole percent, `None` above 100%.
    #[inline]
    pub const fn checked_from_whole(pct: u32) -> Option<Self> {
        if pct <= 100 {
            Some(Self(pct * 100))
        } else {
            None
        }
    }

    /// Create from basis points (2_050 -> 20.5%).
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Self(bps)
    }

    /// Basis points.
    #[inline]
    pub const fn bps(self) -> u32 {
        self.0
    }

    /// Checked sum, `None` past 100%.
    pub fn checked_add(self, rhs: Percent) -> Option<Percent> {
        let total = self.0.checked_add(rhs.0)?;
        (total <= BPS_PER_WHOLE).then_some(Percent(total))
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// TESTS
// =============================================================================
