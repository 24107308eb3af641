//! Exact rational arithmetic for Aggregate Network Value.
//!
//! The original chain stores ANV internally as a `boost::rational<int128_t>`
//! so that repeated halving as a delta bubbles up the referral tree never
//! loses precision. `num_rational::BigRational` (arbitrary-precision
//! numerator/denominator over `num_bigint::BigInt`) is a safe superset of
//! that guarantee and is kept in reduced form automatically, matching the
//! original's `assert(anv_in.first >= 0); assert(anv_in.second > 0)`
//! invariant on every write.

use std::ops::{Add, AddAssign, Div, Neg};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An exact, always-reduced rational Aggregate Network Value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Anv(BigRational);

impl Anv {
    pub fn zero() -> Self {
        Self(BigRational::from_integer(BigInt::zero()))
    }

    pub fn from_amount(amount: i64) -> Self {
        Self(BigRational::from_integer(BigInt::from(amount)))
    }

    /// Truncating integer projection, matching `boost::rational_cast<CAmount>`.
    pub fn to_amount(&self) -> i64 {
        self.0
            .to_integer()
            .to_i64()
            .expect("ANV magnitude fits in i64 for any realistic supply")
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Halve in place, the operation applied once per hop while a delta
    /// bubbles up the referral tree.
    pub fn halved(&self) -> Self {
        Self(&self.0 / BigInt::from(2))
    }

    pub fn numerator(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denominator(&self) -> &BigInt {
        self.0.denom()
    }
}

impl Default for Anv {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Anv {
    type Output = Anv;
    fn add(self, rhs: Anv) -> Anv {
        Anv(self.0 + rhs.0)
    }
}

impl AddAssign for Anv {
    fn add_assign(&mut self, rhs: Anv) {
        self.0 += rhs.0;
    }
}

impl Neg for Anv {
    type Output = Anv;
    fn neg(self) -> Anv {
        Anv(-self.0)
    }
}

impl Div<i64> for Anv {
    type Output = Anv;
    fn div(self, rhs: i64) -> Anv {
        Anv(self.0 / BigInt::from(rhs))
    }
}

impl From<i64> for Anv {
    fn from(v: i64) -> Self {
        Self::from_amount(v)
    }
}

impl Serialize for Anv {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Canonical reduced form, always emitted as a numerator/denominator pair.
        (self.numerator().to_string(), self.denominator().to_string()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Anv {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (num, den): (String, String) = Deserialize::deserialize(deserializer)?;
        let num: BigInt = num.parse().map_err(serde::de::Error::custom)?;
        let den: BigInt = den.parse().map_err(serde::de::Error::custom)?;
        Ok(Anv(BigRational::new(num, den)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halving_preserves_exactness_over_many_hops() {
        let mut anv = Anv::from_amount(100);
        for _ in 0..40 {
            anv = anv.halved();
        }
        // 100 / 2^40 should still be exact, not rounded to zero.
        assert!(!anv.is_zero());
    }

    #[test]
    fn addition_then_truncation_matches_integer_semantics() {
        let a = Anv::from_amount(7);
        let b = Anv::from_amount(3);
        assert_eq!((a + b).to_amount(), 10);
    }

    #[test]
    fn negated_delta_rolls_back_exactly() {
        let original = Anv::from_amount(500);
        let delta = Anv::from_amount(42);
        let applied = original.clone() + delta.clone();
        let rolled_back = applied + (-delta);
        assert_eq!(rolled_back, original);
    }
}
