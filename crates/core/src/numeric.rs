//! Exact fixed-point arithmetic for ledger quantities.
//!
//! The SCD contracts keep amounts as scaled integers: `Wad` values carry 18
//! decimals, `Ray` values (ratios and prices) carry 27. All keeper math stays
//! in these scales end to end. Multiplication divides one scale factor back
//! out, division multiplies it back in, and a zero divisor is a checked
//! error rather than a silently wrong number. No floating point anywhere in
//! the decision path; `f64` renderings exist only for logs.

use alloy::primitives::U256;
use std::fmt;
use thiserror::Error;

/// WAD scale: 1e18.
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000u64, 0, 0, 0]);

/// RAY scale: 1e27.
pub const RAY: U256 = U256::from_limbs([11_515_845_246_265_065_472u64, 54_210_108u64, 0, 0]);

/// Scale gap between Ray and Wad: 1e9.
const WAD_TO_RAY: U256 = U256::from_limbs([1_000_000_000u64, 0, 0, 0]);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumericError {
    #[error("division by zero in fixed-point arithmetic")]
    DivisionByZero,
}

/// An 18-decimal fixed-point amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Wad(pub U256);

/// A 27-decimal fixed-point ratio or price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Ray(pub U256);

impl Wad {
    pub const ZERO: Wad = Wad(U256::ZERO);

    /// `n` whole units, i.e. `n * 1e18`.
    pub fn from_int(n: u64) -> Self {
        Wad(U256::from(n) * WAD)
    }

    /// Raw scaled integer, as read from a contract.
    pub fn from_raw(raw: U256) -> Self {
        Wad(raw)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whole-unit part, fraction discarded.
    pub fn to_int_floor(&self) -> U256 {
        self.0 / WAD
    }
}

impl Ray {
    pub const ZERO: Ray = Ray(U256::ZERO);

    /// One, i.e. `1e27`.
    pub const ONE: Ray = Ray(RAY);

    /// `n` whole units, i.e. `n * 1e27`.
    pub fn from_int(n: u64) -> Self {
        Ray(U256::from(n) * RAY)
    }

    /// Raw scaled integer, as read from a contract.
    pub fn from_raw(raw: U256) -> Self {
        Ray(raw)
    }

    /// Lift a Wad to Ray precision (exact, multiplies by 1e9).
    pub fn from_wad(w: Wad) -> Self {
        Ray(w.0 * WAD_TO_RAY)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whole-unit part, fraction discarded.
    pub fn to_int_floor(&self) -> U256 {
        self.0 / RAY
    }

    /// Fixed-point multiply: `(self * rhs) / 1e27`, truncating.
    pub fn rmul(self, rhs: Ray) -> Ray {
        Ray(self.0 * rhs.0 / RAY)
    }

    /// Fixed-point divide: `(self * 1e27) / rhs`, truncating.
    ///
    /// A zero divisor is a precondition violation, surfaced as an error.
    pub fn rdiv(self, rhs: Ray) -> Result<Ray, NumericError> {
        if rhs.0.is_zero() {
            return Err(NumericError::DivisionByZero);
        }
        Ok(Ray(self.0 * RAY / rhs.0))
    }
}

fn fmt_scaled(f: &mut fmt::Formatter<'_>, raw: U256, scale: U256, places: usize) -> fmt::Result {
    let whole = raw / scale;
    let frac = (raw % scale).to_string();
    write!(f, "{}.{:0>width$}", whole, frac, width = places)
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_scaled(f, self.0, WAD, 18)
    }
}

impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_scaled(f, self.0, RAY, 27)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_constants() {
        assert_eq!(WAD, U256::from(10u64).pow(U256::from(18)));
        assert_eq!(RAY, U256::from(10u64).pow(U256::from(27)));
    }

    #[test]
    fn test_int_round_trip() {
        for n in [0u64, 1, 42, 1000, u32::MAX as u64] {
            assert_eq!(Wad::from_int(n).to_int_floor(), U256::from(n));
            assert_eq!(Ray::from_int(n).to_int_floor(), U256::from(n));
        }
    }

    #[test]
    fn test_wad_to_ray_is_exact() {
        let rue = Ray::from_wad(Wad::from_int(1000));
        assert_eq!(rue, Ray::from_int(1000));
        // Sub-unit amounts survive the lift too
        let half = Wad(WAD / U256::from(2));
        assert_eq!(Ray::from_wad(half), Ray(RAY / U256::from(2)));
    }

    #[test]
    fn test_rmul_truncates_toward_zero() {
        let one = Ray::ONE;
        assert_eq!(one.rmul(one), one);

        let third = Ray(RAY / U256::from(3));
        let product = third.rmul(Ray::from_int(3));
        // 0.333...3 * 3 = 0.999...9, one ulp below one
        assert_eq!(product, Ray(RAY - U256::from(1)));
    }

    #[test]
    fn test_rdiv_exact_quotient() {
        let ten = Ray::from_int(10);
        let four = Ray::from_int(4);
        let q = ten.rdiv(four).unwrap();
        assert_eq!(q, Ray(RAY * U256::from(5) / U256::from(2)));
    }

    #[test]
    fn test_rdiv_by_zero_is_error() {
        assert_eq!(
            Ray::from_int(1).rdiv(Ray::ZERO),
            Err(NumericError::DivisionByZero)
        );
    }

    #[test]
    fn test_rdiv_is_deterministic() {
        let a = Ray::from_wad(Wad::from_int(1000));
        let b = Ray(RAY * U256::from(6) / U256::from(10));
        assert_eq!(a.rdiv(b).unwrap(), a.rdiv(b).unwrap());
    }

    #[test]
    fn test_display_full_precision() {
        assert_eq!(Wad::from_int(4).to_string(), "4.000000000000000000");
        assert_eq!(
            Ray(RAY + U256::from(1)).to_string(),
            "1.000000000000000000000000001"
        );
        assert_eq!(Wad(U256::from(1)).to_string(), "0.000000000000000001");
    }
}
