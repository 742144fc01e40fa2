//! Exact rational arithmetic for rates and quantities
//!
//! Every rate in the calculator is a [`Rational`]: an arbitrary-precision
//! fraction kept in lowest terms. Equality and ordering are exact.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use std::str::FromStr;
use std::sync::LazyLock;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};
use regex::Regex;

/// Denominator used by [`Rational::from_float`].
pub const FLOAT_RESOLUTION: i64 = 100_000;

// Scaled remainders that `from_float` reads as exact thirds.
const ONE_THIRD_SCALED: i64 = 33_333;
const TWO_THIRDS_SCALED: i64 = 66_667;

// Accepts "3", "-3", "1.25", ".5", "-7/2".
static RATIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-)?(?:(\d+)/(\d+)|(\d*)\.(\d+)|(\d+))$").expect("rational pattern is valid")
});

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RationalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("cannot represent {0} as a rational")]
    NotFinite(f64),
    #[error("invalid rational: {0:?}")]
    Parse(String),
}

/// An exact fraction in lowest terms.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rational(BigRational);

impl Rational {
    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn one() -> Self {
        Self(BigRational::one())
    }

    pub fn from_integer(n: i64) -> Self {
        Self(BigRational::from_integer(BigInt::from(n)))
    }

    /// Build `numer / denom`, reduced to lowest terms.
    pub fn new(numer: i64, denom: i64) -> Result<Self, RationalError> {
        if denom == 0 {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Self(BigRational::new(BigInt::from(numer), BigInt::from(denom))))
    }

    /// Convert a float at a fixed resolution of 1/[`FLOAT_RESOLUTION`].
    ///
    /// The magnitude is scaled and rounded half away from zero, so `0.1`
    /// becomes exactly `1/10`. Fractional parts that land on `.33333` or
    /// `.66667` are read as exact thirds, since data files commonly write
    /// `1/3` as a truncated decimal.
    pub fn from_float(x: f64) -> Result<Self, RationalError> {
        if !x.is_finite() {
            return Err(RationalError::NotFinite(x));
        }
        let scaled = (x.abs() * FLOAT_RESOLUTION as f64).round();
        let scaled = BigInt::from_f64(scaled).ok_or(RationalError::NotFinite(x))?;
        let resolution = BigInt::from(FLOAT_RESOLUTION);
        let (whole, rem) = scaled.div_rem(&resolution);
        let frac = match rem.to_i64() {
            Some(ONE_THIRD_SCALED) => BigRational::new(BigInt::one(), BigInt::from(3)),
            Some(TWO_THIRDS_SCALED) => BigRational::new(BigInt::from(2), BigInt::from(3)),
            _ => BigRational::new(rem, resolution),
        };
        let magnitude = BigRational::from_integer(whole) + frac;
        Ok(Self(if x < 0.0 { -magnitude } else { magnitude }))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn less(&self, other: &Rational) -> bool {
        self < other
    }

    /// Exact division. Dividing by zero is an error, never an infinity.
    pub fn checked_div(&self, other: &Rational) -> Result<Rational, RationalError> {
        if other.is_zero() {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Self(&self.0 / &other.0))
    }

    pub fn reciprocate(&self) -> Result<Rational, RationalError> {
        Self::one().checked_div(self)
    }

    /// Largest integer not greater than `self` (rounds toward negative infinity).
    pub fn floor(&self) -> Rational {
        Self(self.0.floor())
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    /// Render with at most `precision` fractional digits, trailing zeros dropped.
    ///
    /// Rounds half away from zero. A value that rounds to zero is printed
    /// without a sign.
    pub fn to_decimal(&self, precision: usize) -> String {
        let (int_part, frac_part) = self.decimal_parts(precision);
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            int_part
        } else {
            format!("{int_part}.{frac_part}")
        }
    }

    /// Render with exactly `precision` fractional digits.
    pub fn to_fixed(&self, precision: usize) -> String {
        let (int_part, frac_part) = self.decimal_parts(precision);
        if precision == 0 {
            int_part
        } else {
            format!("{int_part}.{frac_part}")
        }
    }

    fn decimal_parts(&self, precision: usize) -> (String, String) {
        let scale = num_traits::pow(BigInt::from(10), precision);
        let half = BigRational::new(BigInt::one(), BigInt::from(2));
        let scaled = self.0.abs() * BigRational::from_integer(scale) + half;
        let digits = scaled.floor().to_integer();
        let negative = self.is_negative() && !digits.is_zero();

        let mut text = digits.to_string();
        if text.len() <= precision {
            text = format!("{}{}", "0".repeat(precision + 1 - text.len()), text);
        }
        let frac_part = text.split_off(text.len() - precision);
        if negative {
            text.insert(0, '-');
        }
        (text, frac_part)
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for Rational {
    type Err = RationalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RATIONAL_RE
            .captures(s.trim())
            .ok_or_else(|| RationalError::Parse(s.to_string()))?;
        let parse_int = |text: &str| -> Result<BigInt, RationalError> {
            if text.is_empty() {
                return Ok(BigInt::zero());
            }
            text.parse::<BigInt>()
                .map_err(|_| RationalError::Parse(s.to_string()))
        };

        let magnitude = if let (Some(numer), Some(denom)) = (caps.get(2), caps.get(3)) {
            let denom = parse_int(denom.as_str())?;
            if denom.is_zero() {
                return Err(RationalError::DivisionByZero);
            }
            BigRational::new(parse_int(numer.as_str())?, denom)
        } else if let Some(frac) = caps.get(5) {
            let whole = parse_int(caps.get(4).map_or("", |m| m.as_str()))?;
            let scale = num_traits::pow(BigInt::from(10), frac.as_str().len());
            BigRational::new(whole * &scale + parse_int(frac.as_str())?, scale)
        } else {
            let whole = caps.get(6).map_or("", |m| m.as_str());
            BigRational::from_integer(parse_int(whole)?)
        };

        Ok(Self(if caps.get(1).is_some() {
            -magnitude
        } else {
            magnitude
        }))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rational({})", self.0)
    }
}

impl Add<&Rational> for &Rational {
    type Output = Rational;

    fn add(self, rhs: &Rational) -> Rational {
        Rational(&self.0 + &rhs.0)
    }
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Rational {
        Rational(self.0 + rhs.0)
    }
}

impl AddAssign<&Rational> for Rational {
    fn add_assign(&mut self, rhs: &Rational) {
        self.0 += &rhs.0;
    }
}

impl Sub<&Rational> for &Rational {
    type Output = Rational;

    fn sub(self, rhs: &Rational) -> Rational {
        Rational(&self.0 - &rhs.0)
    }
}

impl Sub for Rational {
    type Output = Rational;

    fn sub(self, rhs: Rational) -> Rational {
        Rational(self.0 - rhs.0)
    }
}

impl Mul<&Rational> for &Rational {
    type Output = Rational;

    fn mul(self, rhs: &Rational) -> Rational {
        Rational(&self.0 * &rhs.0)
    }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Rational) -> Rational {
        Rational(self.0 * rhs.0)
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational(-&self.0)
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational(-self.0)
    }
}

impl PartialEq<i64> for Rational {
    fn eq(&self, other: &i64) -> bool {
        self.0 == BigRational::from_integer(BigInt::from(*other))
    }
}

impl PartialOrd<i64> for Rational {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        self.0.partial_cmp(&BigRational::from_integer(BigInt::from(*other)))
    }
}
