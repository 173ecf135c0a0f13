//! Element types: `f32`, `f64`, `Complex32`, `Complex64`, `f16`, `bf16`.

use crate::logging::LogValue;
use half::{bf16, f16};
use num_complex::{Complex32, Complex64};
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Classification of a single value, used by numerics checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classify {
    pub nan: bool,
    pub inf: bool,
    pub zero: bool,
    pub denorm: bool,
}

/// Element type of a BLAS routine.
pub trait Scalar:
    Copy
    + Debug
    + Default
    + PartialEq
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + LogValue
{
    /// Real type of the same precision.
    type Real: RealScalar;

    /// Routine-name prefix (`s`, `d`, `c`, `z`, `h`, `bf`).
    const PREFIX: &'static str;
    /// Prefix of real-valued reductions over this type (`scnrm2`, `dznrm2`).
    const NORM_PREFIX: &'static str;
    /// Precision string of the bench command line.
    const PRECISION: &'static str;
    const IS_COMPLEX: bool;

    fn zero() -> Self;
    fn one() -> Self;
    fn from_parts(re: f64, im: f64) -> Self;
    fn from_real(re: Self::Real) -> Self;
    fn real(self) -> Self::Real;
    fn imag(self) -> Self::Real;
    fn conj(self) -> Self;
    /// `|x|^2`
    fn abs_sq(self) -> Self::Real;
    fn classify(self) -> Classify;

    #[inline]
    fn from_f64(v: f64) -> Self {
        Self::from_parts(v, 0.0)
    }

    #[inline]
    fn is_zero(self) -> bool {
        self == Self::zero()
    }

    #[inline]
    fn is_one(self) -> bool {
        self == Self::one()
    }

    /// `|x|` (complex modulus for complex types).
    #[inline]
    fn abs(self) -> Self::Real {
        self.abs_sq().sqrt()
    }

    #[inline]
    fn to_f64_parts(self) -> (f64, f64) {
        (self.real().to_f64(), self.imag().to_f64())
    }

    /// `self * conj(rhs)` when `conj` is set, `self * rhs` otherwise.
    #[inline]
    fn mul_maybe_conj(self, rhs: Self, conj: bool) -> Self {
        if conj {
            self * rhs.conj()
        } else {
            self * rhs
        }
    }
}

/// Real element type.
pub trait RealScalar: Scalar<Real = Self> + PartialOrd {
    /// Decimal digits of precision.
    const DIGITS10: i32;

    fn sqrt(self) -> Self;
    fn to_f64(self) -> f64;
    fn epsilon() -> f64;
}

/// Maps an element type to the type reductions accumulate in.
pub trait Accumulate: Scalar {
    type Compute: Scalar;

    fn widen(self) -> Self::Compute;
    fn narrow(c: Self::Compute) -> Self;
}

fn classify_pair(re: Classify, im: Classify) -> Classify {
    Classify {
        nan: re.nan || im.nan,
        inf: re.inf || im.inf,
        zero: re.zero && im.zero,
        denorm: re.denorm || im.denorm,
    }
}

macro_rules! impl_real {
    ($t:ty, $prefix:literal, $precision:literal, $digits:expr, $eps:expr) => {
        impl Scalar for $t {
            type Real = $t;
            const PREFIX: &'static str = $prefix;
            const NORM_PREFIX: &'static str = $prefix;
            const PRECISION: &'static str = $precision;
            const IS_COMPLEX: bool = false;

            #[inline]
            fn zero() -> Self {
                0.0
            }
            #[inline]
            fn one() -> Self {
                1.0
            }
            #[inline]
            fn from_parts(re: f64, _im: f64) -> Self {
                re as $t
            }
            #[inline]
            fn from_real(re: $t) -> Self {
                re
            }
            #[inline]
            fn real(self) -> $t {
                self
            }
            #[inline]
            fn imag(self) -> $t {
                0.0
            }
            #[inline]
            fn conj(self) -> Self {
                self
            }
            #[inline]
            fn abs_sq(self) -> $t {
                self * self
            }
            #[inline]
            fn abs(self) -> $t {
                <$t>::abs(self)
            }
            fn classify(self) -> Classify {
                Classify {
                    nan: self.is_nan(),
                    inf: self.is_infinite(),
                    zero: self == 0.0,
                    denorm: self.is_subnormal(),
                }
            }
        }

        impl RealScalar for $t {
            const DIGITS10: i32 = $digits;

            #[inline]
            fn sqrt(self) -> Self {
                <$t>::sqrt(self)
            }
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
            #[inline]
            fn epsilon() -> f64 {
                $eps
            }
        }

        impl Accumulate for $t {
            type Compute = $t;
            #[inline]
            fn widen(self) -> $t {
                self
            }
            #[inline]
            fn narrow(c: $t) -> Self {
                c
            }
        }
    };
}

impl_real!(f32, "s", "f32_r", 6, f32::EPSILON as f64);
impl_real!(f64, "d", "f64_r", 15, f64::EPSILON);

macro_rules! impl_complex {
    ($t:ty, $r:ty, $prefix:literal, $norm:literal, $precision:literal) => {
        impl Scalar for $t {
            type Real = $r;
            const PREFIX: &'static str = $prefix;
            const NORM_PREFIX: &'static str = $norm;
            const PRECISION: &'static str = $precision;
            const IS_COMPLEX: bool = true;

            #[inline]
            fn zero() -> Self {
                <$t>::new(0.0, 0.0)
            }
            #[inline]
            fn one() -> Self {
                <$t>::new(1.0, 0.0)
            }
            #[inline]
            fn from_parts(re: f64, im: f64) -> Self {
                <$t>::new(re as $r, im as $r)
            }
            #[inline]
            fn from_real(re: $r) -> Self {
                <$t>::new(re, 0.0)
            }
            #[inline]
            fn real(self) -> $r {
                self.re
            }
            #[inline]
            fn imag(self) -> $r {
                self.im
            }
            #[inline]
            fn conj(self) -> Self {
                <$t>::new(self.re, -self.im)
            }
            #[inline]
            fn abs_sq(self) -> $r {
                self.re * self.re + self.im * self.im
            }
            fn classify(self) -> Classify {
                classify_pair(Scalar::classify(self.re), Scalar::classify(self.im))
            }
        }

        impl Accumulate for $t {
            type Compute = $t;
            #[inline]
            fn widen(self) -> $t {
                self
            }
            #[inline]
            fn narrow(c: $t) -> Self {
                c
            }
        }
    };
}

impl_complex!(Complex32, f32, "c", "sc", "f32_c");
impl_complex!(Complex64, f64, "z", "dz", "f64_c");

macro_rules! impl_half {
    ($t:ty, $prefix:literal, $precision:literal, $digits:expr) => {
        impl Scalar for $t {
            type Real = $t;
            const PREFIX: &'static str = $prefix;
            const NORM_PREFIX: &'static str = $prefix;
            const PRECISION: &'static str = $precision;
            const IS_COMPLEX: bool = false;

            #[inline]
            fn zero() -> Self {
                <$t>::ZERO
            }
            #[inline]
            fn one() -> Self {
                <$t>::ONE
            }
            #[inline]
            fn from_parts(re: f64, _im: f64) -> Self {
                <$t>::from_f64(re)
            }
            #[inline]
            fn from_real(re: $t) -> Self {
                re
            }
            #[inline]
            fn real(self) -> $t {
                self
            }
            #[inline]
            fn imag(self) -> $t {
                <$t>::ZERO
            }
            #[inline]
            fn conj(self) -> Self {
                self
            }
            #[inline]
            fn abs_sq(self) -> $t {
                self * self
            }
            fn classify(self) -> Classify {
                Classify {
                    nan: self.is_nan(),
                    inf: self.is_infinite(),
                    zero: self.to_f32() == 0.0,
                    denorm: !self.is_normal()
                        && self.is_finite()
                        && self.to_f32() != 0.0,
                }
            }
        }

        impl RealScalar for $t {
            const DIGITS10: i32 = $digits;

            #[inline]
            fn sqrt(self) -> Self {
                <$t>::from_f32(self.to_f32().sqrt())
            }
            #[inline]
            fn to_f64(self) -> f64 {
                <$t>::to_f64(self)
            }
            #[inline]
            fn epsilon() -> f64 {
                <$t>::EPSILON.to_f64()
            }
        }

        impl Accumulate for $t {
            type Compute = f32;
            #[inline]
            fn widen(self) -> f32 {
                self.to_f32()
            }
            #[inline]
            fn narrow(c: f32) -> Self {
                <$t>::from_f32(c)
            }
        }
    };
}

impl_half!(f16, "h", "f16_r", 3);
impl_half!(bf16, "bf", "bf16_r", 2);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complex_conj_and_abs() {
        let z = Complex64::new(3.0, -4.0);
        assert_eq!(z.conj(), Complex64::new(3.0, 4.0));
        assert_eq!(z.abs_sq(), 25.0);
        assert_eq!(Scalar::abs(z), 5.0);
        assert_eq!(
            Complex32::new(1.0, 2.0).mul_maybe_conj(Complex32::new(0.0, 1.0), true),
            Complex32::new(2.0, -1.0)
        );
    }

    #[test]
    fn test_classify() {
        let c = Scalar::classify(f32::NAN);
        assert!(c.nan && !c.inf);
        assert!(Scalar::classify(0.0f64).zero);
        assert!(!Scalar::classify(f64::MIN_POSITIVE).denorm);
        assert!(Scalar::classify(f64::MIN_POSITIVE / 2.0).denorm);
        let z = Scalar::classify(Complex32::new(0.0, f32::INFINITY));
        assert!(z.inf && !z.zero);
        let z = Scalar::classify(Complex32::new(f32::MIN_POSITIVE / 4.0, 1.0));
        assert!(z.denorm);
        assert!(Scalar::classify(f16::NAN).nan);
        assert!(Scalar::classify(bf16::ZERO).zero);
    }

    #[test]
    fn test_half_accumulates_in_f32() {
        let h = f16::from_f32(2.5);
        assert_eq!(h.widen(), 2.5f32);
        assert_eq!(f16::narrow(2.5), h);
        assert_eq!(<f16 as Scalar>::PRECISION, "f16_r");
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(<Complex32 as Scalar>::NORM_PREFIX, "sc");
        assert_eq!(<Complex64 as Scalar>::NORM_PREFIX, "dz");
        assert_eq!(<f64 as Scalar>::PREFIX, "d");
        assert_eq!(<bf16 as Scalar>::PREFIX, "bf");
    }
}
