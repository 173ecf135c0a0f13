//! BLAS enumerations, handle modes and index types.
//!
//! Discriminants match the C API. Raw values coming from C are validated with
//! `TryFrom<u32>`; an out-of-range value becomes [`Error::InvalidValue`].

use crate::error::Error;
use std::fmt;

/// Batch/matrix stride in elements.
pub type Stride = i64;

/// Triangle of a matrix that is referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum Fill {
    #[default]
    Upper = 121,
    Lower = 122,
    Full = 123,
}

/// Operation applied to a matrix operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum Operation {
    /// No transpose.
    #[default]
    None = 111,
    /// Transpose.
    Transpose = 112,
    /// Conjugate transpose (same as transpose for real types).
    ConjugateTranspose = 113,
}

/// Whether a triangular matrix has an implicit unit diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum Diagonal {
    #[default]
    NonUnit = 131,
    Unit = 132,
}

/// Side a matrix multiplies from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum Side {
    #[default]
    Left = 141,
    Right = 142,
    Both = 143,
}

/// Where scalar arguments and scalar results live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum PointerMode {
    #[default]
    Host = 0,
    Device = 1,
}

macro_rules! impl_raw_enum {
    ($ty:ident, $what:literal, { $($variant:ident = $letter:literal),+ $(,)? }) => {
        impl TryFrom<u32> for $ty {
            type Error = Error;

            fn try_from(raw: u32) -> Result<Self, Error> {
                $(
                    if raw == $ty::$variant as u32 {
                        return Ok($ty::$variant);
                    }
                )+
                Err(Error::InvalidValue($what))
            }
        }

        impl $ty {
            /// Single-letter code used by logs and the bench command line.
            pub fn letter(self) -> char {
                match self {
                    $($ty::$variant => $letter,)+
                }
            }

            /// Inverse of [`Self::letter`], case-insensitive.
            pub fn from_letter(c: char) -> Option<Self> {
                let c = c.to_ascii_uppercase();
                $(
                    if c == $letter {
                        return Some($ty::$variant);
                    }
                )+
                None
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.letter())
            }
        }
    };
}

impl_raw_enum!(Fill, "uplo", { Upper = 'U', Lower = 'L', Full = 'F' });
impl_raw_enum!(Operation, "trans", { None = 'N', Transpose = 'T', ConjugateTranspose = 'C' });
impl_raw_enum!(Diagonal, "diag", { NonUnit = 'N', Unit = 'U' });
impl_raw_enum!(Side, "side", { Left = 'L', Right = 'R', Both = 'B' });
impl_raw_enum!(PointerMode, "pointer_mode", { Host = 'H', Device = 'D' });

impl Fill {
    /// Upper or lower; `Full` is rejected by routines that reference one triangle.
    #[inline]
    pub fn is_triangle(self) -> bool {
        matches!(self, Fill::Upper | Fill::Lower)
    }
}

macro_rules! bitmask {
    ($(#[$doc:meta])* $name:ident { $($(#[$cdoc:meta])* $flag:ident = $value:expr),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const NONE: $name = $name(0);
            $($(#[$cdoc])* pub const $flag: $name = $name($value);)+

            #[inline]
            pub fn contains(self, other: $name) -> bool {
                other.0 != 0 && self.0 & other.0 == other.0
            }

            #[inline]
            pub fn is_empty(self) -> bool {
                self.0 == 0
            }

            #[inline]
            pub fn bits(self) -> u32 {
                self.0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: $name) {
                self.0 |= rhs.0;
            }
        }
    };
}

bitmask!(
    /// Which logging layers are active.
    LayerMode {
        /// One event per call with all arguments.
        LOG_TRACE = 1,
        /// One `rocrus-bench` command line per call.
        LOG_BENCH = 2,
        /// Call-count profile emitted when the handle drops.
        LOG_PROFILE = 4,
    }
);

bitmask!(
    /// How routines scan their operands for NaN/Inf/denormals.
    CheckNumericsMode {
        /// Log every report.
        INFO = 1,
        /// Log reports containing NaN or Inf.
        WARN = 2,
        /// Fail the call on NaN or Inf.
        FAIL = 4,
        /// Restrict reports to NaN and Inf.
        ONLY_NAN_INF = 8,
    }
);

/// Integer type of a C API flavour: `i32` for the regular API, `i64` for `_64`.
pub trait ApiInt:
    Copy + Send + Sync + PartialOrd + fmt::Debug + fmt::Display + Into<i64> + 'static
{
    /// Whether this is the `_64` flavour.
    const IS_64: bool;

    #[inline]
    fn as_i64(self) -> i64 {
        self.into()
    }
}

impl ApiInt for i32 {
    const IS_64: bool = false;
}

impl ApiInt for i64 {
    const IS_64: bool = true;
}

/// Batch shape of a routine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Single,
    Batched,
    StridedBatched,
}

impl Variant {
    pub fn suffix(self) -> &'static str {
        match self {
            Variant::Single => "",
            Variant::Batched => "_batched",
            Variant::StridedBatched => "_strided_batched",
        }
    }
}

/// Exported routine name, e.g. `rocrus_cdotc_strided_batched_64`.
///
/// Formatting is deferred so the name costs nothing unless a log or report
/// actually prints it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineName {
    pub prefix: &'static str,
    pub base: &'static str,
    pub variant: Variant,
    pub is_64: bool,
}

impl RoutineName {
    pub fn new<I: ApiInt>(prefix: &'static str, base: &'static str, variant: Variant) -> Self {
        RoutineName {
            prefix,
            base,
            variant,
            is_64: I::IS_64,
        }
    }

    /// Function name as accepted by `rocrus-bench -f`.
    pub fn bench_function(&self) -> String {
        format!("{}{}", self.base, self.variant.suffix())
    }
}

impl fmt::Display for RoutineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rocrus_{}{}{}{}",
            self.prefix,
            self.base,
            self.variant.suffix(),
            if self.is_64 { "_64" } else { "" }
        )
    }
}

/// Offset of element `i` of a vector of length `n` with increment `inc`,
/// relative to the pointer passed by the caller.
///
/// Negative increments walk the vector from its far end.
#[inline(always)]
pub fn vector_index(i: i64, n: i64, inc: i64) -> i64 {
    if inc >= 0 {
        i * inc
    } else {
        (i - (n - 1)) * inc
    }
}

/// Column-major index of `(i, j)` with leading dimension `ld`.
#[inline(always)]
pub fn col_major(i: i64, j: i64, ld: i64) -> i64 {
    i + j * ld
}

/// Index of `(i, j)` inside a packed triangle of order `n`.
///
/// Upper packing stores column `j` rows `0..=j`; lower packing stores column
/// `j` rows `j..n`. The caller guarantees `(i, j)` is inside the triangle.
#[inline(always)]
pub fn packed_index(fill: Fill, n: i64, i: i64, j: i64) -> i64 {
    match fill {
        Fill::Lower => i - j + j * (2 * n - j + 1) / 2,
        _ => i + j * (j + 1) / 2,
    }
}

/// Number of elements of a packed triangle of order `n`.
#[inline]
pub fn packed_len(n: i64) -> i64 {
    n * (n + 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_raw() {
        assert_eq!(Fill::try_from(121).unwrap(), Fill::Upper);
        assert_eq!(Fill::try_from(123).unwrap(), Fill::Full);
        assert_eq!(Operation::try_from(113).unwrap(), Operation::ConjugateTranspose);
        assert_eq!(Diagonal::try_from(132).unwrap(), Diagonal::Unit);
        assert_eq!(PointerMode::try_from(1).unwrap(), PointerMode::Device);
        assert_eq!(Fill::try_from(124), Err(Error::InvalidValue("uplo")));
        assert_eq!(Operation::try_from(0), Err(Error::InvalidValue("trans")));
    }

    #[test]
    fn test_letters_round_trip() {
        for f in [Fill::Upper, Fill::Lower, Fill::Full] {
            assert_eq!(Fill::from_letter(f.letter()), Some(f));
        }
        assert_eq!(Operation::from_letter('c'), Some(Operation::ConjugateTranspose));
        assert_eq!(Diagonal::from_letter('x'), None);
    }

    #[test]
    fn test_layer_mode_bits() {
        let m = LayerMode::LOG_TRACE | LayerMode::LOG_PROFILE;
        assert!(m.contains(LayerMode::LOG_TRACE));
        assert!(!m.contains(LayerMode::LOG_BENCH));
        assert!(!LayerMode::NONE.contains(LayerMode::NONE));
        assert_eq!(m.bits(), 5);
    }

    #[test]
    fn test_routine_name() {
        let name = RoutineName::new::<i64>("c", "dotc", Variant::StridedBatched);
        assert_eq!(name.to_string(), "rocrus_cdotc_strided_batched_64");
        assert_eq!(name.bench_function(), "dotc_strided_batched");
        let name = RoutineName::new::<i32>("sc", "nrm2", Variant::Single);
        assert_eq!(name.to_string(), "rocrus_scnrm2");
    }

    #[test]
    fn test_vector_index_negative_increment() {
        // n = 3, inc = -2: element 0 lives at offset 4, element 2 at 0.
        assert_eq!(vector_index(0, 3, -2), 4);
        assert_eq!(vector_index(2, 3, -2), 0);
        assert_eq!(vector_index(1, 3, 2), 2);
    }

    #[test]
    fn test_packed_index_layout() {
        // Upper, n = 3: (0,0) (0,1) (1,1) (0,2) (1,2) (2,2)
        assert_eq!(packed_index(Fill::Upper, 3, 0, 2), 3);
        assert_eq!(packed_index(Fill::Upper, 3, 2, 2), 5);
        // Lower, n = 3: (0,0) (1,0) (2,0) (1,1) (2,1) (2,2)
        assert_eq!(packed_index(Fill::Lower, 3, 2, 0), 2);
        assert_eq!(packed_index(Fill::Lower, 3, 1, 1), 3);
        assert_eq!(packed_index(Fill::Lower, 3, 2, 2), 5);
        assert_eq!(packed_len(3), 6);
    }

    proptest::proptest! {
        #[test]
        fn packed_index_is_a_bijection(n in 1i64..40, lower in proptest::bool::ANY) {
            let fill = if lower { Fill::Lower } else { Fill::Upper };
            let mut seen = vec![false; packed_len(n) as usize];
            for j in 0..n {
                let rows: Vec<i64> = if lower { (j..n).collect() } else { (0..=j).collect() };
                for i in rows {
                    let k = packed_index(fill, n, i, j) as usize;
                    proptest::prop_assert!(!seen[k]);
                    seen[k] = true;
                }
            }
            proptest::prop_assert!(seen.into_iter().all(|s| s));
        }
    }
}
