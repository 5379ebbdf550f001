use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NumPriv {
    /// Always non-less than zero.
    PosInt(u64),
    /// Always less than zero.
    NegInt(i64),
}

/// A numeric scalar attribute, whether signed or unsigned.
///
/// Every integer type that can be encoded converts into a `Number` through `From`. Its
/// `Display` output is the canonical decimal form used for `N` attributes and number sets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Number {
    n: NumPriv,
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.n {
            NumPriv::PosInt(v) => fmt::Display::fmt(&v, f),
            NumPriv::NegInt(v) => fmt::Display::fmt(&v, f),
        }
    }
}

macro_rules! impl_from_unsigned {
    ($t: ty) => {
        impl From<$t> for Number {
            fn from(n: $t) -> Self {
                Number {
                    n: NumPriv::PosInt(n as u64),
                }
            }
        }
    };
}

macro_rules! impl_from_signed {
    ($t: ty) => {
        impl From<$t> for Number {
            fn from(n: $t) -> Self {
                let n = if n < 0 {
                    NumPriv::NegInt(n as i64)
                } else {
                    NumPriv::PosInt(n as u64)
                };
                Number { n }
            }
        }
    };
}

impl_from_unsigned!(u8);
impl_from_unsigned!(u16);
impl_from_unsigned!(u32);
impl_from_unsigned!(u64);
impl_from_unsigned!(usize);
impl_from_signed!(i8);
impl_from_signed!(i16);
impl_from_signed!(i32);
impl_from_signed!(i64);
impl_from_signed!(isize);
