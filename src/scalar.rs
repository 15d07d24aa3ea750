//! Typed telemetry scalars.
//!
//! Every monitored parameter carries values of exactly one [`ScalarKind`].
//! [`Scalar`] is the closed set of those kinds; values of different kinds
//! never compare (their `partial_cmp` is `None`), so a threshold of one kind
//! can't silently be applied to a sample of another.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParseScalarError;

macro_rules! define_scalars {
    ($($variant:ident($ty:ty) => $name:literal),* $(,)?) => {
        /// The storage type of a parameter.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ScalarKind {
            $(
                #[serde(rename = $name)]
                $variant,
            )*
        }

        /// A single telemetry value.
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum Scalar {
            $($variant($ty),)*
        }

        impl ScalarKind {
            /// All supported kinds.
            pub const ALL: &'static [ScalarKind] = &[$(ScalarKind::$variant,)*];

            /// Name used in record layouts and messages.
            pub fn name(self) -> &'static str {
                match self {
                    $(ScalarKind::$variant => $name,)*
                }
            }

            /// Encoded width in bytes.
            pub fn size(self) -> usize {
                match self {
                    $(ScalarKind::$variant => std::mem::size_of::<$ty>(),)*
                }
            }

            /// Parse a value of this kind from text.
            pub fn parse(self, text: &str) -> Result<Scalar, ParseScalarError> {
                let trimmed = text.trim();
                let err = || ParseScalarError {
                    kind: self,
                    text: trimmed.to_string(),
                };
                match self {
                    $(ScalarKind::$variant => trimmed
                        .parse::<$ty>()
                        .map(Scalar::$variant)
                        .map_err(|_| err()),)*
                }
            }

            /// Decode a little-endian value from the start of `bytes`.
            ///
            /// Returns `None` if `bytes` is too short.
            pub fn from_le_bytes(self, bytes: &[u8]) -> Option<Scalar> {
                match self {
                    $(ScalarKind::$variant => {
                        const WIDTH: usize = std::mem::size_of::<$ty>();
                        let raw: [u8; WIDTH] = bytes.get(..WIDTH)?.try_into().ok()?;
                        Some(Scalar::$variant(<$ty>::from_le_bytes(raw)))
                    })*
                }
            }
        }

        impl Scalar {
            pub fn kind(&self) -> ScalarKind {
                match self {
                    $(Scalar::$variant(_) => ScalarKind::$variant,)*
                }
            }
        }

        impl PartialOrd for Scalar {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                match (self, other) {
                    $((Scalar::$variant(a), Scalar::$variant(b)) => a.partial_cmp(b),)*
                    _ => None,
                }
            }
        }

        impl fmt::Display for Scalar {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Scalar::$variant(v) => write!(f, "{v}"),)*
                }
            }
        }

        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value)
                }
            }
        )*
    };
}

define_scalars! {
    U8(u8) => "u8",
    U16(u16) => "u16",
    U32(u32) => "u32",
    I8(i8) => "i8",
    I16(i16) => "i16",
    I32(i32) => "i32",
    F32(f32) => "f32",
}

impl Scalar {
    /// True only for a floating-point NaN.
    pub fn is_nan(&self) -> bool {
        matches!(self, Scalar::F32(v) if v.is_nan())
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_kind() {
        assert_eq!(ScalarKind::U8.parse("200").unwrap(), Scalar::U8(200));
        assert_eq!(ScalarKind::U16.parse(" 65535 ").unwrap(), Scalar::U16(65535));
        assert_eq!(ScalarKind::U32.parse("70000").unwrap(), Scalar::U32(70000));
        assert_eq!(ScalarKind::I8.parse("-128").unwrap(), Scalar::I8(-128));
        assert_eq!(ScalarKind::I16.parse("-300").unwrap(), Scalar::I16(-300));
        assert_eq!(ScalarKind::I32.parse("-70000").unwrap(), Scalar::I32(-70000));
        assert_eq!(ScalarKind::F32.parse("1.5").unwrap(), Scalar::F32(1.5));
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(ScalarKind::U8.parse("256").is_err());
        assert!(ScalarKind::U16.parse("-1").is_err());
        assert!(ScalarKind::I32.parse("1.5").is_err());

        let err = ScalarKind::I8.parse("abc").unwrap_err();
        assert_eq!(err.kind, ScalarKind::I8);
        assert_eq!(err.text, "abc");
    }

    #[test]
    fn test_cross_kind_values_do_not_compare() {
        let a = Scalar::U8(1);
        let b = Scalar::I8(1);
        assert_eq!(a.partial_cmp(&b), None);
        assert_ne!(a, b);
        assert!(Scalar::I16(-2) < Scalar::I16(3));
    }

    #[test]
    fn test_display_round_trips() {
        for text in ["0", "35", "-1.25", "0.1", "1e-7"] {
            let value = ScalarKind::F32.parse(text).unwrap();
            let again = ScalarKind::F32.parse(&value.to_string()).unwrap();
            assert_eq!(value, again);
        }
        assert_eq!(Scalar::F32(35.0).to_string(), "35");
    }

    #[test]
    fn test_from_le_bytes() {
        let bytes = 0x1234u16.to_le_bytes();
        assert_eq!(
            ScalarKind::U16.from_le_bytes(&bytes),
            Some(Scalar::U16(0x1234))
        );
        assert_eq!(ScalarKind::U32.from_le_bytes(&bytes), None);
        assert_eq!(
            ScalarKind::F32.from_le_bytes(&2.5f32.to_le_bytes()),
            Some(Scalar::F32(2.5))
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ScalarKind::ALL.len(), 7);
        for kind in ScalarKind::ALL {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
        }
        assert!(Scalar::F32(f32::NAN).is_nan());
        assert!(!Scalar::I32(0).is_nan());
    }
}
