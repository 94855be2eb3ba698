//! Fixed-width byte identifiers and the 256-bit word model.

use core::array::TryFromSliceError;
use core::ops::Deref;
use core::{fmt, str};

pub use primitive_types::{U256, U512};

#[cfg(feature = "random")]
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

const fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'A'..=b'F' => Some(c.wrapping_sub(b'A').wrapping_add(10)),
        b'a'..=b'f' => Some(c.wrapping_sub(b'a').wrapping_add(10)),
        b'0'..=b'9' => Some(c.wrapping_sub(b'0')),
        _ => None,
    }
}

macro_rules! key {
    ($(#[$meta:meta])* $i:ident, $s:expr) => {
        $(#[$meta])*
        #[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $i([u8; $s]);

        impl $i {
            /// Memory length of the type
            pub const LEN: usize = $s;

            /// Bytes constructor.
            pub const fn new(bytes: [u8; $s]) -> Self {
                Self(bytes)
            }

            /// Zeroes bytes constructor.
            pub const fn zeroed() -> Self {
                Self([0; $s])
            }

            /// Copy the trailing `LEN` bytes of `bytes`, left padding with zeroes when shorter.
            pub fn left_pad(bytes: &[u8]) -> Self {
                let mut ret = Self::zeroed();
                let bytes = &bytes[bytes.len().saturating_sub($s)..];

                ret.0[Self::LEN.saturating_sub(bytes.len())..].copy_from_slice(bytes);

                ret
            }

            /// Copy the leading `LEN` bytes of `bytes`, right padding with zeroes when shorter.
            pub fn right_pad(bytes: &[u8]) -> Self {
                let mut ret = Self::zeroed();
                let n = bytes.len().min($s);

                ret.0[..n].copy_from_slice(&bytes[..n]);

                ret
            }

            /// `true` if every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// Owned byte vector.
            pub fn to_vec(&self) -> Vec<u8> {
                self.0.to_vec()
            }
        }

        #[cfg(feature = "random")]
        impl Distribution<$i> for Standard {
            fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> $i {
                $i(rng.gen())
            }
        }

        impl Deref for $i {
            type Target = [u8; $s];

            fn deref(&self) -> &[u8; $s] {
                &self.0
            }
        }

        impl AsRef<[u8]> for $i {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $s]> for $i {
            fn from(bytes: [u8; $s]) -> Self {
                Self(bytes)
            }
        }

        impl From<$i> for [u8; $s] {
            fn from(key: $i) -> [u8; $s] {
                key.0
            }
        }

        impl TryFrom<&[u8]> for $i {
            type Error = TryFromSliceError;

            fn try_from(bytes: &[u8]) -> Result<$i, TryFromSliceError> {
                <[u8; $s]>::try_from(bytes).map(|b| b.into())
            }
        }

        impl fmt::LowerHex for $i {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if f.alternate() {
                    write!(f, "0x")?
                }

                self.0.iter().try_for_each(|b| write!(f, "{:02x}", &b))
            }
        }

        impl fmt::UpperHex for $i {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if f.alternate() {
                    write!(f, "0x")?
                }

                self.0.iter().try_for_each(|b| write!(f, "{:02X}", &b))
            }
        }

        impl fmt::Debug for $i {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                <Self as fmt::UpperHex>::fmt(&self, f)
            }
        }

        impl fmt::Display for $i {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                <Self as fmt::UpperHex>::fmt(&self, f)
            }
        }

        impl str::FromStr for $i {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                const ERR: &str = "Invalid encoded byte";

                let s = s.strip_prefix("0x").unwrap_or(s);

                if s.len() != 2 * $s {
                    return Err(ERR);
                }

                let mut b = s.bytes();
                let mut ret = Self::zeroed();

                for r in ret.0.iter_mut() {
                    let h = b.next().and_then(hex_val).ok_or(ERR)?;
                    let l = b.next().and_then(hex_val).ok_or(ERR)?;

                    *r = h.wrapping_shl(4) | l;
                }

                Ok(ret)
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $i {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&format!("{:x}", &self))
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $i {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                use serde::de::Error;
                let s: String = serde::Deserialize::deserialize(deserializer)?;
                s.parse().map_err(D::Error::custom)
            }
        }
    };
}

key!(
    /// 20-byte account identifier.
    Address,
    20
);

key!(
    /// 32-byte big-endian word, the storage key and hash representation.
    Word256,
    32
);

impl Address {
    /// Low 20 bytes of a word.
    pub fn from_word256(word: &Word256) -> Self {
        Self::left_pad(word.as_ref())
    }

    /// The address left padded into a word.
    pub fn to_word256(&self) -> Word256 {
        Word256::left_pad(&self.0)
    }

    /// Low 20 bytes of a numeric word.
    pub fn from_u256(value: U256) -> Self {
        Self::from_word256(&value.into())
    }

    /// Numeric value of the address.
    pub fn to_u256(&self) -> U256 {
        self.to_word256().into()
    }
}

impl Word256 {
    /// All bits set.
    pub const MAX: Word256 = Word256([0xff; 32]);

    /// Word holding a 64-bit value in its low bytes.
    pub fn from_u64(value: u64) -> Self {
        Self::left_pad(&value.to_be_bytes())
    }
}

impl From<U256> for Word256 {
    fn from(value: U256) -> Self {
        let mut word = Self::zeroed();
        value.to_big_endian(&mut word.0);
        word
    }
}

impl From<Word256> for U256 {
    fn from(word: Word256) -> Self {
        U256::from_big_endian(&word.0)
    }
}

impl From<&Word256> for U256 {
    fn from(word: &Word256) -> Self {
        U256::from_big_endian(&word.0)
    }
}

impl From<Address> for Word256 {
    fn from(address: Address) -> Self {
        address.to_word256()
    }
}
