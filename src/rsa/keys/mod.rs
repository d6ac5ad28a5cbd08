use std::error::Error;
use std::fmt::{Display, Formatter, LowerHex, UpperHex};
use num_bigint::BigInt;

/// One half of a key pair: `exponent` together with the shared modulus `N`.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    exponent: BigInt,
    modulus: BigInt,
}

impl Key {
    pub fn new(exponent: BigInt, modulus: BigInt) -> Self {
        Self { exponent, modulus }
    }

    pub fn exponent(&self) -> &BigInt {
        &self.exponent
    }

    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key: {}, N: {}", self.exponent, self.modulus)
    }
}

impl UpperHex for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key: {:X}, N: {:X}", self.exponent, self.modulus)
    }
}

impl LowerHex for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key: {:x}, N: {:x}", self.exponent, self.modulus)
    }
}

#[derive(Debug, Clone)]
pub struct KeySet {
    pub public: Key,
    pub private: Key,
}

#[derive(Debug)]
pub enum KeyError {
    ParseError(String),
    MissingKey,
    RoundTrip(String),
}

impl Display for KeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyError::ParseError(s) => write!(f, "Parse error: {}", s),
            KeyError::MissingKey => write!(f, "Both --exponent and --modulus are required"),
            KeyError::RoundTrip(s) => write!(f, "Round trip failed for message {}", s),
        }
    }
}

impl Error for KeyError {}
