//! Registry labels.
//!
//! A label is the fixed-size key under which a name is registered: the
//! Keccak-256 digest of the human-readable name (the ENS "labelhash").

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of raw bytes in a label digest.
pub const LABEL_BYTES: usize = 32;

/// Errors raised when parsing a label from its hex form.
#[derive(Debug, Error, PartialEq)]
pub enum LabelError {
    #[error("label must start with '0x'")]
    InvalidPrefix,
    #[error("label must be {expected} hex characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("label payload is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(pub [u8; LABEL_BYTES]);

impl Label {
    pub const fn new(bytes: [u8; LABEL_BYTES]) -> Self {
        Self(bytes)
    }

    /// Hash a human-readable name into its label.
    pub fn from_name(name: &str) -> Self {
        let digest = Keccak256::digest(name.as_bytes());
        Self(digest.into())
    }

    /// Parse a `0x`-prefixed 64-character hex digest.
    pub fn from_hex(value: &str) -> Result<Self, LabelError> {
        let payload = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .ok_or(LabelError::InvalidPrefix)?;

        if payload.len() != LABEL_BYTES * 2 {
            return Err(LabelError::InvalidLength {
                expected: LABEL_BYTES * 2,
                actual: payload.len(),
            });
        }

        let mut bytes = [0u8; LABEL_BYTES];
        hex::decode_to_slice(payload, &mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; LABEL_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Label {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.trim())
    }
}

impl From<Label> for String {
    fn from(value: Label) -> Self {
        value.to_hex()
    }
}

impl TryFrom<String> for Label {
    type Error = LabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_matches_known_labelhash() {
        assert_eq!(
            Label::from_name("eth").to_hex(),
            "0x4f5b812789fc606be1b3b16908db13fc7a9adf7ca72641f84d75b47069d3d7f0"
        );
        assert_eq!(
            Label::from_name("").to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn distinct_names_give_distinct_labels() {
        assert_ne!(Label::from_name("ebakus"), Label::from_name("Ebakus"));
    }

    #[test]
    fn from_hex_accepts_digest() {
        let raw = "0xde9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f";
        let label: Label = raw.parse().unwrap();
        assert_eq!(label.0[0], 0xde);
        assert_eq!(label.to_string(), raw);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert_eq!(
            Label::from_hex("de9b").unwrap_err(),
            LabelError::InvalidPrefix
        );
        assert!(matches!(
            Label::from_hex("0xde9b").unwrap_err(),
            LabelError::InvalidLength { actual: 4, .. }
        ));
        let bad = format!("0x{}", "zz".repeat(LABEL_BYTES));
        assert!(matches!(
            Label::from_hex(&bad).unwrap_err(),
            LabelError::InvalidHex(_)
        ));
    }
}
