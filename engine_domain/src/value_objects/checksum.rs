use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// A lower-hex MD5 content fingerprint: the dedup key used by the processed-file
/// ledger. Not a security primitive - MD5 here is purely a fast content
/// fingerprint checked against a trusted ledger, never an integrity boundary
/// against an adversary.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Length of a hex-encoded MD5 digest.
    pub const HEX_LEN: usize = 32;

    pub fn new(hex: impl Into<String>) -> Result<Self, PipelineError> {
        let hex = hex.into();
        if hex.len() != Self::HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PipelineError::invalid_config(format!(
                "checksum must be {} lowercase hex characters, got {:?}",
                Self::HEX_LEN,
                hex
            )));
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_md5_hex() {
        let cs = Checksum::new("d41d8cd98f00b204e9800998ecf8427e").unwrap();
        assert_eq!(cs.as_str(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Checksum::new("abcd").is_err());
    }

    #[test]
    fn rejects_non_hex() {
        assert!(Checksum::new("z41d8cd98f00b204e9800998ecf8427e").is_err());
    }

    #[test]
    fn lowercases_input() {
        let cs = Checksum::new("D41D8CD98F00B204E9800998ECF8427E").unwrap();
        assert_eq!(cs.as_str(), "d41d8cd98f00b204e9800998ecf8427e");
    }
}
