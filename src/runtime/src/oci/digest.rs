//! Content digests (`algorithm:hex`).
//!
//! A digest is the only identity stored content has: two byte-identical
//! payloads always produce the same digest.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256, Sha512};

/// Hash algorithm of a content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Algorithm {
    Sha256,
    Sha512,
}

impl Algorithm {
    /// Algorithm name as written in a digest string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Length of the hex-encoded hash.
    fn hex_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(format!(
                "unsupported digest algorithm '{}' (supported: sha256, sha512)",
                s
            )),
        }
    }
}

/// Algorithm-tagged hash of a byte sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    algorithm: Algorithm,
    hex: String,
}

impl Digest {
    /// Compute the sha256 digest of `content`.
    pub fn sha256(content: &[u8]) -> Self {
        Self {
            algorithm: Algorithm::Sha256,
            hex: hex::encode(Sha256::digest(content)),
        }
    }

    /// Compute the digest of `content` with the given algorithm.
    pub fn compute(algorithm: Algorithm, content: &[u8]) -> Self {
        let hex = match algorithm {
            Algorithm::Sha256 => hex::encode(Sha256::digest(content)),
            Algorithm::Sha512 => hex::encode(Sha512::digest(content)),
        };
        Self { algorithm, hex }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Hex-encoded hash without the algorithm prefix.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Whether `content` hashes to this digest.
    pub fn matches(&self, content: &[u8]) -> bool {
        Self::compute(self.algorithm, content) == *self
    }
}

impl std::str::FromStr for Digest {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (algorithm, hex) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid digest '{}': expected algorithm:hex", s))?;
        let algorithm: Algorithm = algorithm.parse()?;

        if hex.len() != algorithm.hex_len() {
            return Err(format!(
                "invalid digest '{}': {} requires {} hex characters, got {}",
                s,
                algorithm.as_str(),
                algorithm.hex_len(),
                hex.len()
            ));
        }
        if !hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')) {
            return Err(format!(
                "invalid digest '{}': encoding must be lowercase hex",
                s
            ));
        }

        Ok(Self {
            algorithm,
            hex: hex.to_string(),
        })
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), self.hex)
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
