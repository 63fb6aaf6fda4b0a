//! Hash algorithm selection and the streaming accumulators behind it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::digest::{Digest, FixedOutputReset, Reset};

use crate::error::ConfigError;

/// Supported content hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// XXH3 64-bit, fast and non-cryptographic.
    Xxh3,
    /// MD5, 128-bit.
    Md5,
    /// SHA-1, 160-bit.
    Sha1,
    /// SHA-256, 256-bit.
    #[default]
    Sha256,
    /// BLAKE3, 256-bit.
    Blake3,
}

impl HashAlgorithm {
    /// Every supported algorithm, in the order they are listed to users.
    pub const ALL: [HashAlgorithm; 5] = [
        HashAlgorithm::Xxh3,
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Blake3,
    ];

    /// Selector name as accepted on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Xxh3 => "xxh3",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }

    /// Length of the hex-encoded digest.
    #[must_use]
    pub fn hex_len(self) -> usize {
        match self {
            Self::Xxh3 => 16,
            Self::Md5 => 32,
            Self::Sha1 => 40,
            Self::Sha256 | Self::Blake3 => 64,
        }
    }

    /// Create a fresh accumulator for this algorithm.
    #[must_use]
    pub fn new_accumulator(self) -> Box<dyn Accumulator> {
        match self {
            Self::Xxh3 => Box::new(Xxh3Accumulator::default()),
            Self::Md5 => Box::new(DigestAccumulator::<md5::Md5>::default()),
            Self::Sha1 => Box::new(DigestAccumulator::<sha1::Sha1>::default()),
            Self::Sha256 => Box::new(DigestAccumulator::<sha2::Sha256>::default()),
            Self::Blake3 => Box::new(Blake3Accumulator::default()),
        }
    }

    /// Hash an in-memory buffer, mostly useful for tests and tooling.
    #[must_use]
    pub fn hash_bytes(self, data: &[u8]) -> String {
        let mut acc = self.new_accumulator();
        acc.update(data);
        hash_to_hex(&acc.finalize_reset())
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if let Some(algo) = Self::ALL.into_iter().find(|a| a.name() == wanted) {
            return Ok(algo);
        }

        let suggestion = Self::ALL
            .into_iter()
            .map(|a| (a.name(), strsim::levenshtein(&wanted, a.name())))
            .filter(|(_, distance)| *distance <= 2)
            .min_by_key(|(_, distance)| *distance)
            .map(|(name, _)| name);

        Err(ConfigError::UnknownAlgorithm {
            name: s.to_string(),
            suggestion,
        })
    }
}

/// A resettable streaming hash state.
///
/// Accumulators are owned by one worker at a time; `Send` lets the pool hand
/// them across threads between uses.
pub trait Accumulator: Send {
    /// Feed more bytes.
    fn update(&mut self, data: &[u8]);

    /// Return the digest of everything fed so far and reset to the initial state.
    fn finalize_reset(&mut self) -> Vec<u8>;

    /// Discard any fed bytes.
    fn reset(&mut self);
}

/// Accumulator over any RustCrypto `digest` hasher.
#[derive(Default)]
pub struct DigestAccumulator<D>(D);

impl<D> Accumulator for DigestAccumulator<D>
where
    D: Digest + Reset + FixedOutputReset + Send,
{
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize_reset(&mut self) -> Vec<u8> {
        Digest::finalize_reset(&mut self.0).to_vec()
    }

    fn reset(&mut self) {
        Digest::reset(&mut self.0);
    }
}

/// BLAKE3 accumulator.
#[derive(Default)]
pub struct Blake3Accumulator(blake3::Hasher);

impl Accumulator for Blake3Accumulator {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize_reset(&mut self) -> Vec<u8> {
        let digest = self.0.finalize().as_bytes().to_vec();
        self.0.reset();
        digest
    }

    fn reset(&mut self) {
        self.0.reset();
    }
}

/// XXH3 64-bit accumulator. The digest is the big-endian encoding of the u64.
pub struct Xxh3Accumulator(xxhash_rust::xxh3::Xxh3);

impl Default for Xxh3Accumulator {
    fn default() -> Self {
        Self(xxhash_rust::xxh3::Xxh3::new())
    }
}

impl Accumulator for Xxh3Accumulator {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize_reset(&mut self) -> Vec<u8> {
        let digest = self.0.digest().to_be_bytes().to_vec();
        self.0.reset();
        digest
    }

    fn reset(&mut self) {
        self.0.reset();
    }
}

/// Convert a digest to a lowercase hex string.
#[must_use]
pub fn hash_to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
