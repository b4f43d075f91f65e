// Selection hashing for the hex viewer
//
// Digests an arbitrary byte range of the open file so the examiner can hash a
// carved region or a header without exporting it first.

use std::str::FromStr;

use blake2::Blake2b512;
use blake3::Hasher as Blake3Hasher;
use crc32fast::Hasher as Crc32Hasher;
use md5::Md5;
use serde::Serialize;
use sha1::{Digest, Sha1};
use sha2::{Sha256, Sha512};
use xxhash_rust::xxh3::Xxh3;
use xxhash_rust::xxh64::Xxh64;

use crate::error::ViewerError;

// =============================================================================
// Algorithms
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Blake2,
    Blake3,
    Xxh3,
    Xxh64,
    Crc32,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha512 => "SHA-512",
            HashAlgorithm::Blake2 => "BLAKE2b",
            HashAlgorithm::Blake3 => "BLAKE3",
            HashAlgorithm::Xxh3 => "XXH3",
            HashAlgorithm::Xxh64 => "XXH64",
            HashAlgorithm::Crc32 => "CRC32",
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = ViewerError;

    /// Case-insensitive, accepts dashed spellings ("SHA-256")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "").as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "blake2" | "blake2b" => Ok(HashAlgorithm::Blake2),
            "blake3" => Ok(HashAlgorithm::Blake3),
            "xxh3" | "xxhash3" => Ok(HashAlgorithm::Xxh3),
            "xxh64" | "xxhash64" => Ok(HashAlgorithm::Xxh64),
            "crc32" => Ok(HashAlgorithm::Crc32),
            _ => Err(ViewerError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

// =============================================================================
// Streaming digest over range windows
// =============================================================================

/// Incremental hasher fed one window at a time.
/// BLAKE3 is boxed: its state is far larger than the other variants.
pub enum RangeHasher {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
    Blake2(Blake2b512),
    Blake3(Box<Blake3Hasher>),
    Xxh3(Box<Xxh3>),
    Xxh64(Xxh64),
    Crc32(Crc32Hasher),
}

impl RangeHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => RangeHasher::Md5(Md5::new()),
            HashAlgorithm::Sha1 => RangeHasher::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => RangeHasher::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => RangeHasher::Sha512(Sha512::new()),
            HashAlgorithm::Blake2 => RangeHasher::Blake2(Blake2b512::new()),
            HashAlgorithm::Blake3 => RangeHasher::Blake3(Box::new(Blake3Hasher::new())),
            HashAlgorithm::Xxh3 => RangeHasher::Xxh3(Box::new(Xxh3::new())),
            HashAlgorithm::Xxh64 => RangeHasher::Xxh64(Xxh64::new(0)),
            HashAlgorithm::Crc32 => RangeHasher::Crc32(Crc32Hasher::new()),
        }
    }

    pub fn update(&mut self, window: &[u8]) {
        match self {
            RangeHasher::Md5(h) => Digest::update(h, window),
            RangeHasher::Sha1(h) => Digest::update(h, window),
            RangeHasher::Sha256(h) => Digest::update(h, window),
            RangeHasher::Sha512(h) => Digest::update(h, window),
            RangeHasher::Blake2(h) => Digest::update(h, window),
            RangeHasher::Blake3(h) => {
                h.update(window);
            }
            RangeHasher::Xxh3(h) => h.update(window),
            RangeHasher::Xxh64(h) => h.update(window),
            RangeHasher::Crc32(h) => h.update(window),
        }
    }

    /// Lowercase hex digest
    pub fn finalize(self) -> String {
        match self {
            RangeHasher::Md5(h) => hex::encode(h.finalize()),
            RangeHasher::Sha1(h) => hex::encode(h.finalize()),
            RangeHasher::Sha256(h) => hex::encode(h.finalize()),
            RangeHasher::Sha512(h) => hex::encode(h.finalize()),
            RangeHasher::Blake2(h) => hex::encode(h.finalize()),
            RangeHasher::Blake3(h) => h.finalize().to_hex().to_string(),
            RangeHasher::Xxh3(h) => format!("{:032x}", h.digest128()),
            RangeHasher::Xxh64(h) => format!("{:016x}", h.digest()),
            RangeHasher::Crc32(h) => format!("{:08x}", h.finalize()),
        }
    }
}

/// Digest of a selected byte range
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeHash {
    pub algorithm: String,
    pub hash: String,
    pub start: u64,
    /// Bytes actually hashed (the range is clamped to the file size)
    pub length: u64,
}
