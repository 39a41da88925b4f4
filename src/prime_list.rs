//! # PrimeList — Ordered Prime Sequence With Integrity Hashing
//!
//! Growable, ordered sequence of `u64` primes with a SHA-256 file format.
//!
//! Conceptually a capacity-tracked array plus a running count, the way a
//! hand-rolled growable array would be; `Vec` already gives us the
//! realloc dance for free, so "capacity" here is just `primes.capacity()`
//! surfaced for callers that want to pre-size, not a field maintained by
//! hand.

use crate::error::{PrimeError, Result};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::Path;

const PRIME_LIST_EXT: &str = "primes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeList {
    primes: Vec<u64>,
}

impl PrimeList {
    /// Allocate with room for `initial_estimate` primes. Fails if
    /// `initial_estimate <= 0`.
    pub fn init(initial_estimate: usize) -> Result<PrimeList> {
        if initial_estimate == 0 {
            return Err(PrimeError::InvalidArgument(
                "initial estimate must be positive".to_string(),
            ));
        }
        Ok(PrimeList {
            primes: Vec::with_capacity(initial_estimate),
        })
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.primes
    }

    /// Append `p`, growing the backing storage as needed.
    pub fn append(&mut self, p: u64) {
        self.primes.push(p);
    }

    /// Shrink backing storage to exactly fit the current element count.
    pub fn trim(&mut self) {
        self.primes.shrink_to_fit();
    }

    /// Drop the last entry. Used by the sieves to undo the single
    /// possible overshoot past `n`.
    pub fn drop_last(&mut self) {
        self.primes.pop();
    }

    /// SHA-256 over the primes as little-endian `u64`s, i.e. their raw
    /// in-memory byte layout on a little-endian host.
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for p in &self.primes {
            hasher.update(p.to_le_bytes());
        }
        hasher.finalize().into()
    }

    /// Serialize as `[ count (i32 LE) | count * u64 LE | 32-byte SHA-256 ]`
    /// to `<path>.primes`.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let full = path.with_extension(PRIME_LIST_EXT);
        let mut file = std::fs::File::create(&full)?;
        let count: i32 = self
            .primes
            .len()
            .try_into()
            .map_err(|_| PrimeError::InvalidArgument("prime list too large for i32 count".to_string()))?;
        file.write_all(&count.to_le_bytes())?;
        for p in &self.primes {
            file.write_all(&p.to_le_bytes())?;
        }
        file.write_all(&self.hash())?;
        Ok(())
    }

    /// Deserialize from `<path>.primes`, rejecting on digest mismatch.
    pub fn read_file(path: &Path) -> Result<PrimeList> {
        let full = path.with_extension(PRIME_LIST_EXT);
        let mut file = std::fs::File::open(&full)?;

        let mut count_buf = [0u8; 4];
        file.read_exact(&mut count_buf)?;
        let count = i32::from_le_bytes(count_buf);
        if count < 0 {
            return Err(PrimeError::InvalidArgument(
                "negative prime count in file header".to_string(),
            ));
        }

        let mut primes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut buf = [0u8; 8];
            file.read_exact(&mut buf)?;
            primes.push(u64::from_le_bytes(buf));
        }

        let mut stored_hash = [0u8; 32];
        file.read_exact(&mut stored_hash)?;

        let list = PrimeList { primes };
        let actual_hash = list.hash();
        if actual_hash != stored_hash {
            return Err(PrimeError::IntegrityFailure {
                expected: hex_encode(stored_hash),
                actual: hex_encode(actual_hash),
            });
        }
        Ok(list)
    }
}

fn hex_encode(bytes: [u8; 32]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_rejects_zero_estimate() {
        assert!(PrimeList::init(0).is_err());
    }

    #[test]
    fn append_and_trim() {
        let mut list = PrimeList::init(2).unwrap();
        list.append(2);
        list.append(3);
        list.append(5);
        assert_eq!(list.as_slice(), &[2, 3, 5]);
        list.trim();
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn hash_is_sensitive_to_order_and_content() {
        let mut a = PrimeList::init(4).unwrap();
        a.append(2);
        a.append(3);
        let mut b = PrimeList::init(4).unwrap();
        b.append(3);
        b.append(2);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn write_read_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_primes");

        let mut list = PrimeList::init(8).unwrap();
        for p in [2, 3, 5, 7, 11, 13] {
            list.append(p);
        }
        list.write_file(&path).unwrap();

        let loaded = PrimeList::read_file(&path).unwrap();
        assert_eq!(loaded, list);
    }

    #[test]
    fn read_file_rejects_corrupted_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_primes");

        let mut list = PrimeList::init(4).unwrap();
        list.append(97);
        list.write_file(&path).unwrap();

        let full = path.with_extension("primes");
        let mut bytes = std::fs::read(&full).unwrap();
        // Flip a byte inside the one stored u64.
        bytes[4] ^= 0xFF;
        std::fs::write(&full, bytes).unwrap();

        assert!(matches!(
            PrimeList::read_file(&path),
            Err(PrimeError::IntegrityFailure { .. })
        ));
    }

    #[test]
    fn empty_list_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        let list = PrimeList { primes: vec![] };
        list.write_file(&path).unwrap();
        let loaded = PrimeList::read_file(&path).unwrap();
        assert_eq!(loaded, list);
    }
}
