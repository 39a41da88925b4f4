//! # Bitmap — Dense Bit Array With Integrity Hashing
//!
//! Dense bit array with bulk operations and a SHA-256 content digest.
//!
//! Bit `i` lives in byte `i / 8` at bit position `i % 8`, LSB = bit 0 —
//! persistence formats are defined against this ordering, so do not
//! reinterpret it.
//!
//! Unlike a hand-cached digest field that's only trustworthy after an
//! explicit recompute call, this type has no stored digest: `hash()`
//! always computes fresh, so there's no staleness hazard to track.

use crate::error::{PrimeError, Result};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::Path;

const BITMAP_EXT: &str = "bitmap";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    size: usize,
    data: Vec<u8>,
}

fn byte_len(size: usize) -> usize {
    (size + 7) / 8
}

impl Bitmap {
    /// Allocate `size` bits, all zero. Fails on `size == 0`.
    pub fn create(size: usize) -> Result<Bitmap> {
        if size == 0 {
            return Err(PrimeError::InvalidArgument(
                "bitmap size must be > 0".to_string(),
            ));
        }
        Ok(Bitmap {
            size,
            data: vec![0u8; byte_len(size)],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn set_all(&mut self) {
        self.data.fill(0xFF);
    }

    pub fn clear_all(&mut self) {
        self.data.fill(0x00);
    }

    /// Precondition: `i < size()`. Panics via slice indexing otherwise.
    #[inline]
    pub fn set(&mut self, i: usize) {
        self.data[i / 8] |= 1 << (i % 8);
    }

    #[inline]
    pub fn clear(&mut self, i: usize) {
        self.data[i / 8] &= !(1 << (i % 8));
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        (self.data[i / 8] & (1 << (i % 8))) != 0
    }

    /// Clear bit `k` for every `k = start, start+p, start+2p, ...` with
    /// `k <= limit`. A no-op if `start > limit`. `limit` is inclusive and
    /// must be `< size()` — this asymmetry with typical half-open ranges
    /// is deliberate: it's what keeps the discovered prime-gap sequence
    /// in the vx6 block sieve lining up exactly.
    pub fn clear_mod_p(&mut self, p: u64, start: u64, limit: u64) {
        if start > limit {
            return;
        }
        let mut idx = start;
        while idx <= limit {
            self.clear(idx as usize);
            idx += p;
        }
    }

    /// Bitwise copy of `length` bits from `src[src_off..]` into
    /// `self[dest_off..]`. Caller must ensure the ranges don't overlap
    /// unless `self` and `src` are the same bitmap with
    /// `dest_off > src_off + length` or `dest_off + length <= src_off`
    /// — copying forward bit-by-bit is therefore always safe
    /// for the ranges this crate actually constructs (`duplicate_segment`
    /// always copies into a strictly later, non-overlapping region).
    pub fn copy(&mut self, dest_off: usize, src: &Bitmap, src_off: usize, length: usize) {
        for i in 0..length {
            if src.get(src_off + i) {
                self.set(dest_off + i);
            } else {
                self.clear(dest_off + i);
            }
        }
    }

    /// Replicate the pattern in `[start, start + seg_len)` a further
    /// `factor - 1` times immediately after it; total length written is
    /// `seg_len * factor`.
    pub fn duplicate_segment(&mut self, start: usize, seg_len: usize, factor: usize) -> Result<()> {
        let total = seg_len
            .checked_mul(factor)
            .ok_or_else(|| PrimeError::InvalidArgument("duplicate_segment overflow".to_string()))?;
        if start + total > self.size {
            return Err(PrimeError::InvalidArgument(
                "duplicate_segment out of bounds: total length exceeds bitmap size".to_string(),
            ));
        }
        let snapshot = self.clone();
        let mut cursor = start + seg_len;
        for _ in 1..factor {
            self.copy(cursor, &snapshot, start, seg_len);
            cursor += seg_len;
        }
        Ok(())
    }

    /// SHA-256 over the packed bytes of the first `ceil(size / 8)` bytes.
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(&self.data[..byte_len(self.size)]);
        hasher.finalize().into()
    }

    /// Serialize as `[ size (u64 LE) | packed bytes | 32-byte SHA-256 ]`
    /// to `<path>.bitmap`.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let full = path.with_extension(BITMAP_EXT);
        let mut file = std::fs::File::create(&full)?;
        file.write_all(&(self.size as u64).to_le_bytes())?;
        file.write_all(&self.data[..byte_len(self.size)])?;
        file.write_all(&self.hash())?;
        Ok(())
    }

    /// Deserialize from `<path>.bitmap`, rejecting on digest mismatch.
    pub fn read_file(path: &Path) -> Result<Bitmap> {
        let full = path.with_extension(BITMAP_EXT);
        let mut file = std::fs::File::open(&full)?;

        let mut size_buf = [0u8; 8];
        file.read_exact(&mut size_buf)?;
        let size = u64::from_le_bytes(size_buf) as usize;

        let mut bitmap = Bitmap::create(size)?;
        file.read_exact(&mut bitmap.data[..byte_len(size)])?;

        let mut stored_hash = [0u8; 32];
        file.read_exact(&mut stored_hash)?;

        let actual_hash = bitmap.hash();
        if actual_hash != stored_hash {
            return Err(PrimeError::IntegrityFailure {
                expected: hex::encode(stored_hash),
                actual: hex::encode(actual_hash),
            });
        }
        Ok(bitmap)
    }
}

/// Minimal hex encoding, avoiding a dependency purely for error messages.
mod hex {
    pub fn encode(bytes: [u8; 32]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
