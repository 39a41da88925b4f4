//! # iZ — Lane Arithmetic and Wheel Construction
//!
//! Arithmetic over the iZ lanes: `iZ(x, lane) = 6x + lane`, wheel
//! construction, and the congruence solvers the segmented sieve and
//! vx6 block sieve both depend on.

use crate::bitmap::Bitmap;
use crate::error::{PrimeError, Result};
use rug::Integer;

/// Which of the two iZ lanes a value belongs to: `iZ-` = `6x - 1`,
/// `iZ+` = `6x + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Minus,
    Plus,
}

impl Lane {
    pub fn value(self) -> i64 {
        match self {
            Lane::Minus => -1,
            Lane::Plus => 1,
        }
    }
}

/// Small primes below 100, skipping 2 and 3 (the only primes not on
/// either iZ lane). Used both to grow the wheel in
/// `construct_iz_m_segment` and to pick `vx` in `compute_limited_vx`.
pub const SMALL_PRIMES: [u64; 23] = [
    5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// `6x + lane`. `x` must be greater than 0.
pub fn iz(x: u64, lane: Lane) -> Result<u64> {
    if x == 0 {
        return Err(PrimeError::InvalidArgument("x must be greater than 0".to_string()));
    }
    let six_x = x
        .checked_mul(6)
        .ok_or_else(|| PrimeError::InvalidArgument("6 * x overflows u64".to_string()))?;
    Ok(if lane == Lane::Plus { six_x + 1 } else { six_x - 1 })
}

/// Arbitrary-precision `6x + lane`.
pub fn iz_gmp(x: &Integer, lane: Lane) -> Result<Integer> {
    if x.cmp0() != std::cmp::Ordering::Greater {
        return Err(PrimeError::InvalidArgument("x must be greater than 0".to_string()));
    }
    let six_x = Integer::from(x * 6);
    Ok(if lane == Lane::Plus { six_x + 1 } else { six_x - 1 })
}

/// Map `p`'s residue to the x-index used in the matrix `matrix_id`
/// belongs to: `x_p` if `p` is on that same lane, `p - x_p` if it's on
/// the other one.
pub fn normalized_xp(matrix_id: Lane, p: u64) -> u64 {
    let x_p = (p + 1) / 6;
    let p_is_plus = p % 6 == 1;
    match (matrix_id, p_is_plus) {
        (Lane::Minus, false) => x_p,
        (Lane::Minus, true) => p - x_p,
        (Lane::Plus, true) => x_p,
        (Lane::Plus, false) => p - x_p,
    }
}

/// Smallest `x` such that `(x + vx * y) % p == normalized_xp(matrix_id, p)`,
/// for `y < 2^64`.
///
/// Relies on wrapping unsigned subtraction before the `% p` reduction
/// (`vx * y` is frequently smaller than `x_p` when `y` is small) — the
/// final result is the same either way since the wraparound amount is
/// itself `≡ -x_p (mod 2^64)`, and taking `% p` after is what actually
/// matters.
pub fn solve_for_x(matrix_id: Lane, p: u64, vx: u64, y: u64) -> u64 {
    let x_p = normalized_xp(matrix_id, p);
    let rem = vx.wrapping_mul(y).wrapping_sub(x_p) % p;
    p - rem
}

/// Same as [`solve_for_x`] but for `y >= 2^64`.
pub fn solve_for_x_gmp(matrix_id: Lane, p: u64, vx: u64, y: &Integer) -> u64 {
    let x_p = normalized_xp(matrix_id, p);
    let tmp = Integer::from(y * vx) - x_p;
    let rem = tmp.rem_euc(p);
    p - rem.to_u64_wrapping()
}

/// Smallest `y` such that `(x + vx * y) % p == normalized_xp(matrix_id, p)`.
///
/// Returns [`PrimeError::NoSolution`] when `gcd(vx, p) != 1` (here
/// reduced to `vx % p == 0` since `p` is always prime in this crate's
/// call sites).
pub fn solve_for_y(matrix_id: Lane, p: u64, vx: u64, x: u64) -> Result<u64> {
    if vx % p == 0 {
        return Err(PrimeError::NoSolution);
    }

    let x_p = normalized_xp(matrix_id, p);
    if x % p == x_p {
        return Ok(0);
    }

    let p_i = p as i64;
    let delta = (x_p as i64 - x as i64).rem_euclid(p_i);
    let vx_inv = modular_inverse(vx as i64 % p_i, p_i);
    let y = ((delta as i128 * vx_inv as i128) % p_i as i128) as u64;
    Ok(y)
}

/// Extended Euclidean algorithm: the multiplicative inverse of `a` mod `m`.
pub fn modular_inverse(a: i64, m: i64) -> i64 {
    if m == 1 {
        return 0;
    }
    let (m0, mut a, mut m) = (m, a, m);
    let (mut x0, mut x1) = (0i64, 1i64);

    while a > 1 {
        let q = a / m;
        let t = m;
        m = a % m;
        a = t;
        let t = x0;
        x0 = x1 - q * x0;
        x1 = t;
    }

    if x1 < 0 {
        x1 += m0;
    }
    x1
}

/// Arbitrary-precision multiplicative inverse of `a` mod `m`.
pub fn modular_inverse_gmp(a: &Integer, m: &Integer) -> Integer {
    if *m == 1 {
        return Integer::from(0);
    }
    match a.clone().invert(m) {
        Ok(inv) => inv,
        Err(_) => Integer::from(0),
    }
}

/// Set the bits of the minimal wheel (`vx = 35 = 5*7`) in `x5`/`x7`:
/// clear indices that are `1 mod 5` or `-1 mod 7` from `x5`, and `-1 mod
/// 5` or `1 mod 7` from `x7`.
pub fn construct_vx2(x5: &mut Bitmap, x7: &mut Bitmap) {
    for i in 1..=35u64 {
        if (i - 1) % 5 != 0 && (i + 1) % 7 != 0 {
            x5.set(i as usize);
        }
        if (i + 1) % 5 != 0 && (i - 1) % 7 != 0 {
            x7.set(i as usize);
        }
    }
}

/// Build a pre-sieved iZm segment of size `vx`: `x5`/`x7` must already
/// be zeroed bitmaps of at least `vx + 1` bits. Marks composites of
/// every prime in [`SMALL_PRIMES`] that divides `vx`, by repeatedly
/// duplicating the current pattern `p` times and then clearing `p`'s own
/// multiples in the newly extended region (the Xp-Wheel).
pub fn construct_iz_m_segment(vx: u64, x5: &mut Bitmap, x7: &mut Bitmap) -> Result<()> {
    let mut current_size: u64 = 35;
    construct_vx2(x5, x7);

    let mut idx = 2; // skip 5, 7 — already folded into construct_vx2
    while idx < SMALL_PRIMES.len() && vx % SMALL_PRIMES[idx] == 0 {
        let p = SMALL_PRIMES[idx];
        idx += 1;

        let x = (p + 1) / 6;

        x5.duplicate_segment(1, current_size as usize, p as usize)?;
        x7.duplicate_segment(1, current_size as usize, p as usize)?;
        current_size *= p;

        if p % 6 > 1 {
            x5.clear_mod_p(p, x, current_size + 1);
            x7.clear_mod_p(p, p * x - x, current_size + 1);
        } else {
            x5.clear_mod_p(p, p * x - x, current_size + 1);
            x7.clear_mod_p(p, x, current_size + 1);
        }
    }
    Ok(())
}

/// Pick the largest `vx = 35 * (product of further [`SMALL_PRIMES`])`
/// such that `vx * next_prime < x_n / 2`, absorbing at most `vx_limit`
/// primes total.
pub fn compute_limited_vx(x_n: u64, vx_limit: usize) -> u64 {
    let mut vx: u64 = 35;
    let mut i = 2; // skip 5, 7
    while i < vx_limit && i < SMALL_PRIMES.len() && vx * SMALL_PRIMES[i] < x_n / 2 {
        vx *= SMALL_PRIMES[i];
        i += 1;
    }
    vx
}

/// Closest `vx` (product of consecutive [`SMALL_PRIMES`] starting at 5)
/// whose bit length is just under `bit_size`, computed from a cached
/// prime list rather than the hardcoded `SMALL_PRIMES` table so it can
/// grow past 97 for very large bit sizes.
pub fn gmp_compute_max_vx(cached_primes: &[u64], bit_size: u32) -> Integer {
    let mut vx = Integer::from(cached_primes[0]);
    let mut i = 0;
    while vx.significant_bits() < bit_size {
        i += 1;
        vx *= cached_primes[i];
    }
    vx /= cached_primes[i];
    vx
}

/// One row of the search-space statistics `analyze_vx_potential_primes`
/// reports per wheel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneStatistics {
    pub vx: u64,
    pub minus_primes: u64,
    pub plus_primes: u64,
    pub total_primes: u64,
    pub twin_primes: u64,
    pub cousin_primes: u64,
    pub sexy_primes: u64,
}

impl std::fmt::Display for LaneStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First column is "Range": the count of natural numbers this wheel
        // size covers, 6 * vx, not the raw x-index bound vx itself.
        write!(
            f,
            "| {:<12}| {:<8}|{:<8}| {:<12}| {:<12}| {:<12}| {:<12}",
            self.vx * 6,
            self.minus_primes,
            self.plus_primes,
            self.total_primes,
            self.twin_primes,
            self.cousin_primes,
            self.sexy_primes
        )
    }
}

/// The 92-dash rule line bracketing a vx-statistics table.
fn rule_line() -> String {
    format!("\n{}\n", "-".repeat(92))
}

/// Column-header row for a table of [`LaneStatistics`] rows: `Range`, `iZ-`,
/// `iZ+`, `#(Primes)`, `#(Twins)`, `#(Cousins)`, `#(Sexy)`, bracketed by the
/// same rule line each row is implicitly printed between.
pub fn lane_statistics_header() -> String {
    format!(
        "{rule}| {:<12}| {:<8}|{:<8}| {:<12}| {:<12}| {:<12}| {:<12}{rule}",
        "Range",
        "iZ-",
        "iZ+",
        "#(Primes)",
        "#(Twins)",
        "#(Cousins)",
        "#(Sexy)",
        rule = rule_line()
    )
}

/// Report prime/twin/cousin/sexy-prime counts in each wheel
/// `5, 5*7, 5*7*11, ...` up to `max_vx` (inclusive), one row per size.
///
/// A full production run would use the product of the first 8 primes in
/// [`SMALL_PRIMES`] (~1.08e9, ~135 MiB of bitmaps); `max_vx` is a
/// parameter here so the same routine can be exercised cheaply in tests.
pub fn analyze_vx_potential_primes(max_vx: u64) -> Result<Vec<LaneStatistics>> {
    let mut x5 = Bitmap::create(max_vx as usize + 100)?;
    let mut x7 = Bitmap::create(max_vx as usize + 100)?;

    x5.set_all();
    x7.set_all();
    x5.clear(0);
    x7.clear(0);
    x5.clear(1);
    x7.clear(4);

    let mut current_size: u64 = 5;
    let mut rows = Vec::new();

    let mut idx = 1; // skip 5
    while idx < SMALL_PRIMES.len() && max_vx % SMALL_PRIMES[idx] == 0 {
        let p = SMALL_PRIMES[idx];
        idx += 1;

        let x_p = (p + 1) / 6;

        x5.duplicate_segment(1, current_size as usize, p as usize)?;
        x7.duplicate_segment(1, current_size as usize, p as usize)?;
        current_size *= p;

        if p % 6 > 1 {
            x5.clear_mod_p(p, x_p, current_size + 1);
            x7.clear_mod_p(p, p * x_p - x_p, current_size + 1);
        } else {
            x5.clear_mod_p(p, p * x_p - x_p, current_size + 1);
            x7.clear_mod_p(p, x_p, current_size + 1);
        }

        rows.push(lane_statistics(current_size, &x5, &x7));
    }

    Ok(rows)
}

/// Count primes, twins, cousins, and sexy primes across `[1, vx]` in a
/// pair of sieved lane bitmaps.
pub fn lane_statistics(vx: u64, x5: &Bitmap, x7: &Bitmap) -> LaneStatistics {
    let mut minus_primes = 0;
    let mut plus_primes = 0;
    let mut twin_primes = 0;
    let mut cousin_primes = 0;
    let mut sexy_primes = 0;

    for x in 1..=vx as usize {
        let in5 = x5.get(x);
        let in7 = x7.get(x);
        if in5 {
            minus_primes += 1;
        }
        if in7 {
            plus_primes += 1;
        }
        if in5 && in7 {
            twin_primes += 1;
        }
        if in5 && x7.get(x - 1) {
            cousin_primes += 1;
        }
        if in5 && x5.get(x - 1) {
            sexy_primes += 1;
        }
        if in7 && x7.get(x - 1) {
            sexy_primes += 1;
        }
    }

    LaneStatistics {
        vx,
        minus_primes,
        plus_primes,
        total_primes: minus_primes + plus_primes,
        twin_primes,
        cousin_primes,
        sexy_primes,
    }
}
