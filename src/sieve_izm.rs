//! # Sieve-iZm — Segmented Lane Sieve With a Reusable Wheel
//!
//! Segmented sieve over the iZ lanes, reusing a pre-sieved wheel of
//! size `vx` across every segment.

use crate::bitmap::Bitmap;
use crate::error::Result;
use crate::iz::{compute_limited_vx, construct_iz_m_segment, iz, solve_for_x, Lane, SMALL_PRIMES};
use crate::prime_list::PrimeList;
use crate::sieve_iz::pi_n;

/// Sieve every prime up to and including `n`, pre-sieving a wheel of
/// size `vx` (capped at `vx_limit` absorbed primes) and reusing it
/// across `ceil(x_n / vx)` segments.
pub fn sieve_izm(n: u64, vx_limit: usize) -> Result<PrimeList> {
    let x_n = (n + 1) / 6 + 1;

    let estimate = ((pi_n(n.max(2)) as f64) * 1.5).max(4.0) as usize;
    let mut primes = PrimeList::init(estimate)?;
    primes.append(2);
    primes.append(3);

    let vx = compute_limited_vx(x_n, vx_limit);

    // Record which small primes got folded into the wheel so we skip
    // re-testing them as "root primes" below (start_i).
    let mut start_i = 2; // primes list already holds 2, 3
    for i in 0..vx_limit.min(SMALL_PRIMES.len()) {
        if vx % SMALL_PRIMES[i] == 0 {
            primes.append(SMALL_PRIMES[i]);
            start_i += 1;
        } else {
            break;
        }
    }

    let mut x5 = Bitmap::create(vx as usize + 10)?;
    let mut x7 = Bitmap::create(vx as usize + 10)?;
    construct_iz_m_segment(vx, &mut x5, &mut x7)?;

    // First segment: collect root primes directly from the wheel while
    // marking their own composites within it.
    let mut tmp5 = x5.clone();
    let mut tmp7 = x7.clone();

    for x in 2..=vx {
        if tmp5.get(x as usize) {
            let p = iz(x, Lane::Minus)?;
            primes.append(p);
            if (p * p) / 6 < vx {
                tmp5.clear_mod_p(p, p * x + x, vx);
                tmp7.clear_mod_p(p, p * x - x, vx);
            }
        }

        if tmp7.get(x as usize) {
            let p = iz(x, Lane::Plus)?;
            primes.append(p);
            if (p * p) / 6 < vx {
                tmp5.clear_mod_p(p, p * x - x, vx);
                tmp7.clear_mod_p(p, p * x + x, vx);
            }
        }
    }

    // Remaining segments: clone the pristine wheel, mark composites of
    // every root prime found so far that still has composites in range,
    // and collect survivors.
    let max_y = x_n / vx;
    let mut limit = vx;

    for y in 1..=max_y {
        let mut tmp5 = x5.clone();
        let mut tmp7 = x7.clone();

        if y == max_y {
            limit = x_n % vx;
            if limit == 0 {
                continue;
            }
        }

        for i in start_i..primes.len() {
            let p = primes.as_slice()[i];
            if (p * p) / 6 > y * vx + limit {
                break;
            }

            let xp5 = solve_for_x(Lane::Minus, p, vx, y);
            let xp7 = solve_for_x(Lane::Plus, p, vx, y);
            tmp5.clear_mod_p(p, xp5, limit);
            tmp7.clear_mod_p(p, xp7, limit);
        }

        let yvx = y * vx;
        for x in 1..=limit {
            if tmp5.get(x as usize) {
                primes.append(iz(x + yvx, Lane::Minus)?);
            }
            if tmp7.get(x as usize) {
                primes.append(iz(x + yvx, Lane::Plus)?);
            }
        }
    }

    // The first segment always covers a full wheel of size vx regardless
    // of n, so (unlike sieve_iz) more than one trailing entry can
    // overshoot — hence a `while` here instead of a single `if`.
    while primes.as_slice().last().is_some_and(|&p| p > n) {
        primes.drop_last();
    }
    primes.trim();

    Ok(primes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sieve_iz::sieve_iz;

    // sieve_izm must match sieve_iz exactly
    // for every n in a representative range, for every tested vx_limit.
    #[test]
    fn sieve_izm_matches_sieve_iz_across_vx_limits() {
        for &n in &[50u64, 200, 1_000, 5_000, 20_000] {
            let reference = sieve_iz(n).unwrap().as_slice().to_vec();
            for vx_limit in [1usize, 2, 3, 6] {
                let mut got = sieve_izm(n, vx_limit).unwrap().as_slice().to_vec();
                got.sort_unstable();
                assert_eq!(got, reference, "n={n} vx_limit={vx_limit}");
            }
        }
    }

    #[test]
    fn sieve_izm_output_is_strictly_ascending() {
        let primes = sieve_izm(20_000, 6).unwrap();
        let s = primes.as_slice();
        for w in s.windows(2) {
            assert!(w[0] < w[1], "{:?}", w);
        }
    }

    #[test]
    fn sieve_izm_handles_n_smaller_than_vx() {
        // n small enough that x_n < the wheel built for vx_limit=6.
        let got = sieve_izm(40, 6).unwrap();
        let reference = sieve_iz(40).unwrap();
        let mut got_sorted = got.as_slice().to_vec();
        got_sorted.sort_unstable();
        assert_eq!(got_sorted, reference.as_slice());
    }
}
