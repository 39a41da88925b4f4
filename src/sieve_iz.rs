//! # Sieve-iZ — Full-Range Lane Sieve
//!
//! Full-range sieve over the iZ lanes. Builds one pair of bitmaps sized
//! `n/6`, marks composites of every self-discovered root prime as it
//! goes, and emits results in ascending order of `x` (2, 3 first, then
//! interleaved `iZ-`/`iZ+` per `x`).

use crate::bitmap::Bitmap;
use crate::iz::{iz, Lane};
use crate::prime_list::PrimeList;
use crate::error::Result;

/// Crude prime-counting estimate `n / ln(n)`, used only to pre-size the
/// output `PrimeList`.
pub(crate) fn pi_n(n: u64) -> u64 {
    if n < 2 {
        return 1;
    }
    ((n as f64) / (n as f64).ln()) as u64
}

/// Sieve every prime up to and including `n` using the iZ lanes.
pub fn sieve_iz(n: u64) -> Result<PrimeList> {
    let estimate = ((pi_n(n.max(2)) as f64) * 1.5).max(4.0) as usize;
    let mut primes = PrimeList::init(estimate)?;

    primes.append(2);
    primes.append(3);

    let x_n = (n + 1) / 6 + 1;

    let mut x5 = Bitmap::create(x_n as usize + 1)?;
    let mut x7 = Bitmap::create(x_n as usize + 1)?;
    x5.set_all();
    x7.set_all();

    let n_sqrt = (n as f64).sqrt() as u64 + 1;

    for x in 1..x_n {
        if x5.get(x as usize) {
            let z = iz(x, Lane::Minus)?;
            primes.append(z);

            if z < n_sqrt {
                x5.clear_mod_p(z, z * x + x, x_n);
                x7.clear_mod_p(z, z * x - x, x_n);
            }
        }

        if x7.get(x as usize) {
            let z = iz(x, Lane::Plus)?;
            primes.append(z);

            if z < n_sqrt {
                x5.clear_mod_p(z, z * x - x, x_n);
                x7.clear_mod_p(z, z * x + x, x_n);
            }
        }
    }

    // Output is strictly ascending, so at most the final entry can
    // overshoot n.
    if primes.as_slice().last().is_some_and(|&p| p > n) {
        primes.drop_last();
    }

    primes.trim();
    Ok(primes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_primes(n: u64) -> Vec<u64> {
        (2..=n)
            .filter(|&k| k > 1 && (2..=((k as f64).sqrt() as u64).max(1)).all(|d| k % d != 0))
            .collect()
    }

    // sieve_iz must match trial division for
    // small n.
    #[test]
    fn sieve_iz_matches_brute_force_for_small_n() {
        for n in [10u64, 50, 100, 997, 1000] {
            let mut got = sieve_iz(n).unwrap().as_slice().to_vec();
            got.sort_unstable();
            let expected = brute_force_primes(n);
            assert_eq!(got, expected, "n={n}");
        }
    }

    #[test]
    fn sieve_iz_excludes_primes_beyond_n() {
        let primes = sieve_iz(30).unwrap();
        assert!(primes.as_slice().iter().all(|&p| p <= 30));
        assert!(primes.as_slice().contains(&29));
    }

    #[test]
    fn sieve_iz_output_is_strictly_ascending() {
        let primes = sieve_iz(2000).unwrap();
        let s = primes.as_slice();
        for w in s.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn sieve_iz_only_emits_2_3_and_6x_pm_1() {
        let primes = sieve_iz(500).unwrap();
        for &p in primes.as_slice() {
            assert!(p == 2 || p == 3 || p % 6 == 1 || p % 6 == 5, "p={p}");
        }
    }
}
