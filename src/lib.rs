//! # izprime — sieves and a random probable-prime search over the iZ lanes
//!
//! Every integer other than 2 and 3 is either `6x - 1` or `6x + 1` for some
//! `x > 0`. This crate calls those two residue classes the **iZ lanes**
//! (`iZ-` and `iZ+`) and builds everything — sieving, wheel construction,
//! and a multi-process random-prime search — around walking `x` on one or
//! both lanes instead of walking every integer.
//!
//! ## Module organization
//!
//! Dependency order, leaves first:
//!
//! - [`bitmap`] — dense bit array with bulk set/clear/copy and a SHA-256
//!   content digest.
//! - [`prime_list`] — growable ordered sequence of `u64` primes with the
//!   same digest/file-format contract.
//! - [`iz`] — the `iZ(x, lane) = 6x + lane` mapping, wheel construction
//!   (`construct_iz_m_segment`), and the congruence solvers
//!   (`solve_for_x`/`solve_for_y`/`modular_inverse`) every sieve below is
//!   built on.
//! - [`sieve_iz`] — full-range lane sieve: every prime up to `n`.
//! - [`sieve_izm`] — the same result, segmented with a reusable wheel of
//!   size `vx`.
//! - [`vx6`] — sieves exactly one primorial block `[6*vx6*y, 6*vx6*(y+1))`
//!   at a time, falling back to Miller-Rabin past the reach of small-prime
//!   trial division, and records results as a prime-gap sequence.
//! - [`random_iz_prime`] — parallel (fork/pipe) search for a random
//!   probable prime of a requested bit size on a chosen lane.
//!
//! ## Ambient modules
//!
//! - [`error`] — the typed [`error::PrimeError`] every public, fallible
//!   operation returns.
//! - [`config`] — caller-provided or heuristic tunables: Miller-Rabin
//!   rounds, wheel size limits, search attempt limits, IPC buffer sizing,
//!   output directory conventions.
//! - [`logging`] — an opt-in `tracing_subscriber` setup for embedding
//!   applications; this crate never installs a subscriber on its own.
//!
//! ## Non-goals
//!
//! No deterministic primality proof, no distributed execution across
//! hosts, no streaming unbounded sieves, no thread-level parallelism
//! inside a single sieve. `random_iz_prime`'s only concurrency is OS
//! processes, not threads.

pub mod bitmap;
pub mod config;
pub mod error;
pub mod iz;
pub mod logging;
pub mod prime_list;
pub mod random_iz_prime;
pub mod sieve_iz;
pub mod sieve_izm;
pub mod vx6;

pub use config::Config;
pub use error::{PrimeError, Result};
pub use iz::Lane;
