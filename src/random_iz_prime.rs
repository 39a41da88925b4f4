//! # Random iZ Prime — Multi-Process Probable-Prime Search
//!
//! Multi-process random probable-prime search: pick a random `x` coprime
//! to `vx` on the chosen lane, then walk `p += vx` until Miller-Rabin
//! calls it probably prime. With more than one worker, `fork` independent
//! processes that each run the same search and race a `pipe` back to the
//! parent; the parent takes the first complete candidate and `SIGTERM`s
//! the rest.

use crate::config::Config;
use crate::iz::{gmp_compute_max_vx, Lane};
use crate::error::{PrimeError, Result};
use crate::vx6::warm_caches;
use rug::integer::IsPrime;
use rug::rand::RandState;
use rug::Integer;

/// Raw file descriptor type alias, matching `libc`'s own `c_int` rather than
/// pulling in `std::os::fd` for a single local use.
#[cfg(unix)]
type Fd = libc::c_int;

/// `6x + lane`, without `iz::iz_gmp`'s `x > 0` precondition — the random
/// draw in [`set_random_base`] can legitimately land on `x == 0` before the
/// coprime walk below corrects it. The public `x > 0` contract on
/// `iz::iz_gmp` applies to inputs callers hand the library, not this
/// internal seed step.
fn raw_iz(x: &Integer, lane: Lane) -> Integer {
    Integer::from(x * 6) + lane.value()
}

/// Seed a GMP random state from OS entropy (`rand::random`).
fn seeded_rand_state() -> RandState<'static> {
    let mut state = RandState::new();
    let mut seed = Integer::new();
    for _ in 0..4 {
        seed <<= 64u32;
        seed |= Integer::from(rand::random::<u64>());
    }
    state.seed(&seed);
    state
}

/// Draw a uniform random `x` in `[0, vx)`, set `p = iZ(x, lane)`, then walk
/// `p` forward in steps of 6 (incrementing `x` by 1) until `gcd(vx, p) == 1`
/// or `coprime_search_limit` steps pass, whichever comes first. Finally add
/// `vx` once, to skip the row where `x` could still coincide with a
/// small-prime multiple.
pub fn set_random_base(lane: Lane, vx: &Integer, config: &Config) -> Integer {
    let mut rng = seeded_rand_state();
    let x = vx.clone().random_below(&mut rng);
    let mut p = raw_iz(&x, lane);

    for _ in 0..config.coprime_search_limit {
        p += 6;
        if Integer::from(vx.gcd_ref(&p)) == 1 {
            break;
        }
    }

    p += vx;
    p
}

/// Walk `p += vx` testing Miller-Rabin until a probable prime is found or
/// `attempts_limit` attempts are exhausted, in which case the search
/// restarts from a fresh [`set_random_base`] draw. Looping here instead
/// of recursing keeps the restart from growing the call stack.
pub fn search_p_in_iz_m(lane: Lane, vx: &Integer, config: &Config) -> Integer {
    loop {
        let mut p = set_random_base(lane, vx, config);

        for _ in 0..config.attempts_limit {
            p += vx;
            if p.is_probably_prime(config.mr_rounds) != IsPrime::No {
                return p;
            }
        }

        // PrimeError::SearchExhausted: logged and retried, never
        // returned to the caller.
        tracing::debug!(
            attempts = config.attempts_limit,
            "search_p_in_iz_m exhausted attempts_limit, restarting"
        );
    }
}

/// Generate a random probable prime of the requested bit size on `lane`,
/// using `workers` OS processes in parallel when `workers > 1`.
pub fn random_iz_prime(lane: Lane, bit_size: u32, config: &Config, workers: u32) -> Result<Integer> {
    let cached_primes = crate::vx6::cached_prime_list();
    // Skip the 2, 3 entries: gmp_compute_max_vx starts the primorial at 5.
    let vx = gmp_compute_max_vx(&cached_primes.as_slice()[2..], bit_size);

    if workers < 2 {
        return Ok(search_p_in_iz_m(lane, &vx, config));
    }

    fork_search(lane, &vx, config, workers)
}

/// Multi-worker search relies on OS-level processes with isolated address
/// spaces, so it has no supported implementation outside POSIX; a caller
/// on a non-Unix target should request a single worker.
#[cfg(not(unix))]
fn fork_search(_lane: Lane, _vx: &Integer, _config: &Config, _workers: u32) -> Result<Integer> {
    Err(PrimeError::InvalidArgument(
        "multi-worker random_iz_prime requires a Unix target".to_string(),
    ))
}

#[cfg(unix)]
fn fork_search(lane: Lane, vx: &Integer, config: &Config, workers: u32) -> Result<Integer> {
    let mut fds: [Fd; 2] = [0; 2];
    // SAFETY: `fds` is a valid, appropriately-sized out-param for `pipe(2)`.
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if rc != 0 {
        return Err(PrimeError::IoFailure(std::io::Error::last_os_error()));
    }
    let (read_fd, write_fd) = (fds[0], fds[1]);

    let mut child_pids = Vec::with_capacity(workers as usize);

    for _ in 0..workers {
        // SAFETY: `fork(2)` is called with no other threads active in this
        // process at this point in the call graph; the child immediately
        // performs a bounded, self-contained computation and exits without
        // returning across this function's stack frame.
        let pid = unsafe { libc::fork() };
        match pid.cmp(&0) {
            std::cmp::Ordering::Less => {
                return Err(PrimeError::IoFailure(std::io::Error::last_os_error()));
            }
            std::cmp::Ordering::Equal => {
                // Child: does not use the read end, and never initializes
                // the vx6 caches inherited from the parent's fork image —
                // it re-derives its own.
                // SAFETY: `read_fd` is a valid fd this child holds sole
                // post-fork ownership of; closing it is always sound.
                unsafe {
                    libc::close(read_fd);
                }
                warm_caches();
                let candidate = search_p_in_iz_m(lane, vx, config);
                let mut bytes = candidate.to_string().into_bytes();
                bytes.push(0); // NUL terminator
                // SAFETY: `write_fd` is this child's valid write end;
                // `bytes` outlives the call and the pointer/length pair
                // describes exactly its contents.
                unsafe {
                    libc::write(write_fd, bytes.as_ptr() as *const libc::c_void, bytes.len());
                    libc::close(write_fd);
                }
                std::process::exit(0);
            }
            std::cmp::Ordering::Greater => {
                child_pids.push(pid);
            }
        }
    }

    // SAFETY: the parent never writes to the pipe; closing its copy of the
    // write end is required so `read` below observes EOF once every child
    // has exited without producing a candidate.
    unsafe {
        libc::close(write_fd);
    }

    let buf_size = config.ipc_buffer_size(bit_size_of(vx));
    let candidate = read_first_candidate(read_fd, buf_size);

    // SAFETY: `read_fd` is the parent's valid read end, not used again
    // after this point.
    unsafe {
        libc::close(read_fd);
    }

    for &pid in &child_pids {
        // SAFETY: `pid` is a child of this process that has not yet been
        // reaped; sending SIGTERM to a process we own is always sound.
        unsafe {
            libc::kill(pid, libc::SIGTERM);
            libc::waitpid(pid, std::ptr::null_mut(), 0);
        }
    }

    let decimal = candidate.ok_or_else(|| {
        PrimeError::IoFailure(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "no worker produced a candidate before the pipe closed",
        ))
    })?;

    Integer::from_str_radix(&decimal, 10)
        .map_err(|_| PrimeError::InvalidArgument("worker candidate was not a decimal integer".to_string()))
}

fn bit_size_of(vx: &Integer) -> u32 {
    vx.significant_bits()
}

/// Read until the first NUL-terminated candidate is available, tolerating
/// (discarding) any truncated trailing bytes a worker killed mid-write left
/// behind.
#[cfg(unix)]
fn read_first_candidate(read_fd: Fd, buf_size: usize) -> Option<String> {
    let mut collected: Vec<u8> = Vec::new();
    let mut chunk = vec![0u8; buf_size.max(64)];

    loop {
        // SAFETY: `chunk` is a valid, appropriately-sized buffer for
        // `read(2)`; `read_fd` is the parent's open read end.
        let n = unsafe {
            libc::read(
                read_fd,
                chunk.as_mut_ptr() as *mut libc::c_void,
                chunk.len(),
            )
        };
        if n <= 0 {
            break;
        }
        collected.extend_from_slice(&chunk[..n as usize]);
        if let Some(pos) = collected.iter().position(|&b| b == 0) {
            return String::from_utf8(collected[..pos].to_vec()).ok();
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_iz_matches_lane_formula() {
        assert_eq!(raw_iz(&Integer::from(3), Lane::Minus), Integer::from(17));
        assert_eq!(raw_iz(&Integer::from(3), Lane::Plus), Integer::from(19));
        assert_eq!(raw_iz(&Integer::from(0), Lane::Plus), Integer::from(1));
    }

    #[test]
    fn set_random_base_is_coprime_to_vx() {
        let config = Config::default();
        let vx = Integer::from(5 * 7 * 11 * 13u64);
        for lane in [Lane::Minus, Lane::Plus] {
            for _ in 0..20 {
                let p = set_random_base(lane, &vx, &config);
                assert_eq!(Integer::from(vx.gcd_ref(&p)), 1);
            }
        }
    }

    #[test]
    fn set_random_base_stays_on_requested_lane() {
        let config = Config::default();
        let vx = Integer::from(5 * 7 * 11u64);
        for lane in [Lane::Minus, Lane::Plus] {
            let p = set_random_base(lane, &vx, &config);
            let expected = if lane == Lane::Minus { 5 } else { 1 };
            assert_eq!(Integer::from(&p % 6u32), Integer::from(expected));
        }
    }

    // Single-worker path: search_p_in_iz_m must
    // return a value that is actually probably prime and on the right lane.
    #[test]
    fn search_p_in_iz_m_returns_a_probable_prime_on_the_right_lane() {
        let config = Config {
            attempts_limit: 2_000,
            ..Config::default()
        };
        let vx = Integer::from(5 * 7 * 11 * 13u64);
        for lane in [Lane::Minus, Lane::Plus] {
            let p = search_p_in_iz_m(lane, &vx, &config);
            assert_ne!(p.is_probably_prime(40), IsPrime::No);
            let expected = if lane == Lane::Minus { 5 } else { 1 };
            assert_eq!(Integer::from(&p % 6u32), Integer::from(expected));
        }
    }

    #[test]
    #[cfg(unix)]
    fn random_iz_prime_single_worker_matches_search_p_in_iz_m_contract() {
        let config = Config {
            mr_rounds: 25,
            ..Config::default()
        };
        let p = random_iz_prime(Lane::Plus, 64, &config, 1).unwrap();
        assert_ne!(p.is_probably_prime(40), IsPrime::No);
        assert_eq!(Integer::from(&p % 6u32), Integer::from(1));
    }

    #[test]
    #[cfg(unix)]
    fn random_iz_prime_multi_worker_finds_a_probable_prime() {
        let config = Config {
            mr_rounds: 25,
            ..Config::default()
        };
        let p = random_iz_prime(Lane::Minus, 48, &config, 3).unwrap();
        assert_ne!(p.is_probably_prime(40), IsPrime::No);
        assert_eq!(Integer::from(&p % 6u32), Integer::from(5));
    }
}
