use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use chrono::Local;
use num::Integer;
use num_bigint::{BigInt, Sign};
use num_traits::*;
use rand::{CryptoRng, RngCore};
use crate::rsa::config::silent;
use crate::RSA;

/// Returned in place of a prime when the linear scan runs out of budget.
/// Never usable as a modulus factor.
pub const FALLBACK_PRIME: u32 = 2;

pub enum PrimeError {
    Exhausted(u64),
    Rng(rand::Error),
    NotInvertible(BigInt),
}

impl PrimeError {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimeError::Exhausted(limit) => write!(f, "Prime search gave up after {} attempts", limit),
            PrimeError::Rng(e) => write!(f, "Secure random source failed: {}", e),
            PrimeError::NotInvertible(e) => write!(f, "Exponent {} has no inverse modulo phi", e),
        }
    }
}

impl Display for PrimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.display(f)
    }
}

impl Debug for PrimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.display(f)
    }
}

impl Error for PrimeError {}

impl From<rand::Error> for PrimeError {
    fn from(e: rand::Error) -> Self {
        PrimeError::Rng(e)
    }
}

/// Outcome of a prime search. `Degraded` carries [`FALLBACK_PRIME`].
#[derive(Debug, Clone, PartialEq)]
pub enum PrimeSearch {
    Prime(BigInt),
    Degraded(BigInt),
}

impl PrimeSearch {
    pub fn value(&self) -> &BigInt {
        match self {
            PrimeSearch::Prime(v) | PrimeSearch::Degraded(v) => v
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, PrimeSearch::Degraded(_))
    }

    pub fn prime(self) -> Option<BigInt> {
        match self {
            PrimeSearch::Prime(v) => Some(v),
            PrimeSearch::Degraded(_) => None,
        }
    }
}

impl RSA {
    /// `a^q mod n` by repeated squaring. `q` must be non-negative.
    pub fn fast_modular_exponent(a: &BigInt, q: &BigInt, n: &BigInt) -> BigInt {
        let mut r: BigInt = One::one();
        let mut a = a % n;
        let mut q = q.clone();
        while !q.is_zero() {
            if q.bit(0) { r = (r * &a) % n; }
            q >>= 1;
            a = (&a * &a) % n;
        }
        r % n
    }

    /// Probabilistic primality test with `rounds` random witnesses.
    ///
    /// Without `strict` a trial only checks `a^D mod N` against `1` and `N-1`
    /// and skips the squaring steps of Miller-Rabin. Every witness it accepts
    /// the full test accepts as well, so it lets no extra composites through,
    /// but it rejects primes `p ≡ 1 (mod 4)` above 3 almost always (5 always).
    /// `strict` runs the full test.
    pub fn is_prime<R: RngCore + CryptoRng>(rng: &mut R, n: &BigInt, rounds: u32, strict: bool) -> Result<bool, PrimeError> {
        let two = BigInt::from(2u32);
        if *n < two { return Ok(false); }
        if *n == two || *n == BigInt::from(3u32) { return Ok(true); }
        if n.is_even() { return Ok(false); }
        let mut d: BigInt = n - 1u32;
        let mut s = 0u64;
        while d.is_even() {
            d >>= 1;
            s += 1;
        }
        let high = n - 2u32;
        for _ in 0..rounds {
            let a = RSA::random_in_range(rng, &two, &high)?;
            if !RSA::miller_rabin_trial(&a, &d, s, n, strict) { return Ok(false); }
        }
        Ok(true)
    }

    fn miller_rabin_trial(a: &BigInt, d: &BigInt, s: u64, n: &BigInt, strict: bool) -> bool {
        let n_minus_one: BigInt = n - 1u32;
        let mut x = RSA::fast_modular_exponent(a, d, n);
        if x.is_one() || x == n_minus_one { return true; }
        if !strict { return false; }
        for _ in 1..s {
            x = (&x * &x) % n;
            if x == n_minus_one { return true; }
            if x.is_one() { return false; }
        }
        false
    }

    /// First probable prime `>= start`, testing at most `scan_limit` values.
    pub fn get_first_prime<R: RngCore + CryptoRng>(&self, rng: &mut R, start: &BigInt) -> Result<PrimeSearch, PrimeError> {
        let begin = Local::now().timestamp_millis();
        let mut n = start.clone();
        for step in 0..self.scan_limit {
            if RSA::is_prime(rng, &n, self.rounds, self.strict)? {
                if !silent() {
                    println!("Done scan in {} steps after {} ms", step + 1, Local::now().timestamp_millis() - begin);
                }
                return Ok(PrimeSearch::Prime(n));
            }
            n += 1u32;
        }
        eprintln!("get_first_prime reached test limit: {}", self.scan_limit);
        Ok(PrimeSearch::Degraded(BigInt::from(FALLBACK_PRIME)))
    }

    /// Random probable prime in `[Bmax / 8, Bmax]` with `Bmax = 2^(8 * prime_bytes - 1) - 1`,
    /// falling back to a linear scan from the sampled candidate.
    pub fn get_large_random_prime<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<PrimeSearch, PrimeError> {
        let mut max = vec![0xffu8; self.prime_bytes.max(1)];
        max[0] &= 0x7f;
        let b_max = BigInt::from_bytes_be(Sign::Plus, &max);
        let candidate = RSA::random_in_range(rng, &(&b_max / 8u32), &b_max)?;
        if RSA::is_prime(rng, &candidate, self.rounds, self.strict)? {
            if !silent() { println!("Sampled prime directly"); }
            return Ok(PrimeSearch::Prime(candidate));
        }
        self.get_first_prime(rng, &candidate)
    }
}
