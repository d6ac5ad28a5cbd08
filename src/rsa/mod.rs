use std::error::Error;
use std::time::Duration;
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use num::Integer;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

pub mod config;
pub mod random;
pub mod prime_gen;
pub mod keys;

use config::*;
use keys::*;
use prime_gen::*;

#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    Demo,
    Generate,
    Encrypt,
    Test,
}

#[macro_export]
macro_rules! rsa_t {
    ($CONFIG: expr, $NAME: ident) => {
#[derive(Debug, Clone, Parser)]
pub struct $NAME {
    #[clap(short, long, value_parser, default_value = $CONFIG.mode.as_str(), help = "Run mode: demo, generate, encrypt, test")]
    pub mode: String,
    #[clap(short = 'M', long, value_parser, default_value = $CONFIG.message.as_str(), help = "Message as a hex string")]
    pub message: String,
    #[clap(short, long, value_parser, help = "Key exponent in hex, for `encrypt' mode")]
    pub exponent: Option<String>,
    #[clap(short = 'n', long, value_parser, help = "Key modulus in hex, for `encrypt' mode")]
    pub modulus: Option<String>,
    #[clap(short, long, value_parser, default_value_t = $CONFIG.prime_bytes, help = "Prime candidate width in bytes")]
    pub prime_bytes: usize,
    #[clap(short, long, value_parser, default_value_t = $CONFIG.rounds, help = "Primality test trials")]
    pub rounds: u32,
    #[clap(long, value_parser, default_value_t = $CONFIG.scan_limit, help = "Max candidates tested by the linear prime scan")]
    pub scan_limit: u64,
    #[clap(long, value_parser, default_value_t = $CONFIG.public_exponent, help = "Initial public exponent")]
    pub public_exponent: u64,
    #[clap(long, value_parser, default_value_t = $CONFIG.strict, help = "Run the full Miller Rabin squaring steps")]
    pub strict: bool,
    #[clap(long, value_parser, action = ArgAction::Set, default_value_t = $CONFIG.retry, help = "Retry when the prime scan runs out of budget")]
    pub retry: bool,
    #[clap(short, long, value_parser, default_value_t = $CONFIG.tests, help = "Round trips run by `test' mode")]
    pub tests: usize,
    #[clap(short, long, value_parser, default_value_t = $CONFIG.silent, help = "Disable log output")]
    pub silent: bool,
}
    };
}

rsa_t!(CONFIG_DEF, RSA);

impl RSA {
    pub fn get(&self) -> &RSA {
        self
    }

    fn run_mode(&self) -> Result<RunMode, KeyError> {
        match self.mode.as_str() {
            "demo" => Ok(RunMode::Demo),
            "generate" => Ok(RunMode::Generate),
            "encrypt" => Ok(RunMode::Encrypt),
            "test" => Ok(RunMode::Test),
            m => Err(KeyError::ParseError(format!("Unknown run mode `{}'! available: demo(default), generate, encrypt, test", m)))
        }
    }

    /// Parses a hex string as a non-negative integer. A `0` digit is
    /// prepended so an empty string reads as zero.
    pub fn parse_hex(hex: &str) -> Result<BigInt, KeyError> {
        let digits = format!("0{}", hex.trim());
        BigInt::parse_bytes(digits.as_bytes(), 16)
            .ok_or_else(|| KeyError::ParseError(format!("not a hex number: {:?}", hex)))
    }

    pub fn euler(p: &BigInt, q: &BigInt) -> BigInt { (p - 1u32) * (q - 1u32) }

    /// Inverse of `e` modulo `f` by the iterative extended Euclidean
    /// algorithm. Only meaningful when `gcd(e, f) == 1`.
    pub fn mod_inverse(e: &BigInt, f: &BigInt) -> BigInt {
        let (mut a, mut i) = (e.clone(), f.clone());
        let (mut v, mut d) = (BigInt::zero(), BigInt::one());
        while a.is_positive() {
            let t = &i / &a;
            let rem = &i % &a;
            i = std::mem::replace(&mut a, rem);
            let next = &v - &t * &d;
            v = std::mem::replace(&mut d, next);
        }
        v.mod_floor(f)
    }

    /// `message^exponent mod N`. Serves as both encryption and decryption
    /// depending on which half of the pair is passed. `message` is expected
    /// in `[0, N)` and is not checked.
    pub fn encrypt(message: &BigInt, key: &Key) -> BigInt {
        RSA::fast_modular_exponent(message, key.exponent(), key.modulus())
    }

    pub fn generate_key<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<KeySet, PrimeError> {
        let p = self.draw_prime(rng)?;
        let q = self.draw_prime(rng)?;
        self.assemble_key_set(rng, &p, &q, &BigInt::from(self.public_exponent))
    }

    fn draw_prime<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<BigInt, PrimeError> {
        loop {
            match self.get_large_random_prime(rng)? {
                PrimeSearch::Prime(p) => return Ok(p),
                PrimeSearch::Degraded(_) if self.retry => {
                    if !silent() { println!("Prime scan exhausted, retrying with a fresh candidate"); }
                }
                PrimeSearch::Degraded(_) => return Err(PrimeError::Exhausted(self.scan_limit)),
            }
        }
    }

    /// Builds the key pair for primes `p` and `q`. The public exponent starts
    /// at `e` and moves to the next prime until it is coprime with `φ`.
    pub fn assemble_key_set<R: RngCore + CryptoRng>(&self, rng: &mut R, p: &BigInt, q: &BigInt, e: &BigInt) -> Result<KeySet, PrimeError> {
        let n = p * q;
        let f = RSA::euler(p, q);
        let mut e = e.clone();
        while !e.gcd(&f).is_one() {
            e = match self.get_first_prime(rng, &(&e + 1u32))? {
                PrimeSearch::Prime(next) => next,
                PrimeSearch::Degraded(_) => return Err(PrimeError::Exhausted(self.scan_limit)),
            };
        }
        let d = RSA::mod_inverse(&e, &f);
        if !self.check_key_set(&d, &e, &f) {
            return Err(PrimeError::NotInvertible(e));
        }
        Ok(KeySet { public: Key::new(e, n.clone()), private: Key::new(d, n) })
    }

    pub fn check_key_set(&self, d: &BigInt, e: &BigInt, f: &BigInt) -> bool {
        let res = (d * e) % f;
        if !silent() {
            println!("(d * e) % f = {} % {} = {}", d * e, f, res);
        }
        res.is_one()
    }

    fn generate_with_spinner<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<KeySet, PrimeError> {
        let pb = match silent() {
            true => None,
            false => Some(ProgressBar::new_spinner()),
        };
        if let Some(pb) = &pb {
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message("generating key pair");
        }
        let keys = self.generate_key(rng);
        if let Some(pb) = &pb {
            pb.finish_with_message("Done");
        }
        keys
    }

    fn key_from_args(&self) -> Result<Key, KeyError> {
        match (&self.exponent, &self.modulus) {
            (Some(e), Some(n)) => {
                let modulus = RSA::parse_hex(n)?;
                if modulus.is_zero() {
                    return Err(KeyError::ParseError(format!("modulus must be positive, got {:?}", n)));
                }
                Ok(Key::new(RSA::parse_hex(e)?, modulus))
            }
            _ => Err(KeyError::MissingKey),
        }
    }

    pub fn self_test<R: RngCore + CryptoRng>(&self, rng: &mut R, keys: &KeySet) -> Result<(), Box<dyn Error>> {
        let top: BigInt = keys.public.modulus() - 1u32;
        let pb = match silent() {
            true => None,
            false => Some(ProgressBar::new(self.tests as u64)),
        };
        if let Some(pb) = &pb {
            pb.set_style(ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"));
        }
        for _ in 0..self.tests {
            let m = RSA::random_in_range(rng, &BigInt::zero(), &top)?;
            let signed = RSA::encrypt(&RSA::encrypt(&m, &keys.private), &keys.public);
            let sealed = RSA::encrypt(&RSA::encrypt(&m, &keys.public), &keys.private);
            if signed != m || sealed != m {
                return Err(Box::new(KeyError::RoundTrip(format!("{:X}", m))));
            }
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }
        if let Some(pb) = &pb {
            pb.finish_with_message("Test pass");
        }
        Ok(())
    }

    pub fn run(&self) -> Result<(), Box<dyn Error>> {
        let mut rng = OsRng;
        match self.run_mode()? {
            RunMode::Demo => {
                let keys = self.generate_with_spinner(&mut rng)?;
                println!("Public Key is: \n{:X}", keys.public);
                println!("Private Key is: \n{:X}", keys.private);
                let p = RSA::parse_hex(&self.message)?;
                let c = RSA::encrypt(&p, &keys.private);
                let m = RSA::encrypt(&c, &keys.public);
                println!("input: {}", self.message);
                println!("cypher: {:X}", c);
                println!("output: {:X}", m);
            }
            RunMode::Generate => {
                let keys = self.generate_with_spinner(&mut rng)?;
                println!("Public Key is: \n{:X}", keys.public);
                println!("Private Key is: \n{:X}", keys.private);
            }
            RunMode::Encrypt => {
                let key = self.key_from_args()?;
                let m = RSA::parse_hex(&self.message)?;
                if !silent() { println!("using {:X}", key); }
                println!("{:X}", RSA::encrypt(&m, &key));
            }
            RunMode::Test => {
                let keys = self.generate_with_spinner(&mut rng)?;
                if !silent() { println!("get keys: {:X}\n          {:X}", keys.public, keys.private); }
                self.self_test(&mut rng, &keys)?;
                if !silent() { println!("Test pass"); }
            }
        }
        Ok(())
    }
}
