use lazy_static::lazy_static;
use mut_static::MutStatic;
use crate::RSA;

lazy_static! {
    pub static ref CONFIG_DEF: RSA = RSA {
        mode: String::from("demo"),
        // 64 bit message in hex, a leading '0' is prepended before parsing
        message: String::from("4D6251655468576D"),
        exponent: None,
        modulus: None,
        prime_bytes: 32,
        rounds: 64,
        scan_limit: 10_000_000,
        public_exponent: 65537,
        strict: false,
        retry: true,
        tests: 100,
        silent: false,
    };
    pub static ref SILENT: MutStatic<bool> = MutStatic::from(false);
}

/// Whether log output is disabled. An unreadable flag counts as not silent.
pub fn silent() -> bool {
    SILENT.read().map(|s| *s).unwrap_or(false)
}

pub fn set_silent(value: bool) {
    if let Ok(mut s) = SILENT.write() {
        *s = value;
    }
}
