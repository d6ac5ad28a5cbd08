use num_bigint::{BigInt, Sign};
use num_traits::Zero;
use rand::{CryptoRng, RngCore};
use crate::rsa::prime_gen::PrimeError;
use crate::RSA;

impl RSA {
    /// Uniform sample from `[min, max]`, bounds are swapped if given reversed.
    ///
    /// Rejection sampling over the byte length of `max - min`, each trial
    /// is accepted with probability >= 1/2.
    pub fn random_in_range<R: RngCore + CryptoRng>(rng: &mut R, min: &BigInt, max: &BigInt) -> Result<BigInt, PrimeError> {
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        let range = max - min;
        Ok(min + RSA::random_from_zero(rng, &range)?)
    }

    fn random_from_zero<R: RngCore + CryptoRng>(rng: &mut R, max: &BigInt) -> Result<BigInt, PrimeError> {
        if max.is_zero() { return Ok(BigInt::zero()); }
        let (_, mut bytes) = max.to_bytes_be();
        // bits above the highest set bit of `max` would always overshoot
        let unused = bytes.len() as u64 * 8 - max.bits();
        let mask = 0xffu8 >> unused;
        loop {
            rng.try_fill_bytes(&mut bytes)?;
            bytes[0] &= mask;
            let value = BigInt::from_bytes_be(Sign::Plus, &bytes);
            if value <= *max { return Ok(value); }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use num_bigint::BigInt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::RSA;

    #[test]
    fn stays_in_range() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let (low, high) = (BigInt::from(1000), BigInt::from(1300));
        for _ in 0..2000 {
            let x = RSA::random_in_range(&mut rng, &low, &high)?;
            assert!(x >= low && x <= high, "{} out of range", x);
        }
        Ok(())
    }

    #[test]
    fn swapped_bounds() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(7);
        let (low, high) = (BigInt::from(-3), BigInt::from(3));
        for _ in 0..500 {
            let x = RSA::random_in_range(&mut rng, &high, &low)?;
            assert!(x >= low && x <= high);
        }
        Ok(())
    }

    #[test]
    fn empty_range() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(1);
        let v = BigInt::from(42);
        assert_eq!(RSA::random_in_range(&mut rng, &v, &v)?, v);
        Ok(())
    }

    #[test]
    fn wide_range_hits_both_halves() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(99);
        let low = BigInt::from(0);
        let high = BigInt::from(1) << 200;
        let mid = &high >> 1;
        let samples = (0..64)
            .map(|_| RSA::random_in_range(&mut rng, &low, &high))
            .collect::<Result<Vec<_>, _>>()?;
        assert!(samples.iter().all(|x| *x >= low && *x <= high));
        assert!(samples.iter().any(|x| *x < mid));
        assert!(samples.iter().any(|x| *x >= mid));
        Ok(())
    }

    #[test]
    fn chi_square_uniform() -> Result<(), Box<dyn Error>> {
        let mut rng = StdRng::seed_from_u64(0xc415);
        let (low, high) = (BigInt::from(10), BigInt::from(19));
        let trials = 10_000;
        let mut counts = [0usize; 10];
        for _ in 0..trials {
            let x = RSA::random_in_range(&mut rng, &low, &high)? - &low;
            let i: usize = x.try_into()?;
            counts[i] += 1;
        }
        let expected = trials as f64 / counts.len() as f64;
        let chi = counts.iter()
            .map(|c| (*c as f64 - expected).powi(2) / expected)
            .sum::<f64>();
        println!("counts: {:?}, chi square: {}", counts, chi);
        // 9 degrees of freedom, far past the 0.999 quantile (27.9)
        assert!(chi < 40.0);
        Ok(())
    }
}
