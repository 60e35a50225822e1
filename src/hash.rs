//! Polynomial rolling hash over a sliding window of chars.
//!
//! H(X) = (x_0 * b^{L-1} + x_1 * b^{L-2} + ... + x_{L-1}) mod M
//!
//! where x_i is the scalar value of the i-th char, b the prime base and M the
//! prime modulus. Products are taken in u128 so any u64 base/modulus is safe.

use std::collections::VecDeque;

use crate::types::{CodecError, HASH_BASE, HASH_MOD};

/// Anything that can hash a block of text for dictionary indexing.
pub trait BlockHasher {
    fn hash(&mut self, window: &[char]) -> u64;
}

#[inline]
fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    (a as u128 * b as u128 % modulus as u128) as u64
}

/// Modular exponentiation: base^exp mod modulus.
pub fn power_mod(base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let mut result: u64 = 1;
    let mut b = base % modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, b, modulus);
        }
        exp >>= 1;
        b = mul_mod(b, b, modulus);
    }
    result
}

/// Hash of a whole window, computed in Horner form.
pub fn fingerprint(window: &[char], base: u64, modulus: u64) -> u64 {
    let mut h: u64 = 0;
    for &c in window {
        h = ((h as u128 * base as u128 + c as u128) % modulus as u128) as u64;
    }
    h
}

/// Rolling hash with O(1) incremental updates.
///
/// `hash()` establishes the window (and its length); `next_hash()` then
/// slides it one char to the right.
#[derive(Clone, Debug)]
pub struct RollingHash {
    base: u64,
    modulus: u64,
    last_power: u64, // base^{L-1} mod modulus
    last_hash: u64,
    window: VecDeque<char>,
}

impl Default for RollingHash {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingHash {
    pub fn new() -> Self {
        RollingHash {
            base: HASH_BASE,
            modulus: HASH_MOD,
            last_power: 0,
            last_hash: 0,
            window: VecDeque::new(),
        }
    }

    pub fn with_params(base: u64, modulus: u64) -> Result<Self, CodecError> {
        let mut rh = Self::new();
        rh.set_prime_base(base);
        rh.set_prime_modulus(modulus)?;
        Ok(rh)
    }

    pub fn prime_base(&self) -> u64 {
        self.base
    }

    pub fn prime_modulus(&self) -> u64 {
        self.modulus
    }

    pub fn set_prime_base(&mut self, base: u64) {
        self.base = base;
    }

    pub fn set_prime_modulus(&mut self, modulus: u64) -> Result<(), CodecError> {
        if modulus < 2 {
            return Err(CodecError::InvalidModulus(modulus));
        }
        self.modulus = modulus;
        Ok(())
    }

    /// Current hash value (that of the last `hash`/`next_hash` call).
    #[inline]
    pub fn value(&self) -> u64 {
        self.last_hash
    }

    /// Chars currently in the window.
    pub fn window(&self) -> String {
        self.window.iter().collect()
    }

    /// Hash `window` from scratch and make it the current window.
    pub fn hash(&mut self, window: &[char]) -> u64 {
        let exp = window.len().saturating_sub(1) as u64;
        self.last_power = power_mod(self.base, exp, self.modulus);
        self.last_hash = fingerprint(window, self.base, self.modulus);
        self.window.clear();
        self.window.extend(window.iter().copied());
        self.last_hash
    }

    /// Slide the window one char: drop the first, append `next`.
    ///
    /// H' = ((H - x_0 * b^{L-1}) * b + next) mod M
    pub fn next_hash(&mut self, next: char) -> Result<u64, CodecError> {
        let old = self.window.pop_front().ok_or(CodecError::HashNotPrimed)?;
        let m = self.modulus;
        let sub = mul_mod(old as u64, self.last_power, m);
        let v = if self.last_hash >= sub {
            self.last_hash - sub
        } else {
            m - (sub - self.last_hash)
        };
        self.last_hash = ((v as u128 * self.base as u128 + next as u128) % m as u128) as u64;
        self.window.push_back(next);
        Ok(self.last_hash)
    }
}

impl BlockHasher for RollingHash {
    fn hash(&mut self, window: &[char]) -> u64 {
        RollingHash::hash(self, window)
    }
}
