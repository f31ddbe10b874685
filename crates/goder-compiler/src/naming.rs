//! Fresh declaration names
//!
//! Specialized and renamed declarations get their original name plus a
//! suffix of one uppercase letter followed by lowercase letters
//! (`absInt8` style output becomes `absXkqwmbzo`). The suffix is either
//! derived from a SHA-256 digest of what the declaration stands for, so the
//! same instantiation always gets the same name, or drawn at random.

use crate::config::{GenericsConfig, NamingStrategy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Type parameter name -> concrete type text, sorted by parameter name.
pub type Binding = BTreeMap<String, String>;

/// Canonical text of a generic declaration instantiated with `binding`:
/// `Map[R=string,T=int]`.
pub fn binding_identity(key: &str, binding: &Binding) -> String {
    let pairs: Vec<String> = binding.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}[{}]", key, pairs.join(","))
}

/// Generates suffixed names that are not yet taken.
pub struct Namer {
    strategy: NamingStrategy,
    suffix_len: usize,
    rng: StdRng,
}

impl Namer {
    pub fn new(config: &GenericsConfig) -> Self {
        Self {
            strategy: config.naming,
            suffix_len: config.suffix_len.max(1),
            rng: StdRng::from_entropy(),
        }
    }

    /// Make random names reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn strategy(&self) -> NamingStrategy {
        self.strategy
    }

    /// A name for `base` standing for `identity` for which `taken` is false.
    pub fn fresh(&mut self, base: &str, identity: &str, taken: &dyn Fn(&str) -> bool) -> String {
        let mut attempt = 0u32;
        loop {
            let suffix = match self.strategy {
                NamingStrategy::ContentHash => content_suffix(identity, attempt, self.suffix_len),
                NamingStrategy::Random => random_suffix(&mut self.rng, self.suffix_len),
            };
            let name = format!("{}{}", base, suffix);
            if !taken(&name) {
                return name;
            }
            tracing::debug!(%name, "generated name already taken, retrying");
            attempt += 1;
        }
    }
}

/// Deterministic suffix for `identity`. `attempt` perturbs the digest when
/// an earlier suffix was taken.
pub fn content_suffix(identity: &str, attempt: u32, len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    if attempt > 0 {
        hasher.update(attempt.to_le_bytes());
    }
    let mut digest = hasher.finalize();
    tracing::trace!(%identity, digest = %hex::encode(&digest[..8]), "hashed specialization");

    let mut bytes: Vec<u8> = digest.to_vec();
    while bytes.len() < len {
        digest = Sha256::digest(digest);
        bytes.extend_from_slice(&digest);
    }
    letters(bytes.into_iter().take(len))
}

fn random_suffix(rng: &mut StdRng, len: usize) -> String {
    letters((0..len).map(|_| rng.gen::<u8>()))
}

fn letters(bytes: impl Iterator<Item = u8>) -> String {
    bytes
        .enumerate()
        .map(|(i, b)| {
            let base = if i == 0 { b'A' } else { b'a' };
            (base + b % 26) as char
        })
        .collect()
}
