//! Opaque-unique domain - a fresh token on every draw.

use super::ValueDomain;
use crate::error::DomainError;
use rand::distr::{Distribution, StandardUniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt::Write;

/// Width of bit tokens when the column declares none
const DEFAULT_BITS: usize = 128;

/// How tokens are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFormat {
    /// Hyphenated UUID, e.g. `0f8a...-...`
    Uuid,
    /// Binary literal in hex escape form, e.g. `\x0f8a...`
    Hex,
    /// String of `0`/`1` digits as wide as the char limit
    Bits,
}

/// Produces a new pseudo-random token each time `next` is called.
///
/// Tokens come from a seeded RNG so runs are reproducible; `reset` does not
/// replay earlier tokens. `next` never reports exhaustion.
#[derive(Debug)]
pub struct OpaqueDomain {
    rng: StdRng,
    format: TokenFormat,
    limit: Option<usize>,
    current: Option<String>,
}

impl OpaqueDomain {
    pub fn new(seed: u64, format: TokenFormat) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            format,
            limit: None,
            current: None,
        }
    }

    pub fn with_char_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    fn token(&mut self) -> String {
        let bytes: [u8; 16] = StandardUniform.sample(&mut self.rng);
        match self.format {
            TokenFormat::Uuid => uuid::Builder::from_random_bytes(bytes)
                .into_uuid()
                .to_string(),
            TokenFormat::Hex => {
                let mut out = String::with_capacity(34);
                out.push_str("\\x");
                for b in bytes {
                    let _ = write!(out, "{b:02x}");
                }
                out
            }
            TokenFormat::Bits => {
                // bit(n) takes exactly n digits
                let len = self.limit.unwrap_or(DEFAULT_BITS).max(1);
                let mut out = String::with_capacity(len + 8);
                for b in bytes {
                    let _ = write!(out, "{b:08b}");
                }
                while out.len() < len {
                    let b: u8 = StandardUniform.sample(&mut self.rng);
                    let _ = write!(out, "{b:08b}");
                }
                out.truncate(len);
                out
            }
        }
    }
}

impl ValueDomain for OpaqueDomain {
    fn reset(&mut self) -> Result<(), DomainError> {
        self.current = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool, DomainError> {
        self.current = Some(self.token());
        Ok(true)
    }

    fn value(&mut self) -> Result<String, DomainError> {
        Ok(self.current.clone().unwrap_or_default())
    }

    fn char_limit(&self) -> Option<usize> {
        self.limit
    }

    fn is_unbounded(&self) -> bool {
        true
    }
}
