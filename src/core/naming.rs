//! Identifier generation for renamed bundles.
//!
//! A `NameGenerator` owns the set of names already handed out (plus any names
//! reserved up front), so two calls within one run never return the same
//! randomized identifier.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

use crate::error::{Error, Result};

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const LETTERS_AND_DIGITS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// How new identifiers are derived from the original base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingMode {
    /// `prefix_base`, leaving already-prefixed names alone.
    Prefixed { prefix: String },
    /// Fixed-length random identifier that never starts with a digit.
    Random { length: usize, max_attempts: usize },
    /// Keep the original name.
    Preserve,
}

pub struct NameGenerator {
    mode: NamingMode,
    used: HashSet<String>,
    rng: StdRng,
}

impl NameGenerator {
    pub fn new(mode: NamingMode) -> Result<Self> {
        Self::build(mode, StdRng::from_entropy())
    }

    /// Generator with a fixed RNG seed, for reproducible runs.
    pub fn with_seed(mode: NamingMode, seed: u64) -> Result<Self> {
        Self::build(mode, StdRng::seed_from_u64(seed))
    }

    pub fn prefixed(prefix: &str) -> Result<Self> {
        Self::new(NamingMode::Prefixed {
            prefix: prefix.to_string(),
        })
    }

    fn build(mode: NamingMode, rng: StdRng) -> Result<Self> {
        let mode = match mode {
            NamingMode::Prefixed { prefix } => {
                let prefix = prefix.trim().to_lowercase();
                if prefix.is_empty() {
                    return Err(Error::validation_invalid_argument(
                        "project_name",
                        "Project name cannot be empty",
                        None,
                    ));
                }
                if prefix.chars().any(|c| c.is_control() || c == '/' || c == '\\') {
                    return Err(Error::validation_invalid_argument(
                        "project_name",
                        "Project name contains invalid characters",
                        Some(prefix),
                    ));
                }
                NamingMode::Prefixed { prefix }
            }
            NamingMode::Random {
                length,
                max_attempts,
            } => {
                if length == 0 {
                    return Err(Error::validation_invalid_argument(
                        "random_name_length",
                        "Random name length must be at least 1",
                        None,
                    ));
                }
                NamingMode::Random {
                    length,
                    max_attempts: max_attempts.max(1),
                }
            }
            NamingMode::Preserve => NamingMode::Preserve,
        };

        Ok(Self {
            mode,
            used: HashSet::new(),
            rng,
        })
    }

    pub fn mode(&self) -> &NamingMode {
        &self.mode
    }

    /// Mark a name as taken so randomized generation never returns it.
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Produce the new identifier for `base`.
    pub fn next(&mut self, base: &str) -> Result<String> {
        match &self.mode {
            NamingMode::Prefixed { prefix } => Ok(prefixed_name(prefix, base)),
            NamingMode::Random {
                length,
                max_attempts,
            } => {
                let (length, max_attempts) = (*length, *max_attempts);
                for _ in 0..max_attempts {
                    let candidate = random_name(&mut self.rng, length);
                    if self.used.insert(candidate.clone()) {
                        return Ok(candidate);
                    }
                }
                Err(Error::naming_exhausted(length, max_attempts, self.used.len()))
            }
            NamingMode::Preserve => Ok(base.to_string()),
        }
    }
}

fn prefixed_name(prefix: &str, base: &str) -> String {
    if base.starts_with(&format!("{}_", prefix)) {
        base.to_string()
    } else {
        format!("{}_{}", prefix, base)
    }
}

fn random_name(rng: &mut StdRng, length: usize) -> String {
    let mut name = String::with_capacity(length);
    name.push(LETTERS[rng.gen_range(0..LETTERS.len())] as char);
    for _ in 1..length {
        name.push(LETTERS_AND_DIGITS[rng.gen_range(0..LETTERS_AND_DIGITS.len())] as char);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random(length: usize, max_attempts: usize) -> NamingMode {
        NamingMode::Random {
            length,
            max_attempts,
        }
    }

    #[test]
    fn prefixed_adds_prefix() {
        let mut names = NameGenerator::prefixed("Project").unwrap();
        assert_eq!(
            names.mode(),
            &NamingMode::Prefixed {
                prefix: "project".to_string()
            }
        );
        assert_eq!(names.next("icon_home").unwrap(), "project_icon_home");
    }

    #[test]
    fn prefixed_is_idempotent() {
        let mut names = NameGenerator::prefixed("project").unwrap();
        assert_eq!(names.next("project_icon_home").unwrap(), "project_icon_home");
        // Only a full `prefix_` counts as already prefixed.
        assert_eq!(names.next("projecticon").unwrap(), "project_projecticon");
    }

    #[test]
    fn prefixed_rejects_empty_prefix() {
        assert!(NameGenerator::prefixed("  ").is_err());
    }

    #[test]
    fn random_names_are_unique_and_start_with_letter() {
        let mut names = NameGenerator::with_seed(random(8, 10_000), 7).unwrap();
        let mut seen = HashSet::new();

        for i in 0..2_000 {
            let name = names.next(&format!("img{}", i)).unwrap();
            assert_eq!(name.len(), 8);
            assert!(name.chars().next().unwrap().is_ascii_lowercase());
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
            assert!(seen.insert(name), "duplicate generated");
        }
    }

    #[test]
    fn random_skips_reserved_names() {
        let mut names = NameGenerator::with_seed(random(1, 10_000), 1).unwrap();
        for c in "abcdefghijklmnopqrstuvwxy".chars() {
            names.reserve(&c.to_string());
        }
        assert_eq!(names.next("x").unwrap(), "z");
        assert!(names.is_used("z"));
    }

    #[test]
    fn random_fails_loudly_when_space_exhausted() {
        let mut names = NameGenerator::with_seed(random(1, 500), 3).unwrap();
        for _ in 0..26 {
            names.next("x").unwrap();
        }
        let err = names.next("x").unwrap_err();
        assert_eq!(err.code.as_str(), "naming.exhausted");
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = NameGenerator::with_seed(random(8, 100), 42).unwrap();
        let mut b = NameGenerator::with_seed(random(8, 100), 42).unwrap();
        for _ in 0..10 {
            assert_eq!(a.next("x").unwrap(), b.next("x").unwrap());
        }
    }

    #[test]
    fn preserve_returns_base() {
        let mut names = NameGenerator::new(NamingMode::Preserve).unwrap();
        assert_eq!(names.next("logo").unwrap(), "logo");
    }

    #[test]
    fn zero_length_rejected() {
        assert!(NameGenerator::new(random(0, 10)).is_err());
    }
}
