use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::domain::CardNumber;
use crate::config::{CardNumberScheme, RegistryConfig};

const RANDOM_SUFFIX_LEN: usize = 8;
const MAX_RANDOM_ATTEMPTS: usize = 16;

/// Issues card numbers on approval.
///
/// Every returned number is reserved before it is handed out and is never
/// returned again, including after the card carrying it is deleted.
pub trait CardNumberGenerator: Send + Sync {
    fn next(&self) -> Result<CardNumber, NumberingError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NumberingError {
    #[error("no unused card number found after {attempts} attempts")]
    Exhausted { attempts: usize },
    #[error("card number index unavailable")]
    IndexUnavailable,
}

/// Builds the generator selected by configuration.
pub fn generator_for(config: &RegistryConfig) -> Arc<dyn CardNumberGenerator> {
    match config.card_numbers {
        CardNumberScheme::Random => Arc::new(RandomCardNumbers::new(&config.card_number_prefix)),
        CardNumberScheme::Sequential => {
            Arc::new(SequentialCardNumbers::new(&config.card_number_prefix, 1))
        }
    }
}

/// `<prefix>` followed by eight uppercase hex characters, checked against an
/// index of every number issued so far.
#[derive(Debug)]
pub struct RandomCardNumbers {
    prefix: String,
    issued: Mutex<HashSet<String>>,
}

impl RandomCardNumbers {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            issued: Mutex::new(HashSet::new()),
        }
    }

    fn candidate(&self) -> String {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        let suffix: String = simple.chars().take(RANDOM_SUFFIX_LEN).collect();
        format!("{}{}", self.prefix, suffix.to_ascii_uppercase())
    }
}

impl CardNumberGenerator for RandomCardNumbers {
    fn next(&self) -> Result<CardNumber, NumberingError> {
        let mut issued = self
            .issued
            .lock()
            .map_err(|_| NumberingError::IndexUnavailable)?;

        for _ in 0..MAX_RANDOM_ATTEMPTS {
            let candidate = self.candidate();
            if issued.insert(candidate.clone()) {
                return Ok(CardNumber(candidate));
            }
        }

        Err(NumberingError::Exhausted {
            attempts: MAX_RANDOM_ATTEMPTS,
        })
    }
}

/// `<prefix>` followed by a zero-padded, monotonically increasing counter.
#[derive(Debug)]
pub struct SequentialCardNumbers {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialCardNumbers {
    pub fn new(prefix: &str, start: u64) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: AtomicU64::new(start),
        }
    }
}

impl CardNumberGenerator for SequentialCardNumbers {
    fn next(&self) -> Result<CardNumber, NumberingError> {
        let value = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(CardNumber(format!("{}{value:08}", self.prefix)))
    }
}
