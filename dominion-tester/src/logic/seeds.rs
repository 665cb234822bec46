use std::collections::BTreeMap;

use anyhow::Result;
use dominion_game::seed::WORD_LIST;
use dominion_game::{decode_to_seed, encode_friendly};
use thiserror::Error;

const DEFAULT_SEED: u64 = 1337;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("unrecognized seed token: {0}")]
    Unrecognized(String),
    #[error("run code {0} does not decode")]
    BadCode(String),
}

/// Seed metadata used for scenario and campaign runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, code: None }
    }

    #[must_use]
    pub const fn from_code(seed: u64, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
        }
    }

    /// Code shown in reports: the one supplied, or the seed's own encoding.
    #[must_use]
    pub fn display_code(&self) -> String {
        self.code
            .clone()
            .unwrap_or_else(|| encode_friendly(self.seed))
    }
}

/// Resolve CLI seed arguments into canonical seed metadata.
///
/// Supports literal integers, run codes and the keyword `all`, which expands
/// to the zero-tag code of every word and number.
///
/// # Errors
///
/// Returns `SeedError` for a token that is neither a number nor a code.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_all = false;

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        if token.eq_ignore_ascii_case("all") {
            request_all = true;
            continue;
        }
        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }
        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }
        if let Some(seed) = decode_to_seed(token) {
            pending.push(SeedInfo::from_code(seed, token.to_uppercase()));
            continue;
        }
        return Err(SeedError::Unrecognized(token.clone()).into());
    }

    if request_all {
        pending.extend(all_code_seeds()?);
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: BTreeMap<u64, usize> = BTreeMap::new();
    for info in pending {
        if let Some(&existing) = index.get(&info.seed) {
            if let Some(entry) = deduped.get_mut(existing)
                && entry.code.is_none()
                && info.code.is_some()
            {
                *entry = info;
            }
        } else {
            index.insert(info.seed, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }
    Ok(deduped)
}

fn all_code_seeds() -> Result<Vec<SeedInfo>, SeedError> {
    let mut seeds = Vec::with_capacity(WORD_LIST.len() * 100);
    for word in WORD_LIST {
        for suffix in 0..100 {
            let code = format!("{word}{suffix:02}-0000");
            let seed = decode_to_seed(&code).ok_or_else(|| SeedError::BadCode(code.clone()))?;
            seeds.push(SeedInfo::from_code(seed, code));
        }
    }
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_numbers_and_codes() {
        let raw = vec!["42".to_string(), "-7".to_string(), "falcon42-1f3a".to_string()];
        let seeds = resolve_seed_inputs(&raw).unwrap();
        assert_eq!(seeds.len(), 3);
        assert!(seeds.iter().any(|s| s.seed == 42 && s.code.is_none()));
        assert!(seeds.iter().any(|s| s.seed == 7));
        let coded = seeds.iter().find(|s| s.code.is_some()).unwrap();
        assert_eq!(coded.code.as_deref(), Some("FALCON42-1F3A"));
        assert_eq!(coded.display_code(), "FALCON42-1F3A");
    }

    #[test]
    fn duplicates_keep_the_coded_entry() {
        let seed = decode_to_seed("MOAT07-00C2").unwrap();
        let raw = vec![seed.to_string(), "MOAT07-00C2".to_string()];
        let seeds = resolve_seed_inputs(&raw).unwrap();
        assert_eq!(seeds, vec![SeedInfo::from_code(seed, "MOAT07-00C2".to_string())]);
    }

    #[test]
    fn empty_input_falls_back_to_default() {
        let seeds = resolve_seed_inputs(&[]).unwrap();
        assert_eq!(seeds, vec![SeedInfo::from_numeric(DEFAULT_SEED)]);
    }

    #[test]
    fn expands_every_code() {
        let seeds = resolve_seed_inputs(&["all".to_string()]).unwrap();
        assert_eq!(seeds.len(), WORD_LIST.len() * 100);
        assert!(seeds.iter().all(|s| s.code.is_some()));
    }

    #[test]
    fn rejects_garbage() {
        let err = resolve_seed_inputs(&["???".to_string()]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SeedError>(),
            Some(&SeedError::Unrecognized("???".to_string()))
        );
    }
}
