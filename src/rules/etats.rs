//! State derivation: pin levels → one coded state per Etat category.
//!
//! For each category the declared states are tried in order and the first
//! whose constraints all hold wins. No match yields code `-1` and no
//! current state.
//!
//! Results are cached. A refresh within [`DEBOUNCE_MS`] of the previous one
//! is skipped and callers read the cached codes, unless the cache was
//! explicitly invalidated by a write.

use log::debug;
use serde::{Deserialize, Serialize};

use super::PinTarget;
use crate::error::{BenchError, Result};
use crate::topology::Topology;

/// Minimum interval between two evaluations of the rule set.
pub const DEBOUNCE_MS: u64 = 1000;

/// Code of a category whose states all fail to match.
pub const NO_MATCH: i32 = -1;

/// One named, coded state of a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtatState {
    pub name: String,
    pub code: i32,
    #[serde(default)]
    pub outputs: Vec<PinTarget>,
}

impl EtatState {
    fn matches(&self, topology: &Topology) -> Result<bool> {
        for constraint in &self.outputs {
            if !constraint.holds(topology)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// A category of mutually exclusive states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Etat {
    pub name: String,
    #[serde(default)]
    pub states: Vec<EtatState>,
    /// Cached code of the current state.
    #[serde(rename = "actualCode", default = "no_match")]
    pub actual_code: i32,
    /// Name of the current state, absent when nothing matched.
    #[serde(rename = "actualState", default, skip_serializing_if = "Option::is_none")]
    pub actual_state: Option<String>,
}

const fn no_match() -> i32 {
    NO_MATCH
}

impl Etat {
    /// Evaluate without touching the cache.
    fn evaluate(&self, topology: &Topology) -> Result<Option<&EtatState>> {
        for state in &self.states {
            if state.matches(topology)? {
                return Ok(Some(state));
            }
        }
        Ok(None)
    }
}

/// Owns the Etat categories and their cached codes.
#[derive(Debug, Clone)]
pub struct StateEngine {
    etats: Vec<Etat>,
    last_refresh_ms: Option<u64>,
}

impl StateEngine {
    pub fn new(etats: Vec<Etat>) -> Self {
        Self {
            etats,
            last_refresh_ms: None,
        }
    }

    /// Re-evaluate every category unless the last refresh is younger than
    /// [`DEBOUNCE_MS`].
    ///
    /// Returns `true` when an evaluation actually ran. On error the cache is
    /// left as it was and the next call evaluates again.
    pub fn refresh(&mut self, topology: &Topology, now_ms: u64) -> Result<bool> {
        if self
            .last_refresh_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < DEBOUNCE_MS)
        {
            return Ok(false);
        }

        let mut results = Vec::with_capacity(self.etats.len());
        for etat in &self.etats {
            let current = etat
                .evaluate(topology)?
                .map(|s| (s.code, s.name.clone()));
            results.push(current);
        }
        for (etat, current) in self.etats.iter_mut().zip(results) {
            match current {
                Some((code, name)) => {
                    etat.actual_code = code;
                    etat.actual_state = Some(name);
                }
                None => {
                    etat.actual_code = NO_MATCH;
                    etat.actual_state = None;
                }
            }
        }
        self.last_refresh_ms = Some(now_ms);
        debug!("etats: refreshed {} categories at {now_ms} ms", self.etats.len());
        Ok(true)
    }

    /// Force the next [`refresh`](Self::refresh) to evaluate.
    pub fn invalidate(&mut self) {
        self.last_refresh_ms = None;
    }

    pub fn etats(&self) -> &[Etat] {
        &self.etats
    }

    pub fn etat(&self, name: &str) -> Result<&Etat> {
        self.etats
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| BenchError::EtatNotFound(name.into()))
    }

    /// Cached code of `category`.
    pub fn code_of(&self, category: &str) -> Result<i32> {
        self.etat(category).map(|e| e.actual_code)
    }

    /// Refresh, then read the code of `category`.
    pub fn current_code(&mut self, topology: &Topology, category: &str, now_ms: u64) -> Result<i32> {
        self.refresh(topology, now_ms)?;
        self.code_of(category)
    }
}
