//! Command gating and resolution.
//!
//! A command's `conditions` is an OR of AND-groups over Etat codes. A
//! condition with a non-negative code requires the category to be at that
//! code; a negative code `-N` requires it to be anywhere but `N`, including
//! the no-match code `-1`.
//!
//! Evaluation reads cached Etat codes only. Callers refresh the
//! [`StateEngine`] first.

use serde::{Deserialize, Serialize};

use super::{PinTarget, StateEngine};
use crate::error::{BenchError, Result};

/// One gate on an Etat code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub etat: String,
    pub code: i32,
}

impl Condition {
    pub fn holds(&self, engine: &StateEngine) -> Result<bool> {
        let actual = engine.code_of(&self.etat)?;
        Ok(if self.code >= 0 {
            actual == self.code
        } else {
            actual != self.code.saturating_neg()
        })
    }
}

/// A user-invocable batch of pin writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commande {
    pub name: String,
    #[serde(rename = "shortName")]
    pub short_name: String,
    #[serde(default)]
    pub conditions: Vec<Vec<Condition>>,
    #[serde(default)]
    pub outputs: Vec<PinTarget>,
}

impl Commande {
    /// True when there are no condition groups or at least one group holds
    /// entirely. An empty group always holds.
    pub fn is_available(&self, engine: &StateEngine) -> Result<bool> {
        if self.conditions.is_empty() {
            return Ok(true);
        }
        for group in &self.conditions {
            if group_holds(group, engine)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// `(card, pin, level)` writes in dispatch order.
    pub fn writes(&self) -> impl Iterator<Item = (&str, &str, bool)> + '_ {
        self.outputs.iter().flat_map(|out| {
            out.cards
                .iter()
                .map(move |card| (card.as_str(), out.number_on_card.as_str(), out.state))
        })
    }
}

fn group_holds(group: &[Condition], engine: &StateEngine) -> Result<bool> {
    for condition in group {
        if !condition.holds(engine)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Commands that may be dispatched without force right now.
pub fn list_available<'a>(commands: &'a [Commande], engine: &StateEngine) -> Result<Vec<&'a Commande>> {
    let mut available = Vec::new();
    for command in commands {
        if command.conditions.is_empty() || command.is_available(engine)? {
            available.push(command);
        }
    }
    Ok(available)
}

/// Find the command to dispatch.
///
/// With `force` any known command resolves. Without it the command must be
/// available; a known but gated command is [`BenchError::CommandForbidden`].
pub fn resolve<'a>(
    commands: &'a [Commande],
    engine: &StateEngine,
    short_name: &str,
    force: bool,
) -> Result<&'a Commande> {
    let command = commands
        .iter()
        .find(|c| c.short_name == short_name)
        .ok_or_else(|| BenchError::CommandNotFound(short_name.into()))?;
    if force || command.is_available(engine)? {
        Ok(command)
    } else {
        Err(BenchError::CommandForbidden(short_name.into()))
    }
}
