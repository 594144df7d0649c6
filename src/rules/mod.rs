//! Rule layer: Etat derivation and command gating.
//!
//! Both rule kinds refer to pins the same way, by on-card pin name shared
//! across a list of cards; see [`PinTarget`].

pub mod commands;
pub mod etats;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::topology::Topology;

pub use commands::{Commande, Condition};
pub use etats::{Etat, EtatState, StateEngine};

/// A pin level on one or more cards.
///
/// As an Etat constraint it holds only when every listed card's pin is at
/// `state`. As a command output it is applied to each listed card in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinTarget {
    pub cards: Vec<String>,
    #[serde(rename = "NumberOnCard")]
    pub number_on_card: String,
    pub state: bool,
}

impl PinTarget {
    /// True when every listed card's pin currently reads `state`.
    ///
    /// Fails on the first card or pin the topology does not know.
    pub fn holds(&self, topology: &Topology) -> Result<bool> {
        for card in &self.cards {
            if topology.pin_level(card, &self.number_on_card)? != self.state {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
