use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The pending inventory action applied to the next resolved product barcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Consume,
    ConsumeSpoiled,
    Purchase,
    Open,
    GetStock,
    AddToShoppingList,
}

impl Mode {
    /// Every mode, in control-code precedence order.
    pub const ALL: [Mode; 6] = [
        Mode::Consume,
        Mode::ConsumeSpoiled,
        Mode::Purchase,
        Mode::Open,
        Mode::GetStock,
        Mode::AddToShoppingList,
    ];

    /// Label used in the "Set state to ..." log line.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Consume => "Consume",
            Mode::ConsumeSpoiled => "Consume (spoiled)",
            Mode::Purchase => "Purchase",
            Mode::Open => "Open",
            Mode::GetStock => "Inventory",
            Mode::AddToShoppingList => "Shopping list",
        }
    }

    /// Name accepted by the `mode` request parameter.
    pub fn param_name(self) -> &'static str {
        match self {
            Mode::Consume => "consume",
            Mode::ConsumeSpoiled => "consume_s",
            Mode::Purchase => "purchase",
            Mode::Open => "open",
            Mode::GetStock => "inventory",
            Mode::AddToShoppingList => "shoppinglist",
        }
    }

    /// Whether a successful action in this mode may revert to [`Mode::Consume`].
    pub fn reverts_after_single_action(self) -> bool {
        matches!(self, Mode::Open | Mode::ConsumeSpoiled)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::AddToShoppingList => f.write_str("Add to shoppinglist"),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode parameter: {0}")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Mode::ALL
            .into_iter()
            .find(|mode| mode.param_name() == wanted)
            .ok_or_else(|| ParseModeError(wanted.to_string()))
    }
}
