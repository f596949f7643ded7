//! Single-position state and the actions that move it.

use std::fmt;

/// What the selector wants done this step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    NoOp,
    EnterLong { symbol: String, quantity: i64 },
    Liquidate,
}

impl Action {
    pub fn is_no_op(&self) -> bool {
        matches!(self, Action::NoOp)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NoOp => write!(f, "no-op"),
            Action::EnterLong { symbol, quantity } => write!(f, "enter long {quantity} {symbol}"),
            Action::Liquidate => write!(f, "liquidate"),
        }
    }
}

/// At most one contract is held at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PositionState {
    #[default]
    Flat,
    Holding(String),
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn held_symbol(&self) -> Option<&str> {
        match self {
            PositionState::Flat => None,
            PositionState::Holding(symbol) => Some(symbol),
        }
    }

    /// Transition for an action that has been routed to the order sink.
    pub fn apply(&mut self, action: &Action) {
        match action {
            Action::NoOp => {}
            Action::EnterLong { symbol, .. } => *self = PositionState::Holding(symbol.clone()),
            Action::Liquidate => *self = PositionState::Flat,
        }
    }
}
