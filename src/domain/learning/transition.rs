use std::fmt;

/// Width of the learned policy's state vector.
pub const STATE_DIM: usize = 6;
pub const ACTION_COUNT: usize = 2;

pub type StateVector = [f64; STATE_DIM];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Local = 0,
    Offload = 1,
}

impl Action {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        if index == 0 { Action::Local } else { Action::Offload }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Local => write!(f, "local"),
            Action::Offload => write!(f, "offload"),
        }
    }
}

/// One experience of the learned policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: StateVector,
    pub action: Action,
    pub reward: f64,
    pub next_state: StateVector,
    pub terminal: bool,
}
