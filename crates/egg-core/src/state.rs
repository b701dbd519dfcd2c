//! Lifecycle states of an egg and the edges between them.
//!
//! ```text
//!        +------> PrerequisitesNotMet
//!        |
//!   Init +------> PrerequisitesMet +----> SettingUp +----> SetUp +---------> Activating +---> Active
//!                        ^                                 + ^                                  +
//!                        |                                 | |                                  |
//!                        +------------+ TearingDown <------+ +-----------+ Deactivating <-------+
//! ```

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EggState {
    /// Initial state, and where a failed prerequisite check leaves the egg.
    #[default]
    PrerequisitesNotMet,
    PrerequisitesMet,
    SettingUp,
    SetUp,
    Activating,
    Active,
    Deactivating,
    TearingDown,
}

impl EggState {
    /// States from which `setup` may be requested.
    #[inline]
    pub fn is_at_rest(self) -> bool {
        matches!(self, Self::PrerequisitesNotMet | Self::PrerequisitesMet)
    }

    /// States owned by an in-flight asynchronous hook.
    #[inline]
    pub fn is_transitional(self) -> bool {
        matches!(
            self,
            Self::SettingUp | Self::Activating | Self::Deactivating | Self::TearingDown
        )
    }

    /// Whether `next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: EggState) -> bool {
        use EggState::*;
        matches!(
            (self, next),
            (PrerequisitesNotMet, PrerequisitesNotMet)
                | (PrerequisitesNotMet, PrerequisitesMet)
                | (PrerequisitesMet, PrerequisitesNotMet)
                | (PrerequisitesMet, PrerequisitesMet)
                | (PrerequisitesMet, SettingUp)
                | (SettingUp, SetUp)
                | (SetUp, Activating)
                | (Activating, Active)
                | (Active, Deactivating)
                | (Deactivating, SetUp)
                | (SetUp, TearingDown)
                | (TearingDown, PrerequisitesMet)
                | (TearingDown, PrerequisitesNotMet)
        )
    }
}

impl fmt::Display for EggState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An asynchronous lifecycle hook awaiting its completion signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Setup,
    Activate,
    Deactivate,
    Teardown,
}

impl Stage {
    /// The state the egg sits in while this stage runs.
    pub fn running_state(self) -> EggState {
        match self {
            Stage::Setup => EggState::SettingUp,
            Stage::Activate => EggState::Activating,
            Stage::Deactivate => EggState::Deactivating,
            Stage::Teardown => EggState::TearingDown,
        }
    }
}
