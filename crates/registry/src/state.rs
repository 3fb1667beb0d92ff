//! Component lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::ComponentType;

/// The phase a component occupies in its bring-up/tear-down sequence.
///
/// Consensus nodes walk the multi-phase lifecycle `Requested →
/// NonDeployed → Initialized → Setup → Active → Frozen/Stopped`.
/// Auxiliary components (mirror node, explorer, relay, proxies, block
/// nodes) only ever carry the single `Deployed` marker.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentState {
    /// Requested but not yet created in any cluster.
    Requested,

    /// Record exists, workloads not yet deployed.
    NonDeployed,

    /// Workloads deployed, node state initialized.
    Initialized,

    /// Node configuration and keys set up.
    Setup,

    /// Node is running and participating.
    Active,

    /// Node is frozen (e.g. for an upgrade window).
    Frozen,

    /// Node has been stopped.
    Stopped,

    /// Single marker for auxiliary components.
    Deployed,
}

impl ComponentState {
    /// The state a freshly created record of the given type starts in.
    #[must_use]
    pub const fn initial_for(component_type: ComponentType) -> Self {
        match component_type {
            ComponentType::ConsensusNode => Self::Requested,
            _ => Self::Deployed,
        }
    }

    /// Whether the consensus-node lifecycle permits moving from this
    /// state to `next`. Auxiliary components never transition.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::NonDeployed)
                | (Self::NonDeployed, Self::Initialized)
                | (Self::Initialized, Self::Setup)
                | (Self::Setup, Self::Active)
                | (Self::Active, Self::Frozen | Self::Stopped)
                | (Self::Frozen, Self::Active | Self::Stopped)
                | (Self::Stopped, Self::Active)
        )
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Requested => "requested",
            Self::NonDeployed => "non-deployed",
            Self::Initialized => "initialized",
            Self::Setup => "setup",
            Self::Active => "active",
            Self::Frozen => "frozen",
            Self::Stopped => "stopped",
            Self::Deployed => "deployed",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_states() {
        assert_eq!(
            ComponentState::initial_for(ComponentType::ConsensusNode),
            ComponentState::Requested
        );
        assert_eq!(
            ComponentState::initial_for(ComponentType::Relay),
            ComponentState::Deployed
        );
        assert_eq!(
            ComponentState::initial_for(ComponentType::HaProxy),
            ComponentState::Deployed
        );
    }

    #[test]
    fn test_happy_path_transitions() {
        use ComponentState::{Active, Initialized, NonDeployed, Requested, Setup, Stopped};

        let phases = [Requested, NonDeployed, Initialized, Setup, Active, Stopped];
        for pair in phases.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_freeze_and_resume() {
        assert!(ComponentState::Active.can_transition_to(ComponentState::Frozen));
        assert!(ComponentState::Frozen.can_transition_to(ComponentState::Active));
        assert!(ComponentState::Frozen.can_transition_to(ComponentState::Stopped));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!ComponentState::Requested.can_transition_to(ComponentState::Active));
        assert!(!ComponentState::Stopped.can_transition_to(ComponentState::Requested));
        assert!(!ComponentState::Deployed.can_transition_to(ComponentState::Active));
    }
}
