//! Pre-flight lifecycle state checks.
//!
//! Multi-step node operations validate the component's current state
//! before any destructive action; the state change itself is applied
//! later through [`crate::RegistryManager::modify`], never by direct
//! mutation.

use std::fmt;

use ledgerctl_registry::{ComponentRegistry, ComponentState, ComponentType};

use crate::error::{Error, Result};

/// Accepted/excluded state sets for one validation.
///
/// Empty constraints always pass.
#[derive(Clone, Debug, Default)]
pub struct StateConstraints {
    /// States the component must currently be in, when given.
    pub accepted: Option<Vec<ComponentState>>,

    /// States the component must not currently be in, when given.
    pub excluded: Option<Vec<ComponentState>>,
}

impl StateConstraints {
    /// Constraints requiring the current state to be one of `states`.
    #[must_use]
    pub fn accepting(states: impl Into<Vec<ComponentState>>) -> Self {
        Self {
            accepted: Some(states.into()),
            excluded: None,
        }
    }

    /// Constraints forbidding the current state from being one of
    /// `states`.
    #[must_use]
    pub fn excluding(states: impl Into<Vec<ComponentState>>) -> Self {
        Self {
            accepted: None,
            excluded: Some(states.into()),
        }
    }

    fn permits(&self, state: ComponentState) -> bool {
        if let Some(accepted) = &self.accepted {
            if !accepted.contains(&state) {
                return false;
            }
        }
        if let Some(excluded) = &self.excluded {
            if excluded.contains(&state) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for StateConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn render(states: &[ComponentState]) -> String {
            states
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }

        match (&self.accepted, &self.excluded) {
            (None, None) => write!(f, "unconstrained"),
            (Some(a), None) => write!(f, "accepted: [{}]", render(a)),
            (None, Some(e)) => write!(f, "excluded: [{}]", render(e)),
            (Some(a), Some(e)) => {
                write!(f, "accepted: [{}], excluded: [{}]", render(a), render(e))
            }
        }
    }
}

/// Validates component states against constraints before an operation
/// proceeds.
#[derive(Clone, Copy, Debug)]
pub struct StateValidator<'a> {
    registry: &'a ComponentRegistry,
}

impl<'a> StateValidator<'a> {
    /// Creates a validator over the given registry.
    #[must_use]
    pub const fn new(registry: &'a ComponentRegistry) -> Self {
        Self { registry }
    }

    /// Checks that the component's current state satisfies the
    /// constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Registry`] if the component does not exist, or
    /// [`Error::InvalidState`] naming the id, current state, and
    /// constraint sets if the check fails.
    pub fn validate(
        &self,
        component_type: ComponentType,
        id: u32,
        constraints: &StateConstraints,
    ) -> Result<()> {
        let current = self.registry.get(component_type, id)?.state();

        if constraints.permits(current) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                component_type,
                id,
                current,
                constraints: constraints.to_string(),
            })
        }
    }
}
