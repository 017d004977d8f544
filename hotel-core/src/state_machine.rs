use std::fmt::Display;

use crate::error::ServiceError;

/// A fixed set of allowed edges between states of type `S`.
///
/// Each entry pairs a source state with every state it may move to. A state
/// without an entry (or with an empty target list) is terminal.
pub struct StateMachine<S: 'static> {
    edges: &'static [(S, &'static [S])],
}

impl<S> StateMachine<S>
where
    S: Copy + PartialEq + Display + 'static,
{
    pub const fn new(edges: &'static [(S, &'static [S])]) -> Self {
        StateMachine { edges }
    }

    pub fn targets(&self, from: S) -> &'static [S] {
        self.edges
            .iter()
            .find(|(state, _)| *state == from)
            .map(|(_, targets)| *targets)
            .unwrap_or(&[])
    }

    pub fn can_transition(&self, from: S, to: S) -> bool {
        self.targets(from).contains(&to)
    }

    pub fn check(&self, from: S, to: S) -> Result<(), ServiceError> {
        if self.can_transition(from, to) {
            Ok(())
        } else {
            Err(ServiceError::invalid_transition(from, to))
        }
    }

    pub fn is_terminal(&self, state: S) -> bool {
        self.targets(state).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;
    use crate::error::ErrorKind;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Light {
        Red,
        Green,
        Yellow,
        Off,
    }

    impl fmt::Display for Light {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", format!("{self:?}").to_lowercase())
        }
    }

    const LIGHTS: StateMachine<Light> = StateMachine::new(&[
        (Light::Red, &[Light::Green, Light::Off]),
        (Light::Green, &[Light::Yellow]),
        (Light::Yellow, &[Light::Red]),
    ]);

    #[test]
    fn test_listed_edges_pass() {
        assert!(LIGHTS.check(Light::Red, Light::Green).is_ok());
        assert!(LIGHTS.check(Light::Yellow, Light::Red).is_ok());
    }

    #[test]
    fn test_unlisted_edge_fails() {
        let err = LIGHTS.check(Light::Green, Light::Red).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(
            err.to_string(),
            "Invalid status transition from green to red"
        );
    }

    #[test]
    fn test_state_without_entry_is_terminal() {
        assert!(LIGHTS.is_terminal(Light::Off));
        assert!(!LIGHTS.is_terminal(Light::Red));
        assert!(LIGHTS.check(Light::Off, Light::Red).is_err());
    }
}
