use thiserror::Error;

/// Conditions the outer loop needs to tell apart from plain transport or
/// daemon failures. Everything else travels as a contextual `anyhow` chain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("failed to pick a model")]
    NothingPicked,

    #[error("couldn't find any tags for {0}")]
    NoTags(String),

    #[error("install declined")]
    Declined,

    #[error("quit mid-operation")]
    UserQuit,

    #[error("no actions available for this session")]
    NoApprovedActions,

    #[error("model {0} not found")]
    ModelNotFound(String),
}

impl FlowError {
    /// Cancellations the user asked for. These get a quiet farewell instead
    /// of the error banner, and no operation was performed.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, FlowError::Declined | FlowError::UserQuit)
    }
}

/// Recover the typed condition from an `anyhow` chain, if there is one.
pub fn flow_error(err: &anyhow::Error) -> Option<&FlowError> {
    err.downcast_ref::<FlowError>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_survives_context() {
        use anyhow::Context;
        let err = Err::<(), _>(FlowError::ModelNotFound("llama3".into()))
            .context("delete model")
            .unwrap_err();
        assert_eq!(
            flow_error(&err),
            Some(&FlowError::ModelNotFound("llama3".into()))
        );
    }

    #[test]
    fn cancellations_are_quiet() {
        assert!(FlowError::Declined.is_cancellation());
        assert!(FlowError::UserQuit.is_cancellation());
        assert!(!FlowError::NothingPicked.is_cancellation());
        assert!(!FlowError::ModelNotFound("m".into()).is_cancellation());
    }
}
