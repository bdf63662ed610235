/// Statement-scoped failure raised while executing one script line.
///
/// Every variant is recoverable: the interpreter records the message against
/// the offending line and moves on to the next one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    /// Malformed statement, argument or literal.
    #[error("{0}")]
    Validation(String),

    /// An outbound URL was rejected by the egress policy.
    #[error("{0}")]
    Security(String),

    /// A required endpoint or credential is not configured.
    #[error("{0}")]
    Configuration(String),

    /// The tool name is outside the fixed catalog.
    #[error("tool not allowed: {0}")]
    ToolNotAllowed(String),

    /// The per-run tool-call ceiling has been exceeded.
    #[error("tool call limit exceeded (limit {limit})")]
    ToolBudgetExceeded { limit: u32 },

    /// Appending to the output buffer would exceed its byte ceiling.
    #[error("stdout limit exceeded ({limit} bytes)")]
    OutputBudgetExceeded { limit: usize },

    /// A collaborator answered with a failure or an unusable body.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// `generate` was used without text generation enabled.
    #[error("generate disabled; enable ALLOW_LLM_SUMMARIZATION")]
    FeatureDisabled,
}

impl ScriptError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn security(msg: impl Into<String>) -> Self {
        Self::Security(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_not_allowed_names_the_tool() {
        let err = ScriptError::ToolNotAllowed("unknown_tool".to_string());
        assert_eq!(err.to_string(), "tool not allowed: unknown_tool");
    }

    #[test]
    fn budget_messages_mention_the_limit() {
        let err = ScriptError::ToolBudgetExceeded { limit: 20 };
        assert!(err.to_string().starts_with("tool call limit exceeded"));
        assert!(err.to_string().contains("20"));

        let err = ScriptError::OutputBudgetExceeded { limit: 64 };
        assert_eq!(err.to_string(), "stdout limit exceeded (64 bytes)");
    }

    #[test]
    fn feature_disabled_message() {
        assert!(ScriptError::FeatureDisabled
            .to_string()
            .starts_with("generate disabled"));
    }

    #[test]
    fn validation_is_bare_message() {
        assert_eq!(
            ScriptError::validation("unsupported statement").to_string(),
            "unsupported statement"
        );
    }
}
