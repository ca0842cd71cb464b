use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("time token '{token}' invalid: {reason}")]
    InvalidTimeToken { token: String, reason: String },

    #[error("hours cell '{cell}' did not contain an en-dash separated range")]
    NoHoursRange { cell: String },

    #[error("feature block is not valid JSON after quote repair: {source}")]
    InvalidFeatureBlock {
        #[source]
        source: serde_json::Error,
    },

    #[error("feature block top-level value must be an object, found {found}")]
    FeatureBlockShape { found: &'static str },
}

impl ParseError {
    pub(crate) fn time_token(token: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTimeToken {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}
