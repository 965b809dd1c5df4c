use thiserror::Error;

use crate::http::HttpError;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Unexpected {provider} payload: {message}")]
    Payload {
        provider: &'static str,
        message: String,
    },

    #[error("{0} is not in the remote catalog")]
    UnknownId(String),
}

impl ProviderError {
    pub(crate) fn payload(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Payload {
            provider,
            message: message.into(),
        }
    }
}
