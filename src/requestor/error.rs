use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestErrorKind {
    InvalidRequest,
    Authentication,
    Authorization,
    RateLimited,
    Timeout,
    Network,
    MalformedResponse,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestError {
    pub kind: RequestErrorKind,
    pub message: String,
    pub endpoint: Option<String>,
    pub provider_http_status: Option<u16>,
}

impl RequestError {
    pub fn new(kind: RequestErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            endpoint: None,
            provider_http_status: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_provider_http_status(mut self, status: u16) -> Self {
        self.provider_http_status = Some(status);
        self
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.endpoint, self.provider_http_status) {
            (Some(endpoint), Some(status)) => {
                write!(
                    f,
                    "{} (endpoint={}, status={})",
                    self.message, endpoint, status
                )
            }
            (Some(endpoint), None) => write!(f, "{} (endpoint={})", self.message, endpoint),
            (None, Some(status)) => write!(f, "{} (status={})", self.message, status),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RequestError {}

pub fn invalid_request(message: impl Into<String>) -> RequestError {
    RequestError::new(RequestErrorKind::InvalidRequest, message)
}

pub fn malformed_response(message: impl Into<String>) -> RequestError {
    RequestError::new(RequestErrorKind::MalformedResponse, message)
}

pub fn internal_error(message: impl Into<String>) -> RequestError {
    RequestError::new(RequestErrorKind::Internal, message)
}
