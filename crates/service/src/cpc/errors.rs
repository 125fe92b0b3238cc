use thiserror::Error;

use super::domain::CpcResponse;

/// Why a partner call failed. Folded into a [`CpcResponse`], never returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartnerError {
    /// Partner answered with an error status.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// No response: connection failure or timeout.
    #[error("partner API unavailable - timeout")]
    Unavailable,
    /// Request could not be built or the response could not be read.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PartnerError {
    /// Error status without a usable message in the body.
    pub fn rejected(status: u16, body_message: Option<String>) -> Self {
        let message = body_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("API error: {status}"));
        PartnerError::Rejected { status, message }
    }

    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_builder() {
            PartnerError::Internal(e.to_string())
        } else if e.is_decode() {
            PartnerError::Internal(format!("invalid partner response: {e}"))
        } else {
            PartnerError::Unavailable
        }
    }

    /// Metric/log label.
    pub fn kind(&self) -> &'static str {
        match self {
            PartnerError::Rejected { .. } => "rejected",
            PartnerError::Unavailable => "unavailable",
            PartnerError::Internal(_) => "internal",
        }
    }
}

impl From<PartnerError> for CpcResponse {
    fn from(e: PartnerError) -> Self {
        CpcResponse::failed(e.to_string())
    }
}

/// Pull the partner's own message out of an error body (`mensagem`, then `message`).
pub fn partner_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["mensagem", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
}
