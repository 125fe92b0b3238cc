use serde::{Deserialize, Serialize};

/// Partner response shape, also used for normalized failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpcResponse {
    pub sucesso: bool,
    #[serde(default)]
    pub mensagem: String,
}

pub const DISABLED_MESSAGE: &str = "CPC integration disabled";
pub const ALLOWED_REASON: &str = "contract validated and no acionamento registered today";

impl CpcResponse {
    pub fn ok(mensagem: impl Into<String>) -> Self {
        Self { sucesso: true, mensagem: mensagem.into() }
    }

    pub fn failed(mensagem: impl Into<String>) -> Self {
        Self { sucesso: false, mensagem: mensagem.into() }
    }

    pub(crate) fn disabled() -> Self {
        Self::ok(DISABLED_MESSAGE)
    }
}

/// Outcome of [`CpcService::can_contact`](super::CpcService::can_contact).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpcDecision {
    pub allowed: bool,
    pub reason: String,
}

impl CpcDecision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self { allowed: true, reason: reason.into() }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self { allowed: false, reason: reason.into() }
    }
}

/// JSON body of `register-acionamento`.
#[derive(Debug, Serialize)]
pub(crate) struct RegisterAcionamentoBody<'a> {
    pub telefone: String,
    pub contrato: &'a str,
    pub segmento: &'a str,
}
