//! Partner can-contact (CPC) gate.
//!
//! Wraps the partner's three endpoints (validate contract, check same-day
//! acionamento, register acionamento) and composes the first two into a single
//! allow/deny decision. Partner failures never escape as errors: they are
//! logged and folded into a `{sucesso: false, mensagem}` response.

pub mod domain;
pub mod errors;
pub mod metrics;
pub mod phone;
pub mod service;

pub use domain::{CpcDecision, CpcResponse};
pub use phone::normalize_phone;
pub use service::CpcService;
