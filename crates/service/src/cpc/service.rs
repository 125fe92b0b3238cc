use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use configs::CpcConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, error, info, instrument, warn};

use super::domain::{CpcDecision, CpcResponse, RegisterAcionamentoBody, ALLOWED_REASON, DISABLED_MESSAGE};
use super::errors::{partner_message, PartnerError};
use super::metrics;
use super::phone::normalize_phone;

/// Client-side timeout for every partner call.
pub const PARTNER_TIMEOUT: Duration = Duration::from_secs(30);

const VALIDATE_CONTRACT: &str = "validate-contract";
const CHECK_ACIONAMENTO: &str = "check-acionamento";
const REGISTER_ACIONAMENTO: &str = "register-acionamento";

/// Resolved once at construction; never re-read from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Disabled,
    Enabled { base_url: String },
}

/// Partner CPC client.
///
/// Holds only immutable state, so one instance can be shared across requests.
/// When the integration is disabled (flag off or no base URL) every operation
/// answers permissively without touching the network.
#[derive(Clone)]
pub struct CpcService {
    http: reqwest::Client,
    mode: Mode,
}

impl CpcService {
    pub fn new(cfg: &CpcConfig) -> Result<Self, PartnerError> {
        let mode = match cfg.base_url.as_deref().map(str::trim) {
            Some(url) if cfg.enabled && !url.is_empty() => Mode::Enabled { base_url: url.trim_end_matches('/').to_string() },
            _ => Mode::Disabled,
        };

        let mut auth = HeaderValue::from_str(&basic_auth(&cfg.username, &cfg.password))
            .map_err(|e| PartnerError::Internal(e.to_string()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(PARTNER_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| PartnerError::Internal(e.to_string()))?;

        match &mode {
            Mode::Enabled { base_url } => info!(%base_url, username = %cfg.username, "cpc integration enabled"),
            Mode::Disabled => warn!("cpc integration disabled; every contact attempt will be allowed"),
        }
        Ok(Self { http, mode })
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, Mode::Enabled { .. })
    }

    /// `GET validate-contract`; `telefone` is sent only when `phone` is given.
    #[instrument(skip(self))]
    pub async fn validate_contract(&self, contract: &str, segment: &str, phone: Option<&str>) -> CpcResponse {
        let Mode::Enabled { base_url } = &self.mode else {
            return CpcResponse::disabled();
        };
        let telefone = phone.map(normalize_phone);
        let mut params = vec![("contrato", contract), ("segmento", segment)];
        if let Some(t) = telefone.as_deref() {
            params.push(("telefone", t));
        }
        let url = build_url(base_url, VALIDATE_CONTRACT, &params);
        let result = self.send(self.http.get(url)).await;
        settle(VALIDATE_CONTRACT, contract, telefone.as_deref(), result)
    }

    /// `GET check-acionamento`: has this contract already been worked today?
    #[instrument(skip(self))]
    pub async fn check_acionamento(&self, contract: &str, phone: &str, segment: &str) -> CpcResponse {
        let Mode::Enabled { base_url } = &self.mode else {
            return CpcResponse::disabled();
        };
        let telefone = normalize_phone(phone);
        let url = build_url(
            base_url,
            CHECK_ACIONAMENTO,
            &[("contrato", contract), ("telefone", telefone.as_str()), ("segmento", segment)],
        );
        let result = self.send(self.http.get(url)).await;
        settle(CHECK_ACIONAMENTO, contract, Some(telefone.as_str()), result)
    }

    /// `POST register-acionamento`. Callers invoke this after deciding to proceed.
    #[instrument(skip(self))]
    pub async fn register_acionamento(&self, contract: &str, phone: &str, segment: &str) -> CpcResponse {
        let Mode::Enabled { base_url } = &self.mode else {
            return CpcResponse::disabled();
        };
        let body = RegisterAcionamentoBody { telefone: normalize_phone(phone), contrato: contract, segmento: segment };
        let url = format!("{base_url}/{REGISTER_ACIONAMENTO}");
        let result = self.send(self.http.post(url).json(&body)).await;
        settle(REGISTER_ACIONAMENTO, contract, Some(body.telefone.as_str()), result)
    }

    /// Validate the contract, then check today's acionamento history.
    /// The first failing step decides; the check is skipped when validation fails.
    #[instrument(skip(self))]
    pub async fn can_contact(&self, contract: &str, phone: &str, segment: &str) -> CpcDecision {
        if !self.is_enabled() {
            return CpcDecision::allow(DISABLED_MESSAGE);
        }

        let validation = self.validate_contract(contract, segment, Some(phone)).await;
        let decision = if !validation.sucesso {
            CpcDecision::deny(validation.mensagem)
        } else {
            let check = self.check_acionamento(contract, phone, segment).await;
            if check.sucesso {
                CpcDecision::allow(ALLOWED_REASON)
            } else {
                CpcDecision::deny(check.mensagem)
            }
        };

        metrics::record_decision(decision.allowed);
        info!(contract, allowed = decision.allowed, reason = %decision.reason, "cpc_decision");
        decision
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<CpcResponse, PartnerError> {
        let resp = request.send().await.map_err(|e| PartnerError::from_reqwest(&e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PartnerError::rejected(status.as_u16(), partner_message(&body)));
        }
        resp.json::<CpcResponse>().await.map_err(|e| PartnerError::from_reqwest(&e))
    }
}

fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// `{base}/{endpoint}?k=v&...` with values percent-encoded (space as `%20`).
pub(crate) fn build_url(base_url: &str, endpoint: &str, params: &[(&str, &str)]) -> String {
    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{base_url}/{endpoint}?{query}")
}

/// Log and count the outcome, folding failures into the response shape.
fn settle(endpoint: &'static str, contract: &str, telefone: Option<&str>, result: Result<CpcResponse, PartnerError>) -> CpcResponse {
    let phone = telefone.unwrap_or("-");
    match result {
        Ok(resp) => {
            metrics::record_call(endpoint, if resp.sucesso { "ok" } else { "negative" });
            debug!(endpoint, contract, phone, sucesso = resp.sucesso, mensagem = %resp.mensagem, "cpc_partner_response");
            resp
        }
        Err(e) => {
            metrics::record_call(endpoint, e.kind());
            match &e {
                PartnerError::Rejected { status, message } => {
                    warn!(endpoint, contract, phone, status, %message, "cpc partner returned error status")
                }
                PartnerError::Unavailable => error!(endpoint, contract, phone, "cpc partner unavailable"),
                PartnerError::Internal(detail) => error!(endpoint, contract, phone, %detail, "cpc request failed locally"),
            }
            e.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{any, body_json, header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cfg(base_url: Option<String>, enabled: bool) -> CpcConfig {
        CpcConfig { base_url, username: "user".into(), password: "pass".into(), enabled }
    }

    async fn enabled_for(server: &MockServer) -> CpcService {
        CpcService::new(&cfg(Some(server.uri()), true)).unwrap()
    }

    fn ok_body(msg: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "sucesso": true, "mensagem": msg }))
    }

    fn negative_body(msg: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "sucesso": false, "mensagem": msg }))
    }

    #[test]
    fn build_url_encodes_space_as_percent_20() {
        let url = build_url("http://partner", VALIDATE_CONTRACT, &[("contrato", "A B&C"), ("segmento", "7")]);
        assert_eq!(url, "http://partner/validate-contract?contrato=A%20B%26C&segmento=7");
    }

    #[test]
    fn basic_auth_header_value() {
        assert_eq!(basic_auth("user", "pass"), "Basic dXNlcjpwYXNz");
    }

    #[tokio::test]
    async fn validate_contract_sends_auth_and_normalized_phone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/validate-contract"))
            .and(query_param("contrato", "C 1"))
            .and(query_param("segmento", "7"))
            .and(query_param("telefone", "11912345678"))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ok_body("Contrato valido"))
            .expect(1)
            .mount(&server)
            .await;

        let svc = enabled_for(&server).await;
        let resp = svc.validate_contract("C 1", "7", Some("+55 11 91234-5678")).await;
        assert_eq!(resp, CpcResponse::ok("Contrato valido"));
    }

    #[tokio::test]
    async fn validate_contract_without_phone_omits_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/validate-contract"))
            .and(query_param_is_missing("telefone"))
            .respond_with(ok_body("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let svc = enabled_for(&server).await;
        assert!(svc.validate_contract("C1", "7", None).await.sucesso);
    }

    #[tokio::test]
    async fn check_acionamento_sends_all_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/check-acionamento"))
            .and(query_param("contrato", "C1"))
            .and(query_param("telefone", "11999999999"))
            .and(query_param("segmento", "3"))
            .respond_with(negative_body("Ja acionado hoje"))
            .expect(1)
            .mount(&server)
            .await;

        let svc = enabled_for(&server).await;
        let resp = svc.check_acionamento("C1", "5511999999999", "3").await;
        assert_eq!(resp, CpcResponse::failed("Ja acionado hoje"));
    }

    #[tokio::test]
    async fn register_acionamento_posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/register-acionamento"))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .and(body_json(json!({ "telefone": "11999999999", "contrato": "C1", "segmento": "3" })))
            .respond_with(ok_body("Acionamento registrado"))
            .expect(1)
            .mount(&server)
            .await;

        let svc = enabled_for(&server).await;
        let resp = svc.register_acionamento("C1", "55 (11) 99999-9999", "3").await;
        assert!(resp.sucesso);
    }

    #[tokio::test]
    async fn error_status_uses_partner_message() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "sucesso": false, "mensagem": "Segmento invalido" })))
            .mount(&server)
            .await;

        let svc = enabled_for(&server).await;
        assert_eq!(svc.check_acionamento("C1", "11999999999", "x").await, CpcResponse::failed("Segmento invalido"));
    }

    #[tokio::test]
    async fn error_status_without_message_reports_status() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let svc = enabled_for(&server).await;
        assert_eq!(svc.register_acionamento("C1", "11999999999", "1").await, CpcResponse::failed("API error: 500"));
    }

    #[tokio::test]
    async fn unreachable_partner_is_unavailable() {
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let svc = CpcService::new(&cfg(Some(format!("http://127.0.0.1:{port}")), true)).unwrap();

        let resp = svc.validate_contract("C1", "1", Some("11999999999")).await;
        assert_eq!(resp, CpcResponse::failed("partner API unavailable - timeout"));
    }

    #[tokio::test]
    async fn malformed_base_url_is_internal_error() {
        let svc = CpcService::new(&cfg(Some("not a url".into()), true)).unwrap();
        assert!(svc.is_enabled());

        let resp = svc.check_acionamento("C1", "11999999999", "1").await;
        assert!(!resp.sucesso);
        assert!(resp.mensagem.starts_with("internal error:"), "got {}", resp.mensagem);
    }

    #[tokio::test]
    async fn non_json_success_body_is_internal_error() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        let svc = enabled_for(&server).await;
        let resp = svc.validate_contract("C1", "1", None).await;
        assert!(!resp.sucesso);
        assert!(resp.mensagem.starts_with("internal error:"), "got {}", resp.mensagem);
    }

    #[tokio::test]
    async fn can_contact_stops_after_failed_validation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/validate-contract"))
            .respond_with(negative_body("Contrato nao encontrado"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/check-acionamento"))
            .respond_with(ok_body("livre"))
            .expect(0)
            .mount(&server)
            .await;

        let svc = enabled_for(&server).await;
        let decision = svc.can_contact("C404", "5511999999999", "1").await;
        assert_eq!(decision, CpcDecision::deny("Contrato nao encontrado"));
    }

    #[tokio::test]
    async fn can_contact_denies_when_already_worked_today() {
        let server = MockServer::start().await;
        Mock::given(path("/validate-contract"))
            .respond_with(ok_body("Contrato valido"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/check-acionamento"))
            .respond_with(negative_body("Contrato ja acionado hoje"))
            .expect(1)
            .mount(&server)
            .await;

        let svc = enabled_for(&server).await;
        let decision = svc.can_contact("C1", "5511999999999", "1").await;
        assert_eq!(decision, CpcDecision::deny("Contrato ja acionado hoje"));
    }

    #[tokio::test]
    async fn can_contact_allows_and_never_registers() {
        let server = MockServer::start().await;
        Mock::given(path("/validate-contract")).respond_with(ok_body("ok")).expect(1).mount(&server).await;
        Mock::given(path("/check-acionamento")).respond_with(ok_body("ok")).expect(1).mount(&server).await;
        Mock::given(path("/register-acionamento")).respond_with(ok_body("ok")).expect(0).mount(&server).await;

        let svc = enabled_for(&server).await;
        assert_eq!(svc.can_contact("C1", "11999999999", "1").await, CpcDecision::allow(ALLOWED_REASON));
    }

    #[tokio::test]
    async fn can_contact_denies_when_partner_unreachable() {
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let svc = CpcService::new(&cfg(Some(format!("http://127.0.0.1:{port}")), true)).unwrap();

        let decision = svc.can_contact("C1", "11999999999", "1").await;
        assert!(!decision.allowed);
        assert_eq!(decision.reason, "partner API unavailable - timeout");
    }

    #[tokio::test]
    async fn disabled_flag_makes_no_network_calls() {
        let server = MockServer::start().await;
        Mock::given(any()).respond_with(ok_body("unexpected")).expect(0).mount(&server).await;

        let svc = CpcService::new(&cfg(Some(server.uri()), false)).unwrap();
        assert!(!svc.is_enabled());
        assert_eq!(svc.validate_contract("C1", "1", Some("11999999999")).await, CpcResponse::ok(DISABLED_MESSAGE));
        assert_eq!(svc.check_acionamento("C1", "11999999999", "1").await, CpcResponse::ok(DISABLED_MESSAGE));
        assert_eq!(svc.register_acionamento("C1", "11999999999", "1").await, CpcResponse::ok(DISABLED_MESSAGE));
        assert_eq!(svc.can_contact("C1", "11999999999", "1").await, CpcDecision::allow(DISABLED_MESSAGE));
    }

    #[tokio::test]
    async fn missing_base_url_disables_even_when_flag_set() {
        let svc = CpcService::new(&cfg(None, true)).unwrap();
        assert!(!svc.is_enabled());
        assert!(svc.can_contact("C1", "11999999999", "1").await.allowed);

        let svc = CpcService::new(&cfg(Some("   ".into()), true)).unwrap();
        assert!(!svc.is_enabled());
    }
}
