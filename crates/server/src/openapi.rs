use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
#[allow(non_snake_case)]
pub struct ContactDoc {
    pub id: i32,
    pub phone: String,
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub segment: Option<i32>,
    pub isCPC: bool,
    pub lastCPCAt: Option<String>,
    pub isNameManual: bool,
    pub createdAt: String,
    pub updatedAt: String,
}

#[derive(ToSchema)]
#[allow(non_snake_case)]
pub struct UpsertContactDoc {
    pub phone: String,
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub segment: Option<i32>,
    pub isCPC: Option<bool>,
}

#[derive(ToSchema)]
#[allow(non_snake_case)]
pub struct ContactPatchDoc {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub segment: Option<i32>,
    pub isCPC: Option<bool>,
}

#[derive(ToSchema)]
pub struct CpcResponseDoc { pub sucesso: bool, pub mensagem: String }

#[derive(ToSchema)]
pub struct CpcDecisionDoc { pub allowed: bool, pub reason: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::contacts::list,
        crate::routes::contacts::upsert,
        crate::routes::contacts::get_by_id,
        crate::routes::contacts::get_by_phone,
        crate::routes::contacts::update_by_id,
        crate::routes::contacts::update_by_phone,
        crate::routes::contacts::remove_by_id,
        crate::routes::cpc::validate_contract,
        crate::routes::cpc::check_acionamento,
        crate::routes::cpc::register_acionamento,
        crate::routes::cpc::can_contact,
    ),
    components(schemas(
        HealthResponse,
        ContactDoc,
        UpsertContactDoc,
        ContactPatchDoc,
        CpcResponseDoc,
        CpcDecisionDoc,
        crate::routes::cpc::ValidateContractRequest,
        crate::routes::cpc::AcionamentoRequest,
    )),
    tags(
        (name = "system", description = "Health and diagnostics"),
        (name = "contacts", description = "Contact directory"),
        (name = "cpc", description = "Partner can-contact checks"),
    )
)]
pub struct ApiDoc;
