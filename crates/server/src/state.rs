use std::sync::Arc;

use configs::CpcConfig;
use sea_orm::DatabaseConnection;
use service::contact::repo::seaorm::SeaOrmContactRepository;
use service::contact::ContactService;
use service::cpc::CpcService;

/// Shared handler state. Both services are immutable after construction.
#[derive(Clone)]
pub struct ServerState {
    pub contacts: Arc<ContactService<SeaOrmContactRepository>>,
    pub cpc: Arc<CpcService>,
}

impl ServerState {
    pub fn build(db: DatabaseConnection, cpc: &CpcConfig) -> anyhow::Result<Self> {
        let repo = Arc::new(SeaOrmContactRepository::new(db));
        let cpc = CpcService::new(cpc).map_err(|e| anyhow::anyhow!("cpc client: {e}"))?;
        Ok(Self {
            contacts: Arc::new(ContactService::new(repo)),
            cpc: Arc::new(cpc),
        })
    }
}
