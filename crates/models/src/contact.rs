use sea_orm::{entity::prelude::*, ActiveModelTrait, ConnectionTrait, QueryOrder, Set, Condition};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contact")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub phone: String,
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub segment: Option<i32>,
    #[serde(rename = "isCPC")]
    pub is_cpc: bool,
    #[serde(rename = "lastCPCAt")]
    pub last_cpc_at: Option<DateTimeWithTimeZone>,
    pub is_name_manual: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Name if present and not blank.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Column widths from the `contact` migration.
pub const NAME_MAX_LEN: usize = 255;
pub const CPF_MAX_LEN: usize = 14;

pub fn validate_phone(phone: &str) -> Result<String, ModelError> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return Err(ModelError::Validation("phone required".into()));
    }
    if trimmed.len() > 32 {
        return Err(ModelError::Validation("phone too long (<=32)".into()));
    }
    Ok(trimmed.to_string())
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::Validation("name must not be blank".into()));
    }
    if name.trim().chars().count() > NAME_MAX_LEN {
        return Err(ModelError::Validation("name too long (<=255)".into()));
    }
    Ok(())
}

pub fn validate_cpf(cpf: &str) -> Result<(), ModelError> {
    if cpf.trim().is_empty() {
        return Err(ModelError::Validation("cpf must not be blank".into()));
    }
    if cpf.trim().chars().count() > CPF_MAX_LEN {
        return Err(ModelError::Validation("cpf too long (<=14)".into()));
    }
    Ok(())
}

/// Fields of a contact row that callers may write. `None` leaves a column untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContactFields {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub segment: Option<i32>,
    pub is_cpc: Option<bool>,
    pub last_cpc_at: Option<Option<DateTimeWithTimeZone>>,
    pub is_name_manual: Option<bool>,
}

impl ContactFields {
    /// Keep `last_cpc_at` in step with `is_cpc`: setting the flag stamps `now`,
    /// clearing it clears the stamp. No-op when `is_cpc` is untouched.
    pub fn sync_cpc_stamp(&mut self, now: DateTimeWithTimeZone) {
        if let Some(is_cpc) = self.is_cpc {
            self.last_cpc_at = Some(is_cpc.then_some(now));
        }
    }

    fn apply(self, am: &mut ActiveModel) {
        if let Some(name) = self.name { am.name = Set(Some(name)); }
        if let Some(cpf) = self.cpf { am.cpf = Set(Some(cpf)); }
        if let Some(segment) = self.segment { am.segment = Set(Some(segment)); }
        if let Some(is_cpc) = self.is_cpc { am.is_cpc = Set(is_cpc); }
        if let Some(last_cpc_at) = self.last_cpc_at { am.last_cpc_at = Set(last_cpc_at); }
        if let Some(manual) = self.is_name_manual { am.is_name_manual = Set(manual); }
    }
}

pub async fn find_by_phone<C: ConnectionTrait>(db: &C, phone: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Phone.eq(phone)).one(db).await?)
}

pub async fn create<C: ConnectionTrait>(db: &C, phone: &str, fields: ContactFields) -> Result<Model, ModelError> {
    let phone = validate_phone(phone)?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut am = ActiveModel {
        phone: Set(phone),
        name: Set(None),
        cpf: Set(None),
        segment: Set(None),
        is_cpc: Set(false),
        last_cpc_at: Set(None),
        is_name_manual: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    fields.apply(&mut am);
    Ok(am.insert(db).await?)
}

pub async fn update<C: ConnectionTrait>(db: &C, existing: Model, fields: ContactFields) -> Result<Model, ModelError> {
    let mut am: ActiveModel = existing.into();
    fields.apply(&mut am);
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

/// Search across name (case-insensitive), phone and cpf, plus exact segment;
/// newest first.
pub async fn search<C: ConnectionTrait>(db: &C, text: Option<&str>, segment: Option<i32>) -> Result<Vec<Model>, ModelError> {
    let mut query = Entity::find();
    if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
        let needle = escape_like(text);
        let lowered = escape_like(&text.to_lowercase());
        query = query.filter(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(Column::Name))).like(contains_pattern(&lowered)))
                .add(Column::Phone.like(contains_pattern(&needle)))
                .add(Column::Cpf.like(contains_pattern(&needle))),
        );
    }
    if let Some(segment) = segment {
        query = query.filter(Column::Segment.eq(segment));
    }
    Ok(query
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .all(db)
        .await?)
}

/// Escape LIKE wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn contains_pattern(escaped: &str) -> LikeExpr {
    LikeExpr::new(format!("%{escaped}%")).escape('\\')
}

pub async fn hard_delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}
