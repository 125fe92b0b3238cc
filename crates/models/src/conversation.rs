use sea_orm::{entity::prelude::*, ActiveModelTrait, ConnectionTrait, Set};
use sea_orm::sea_query::Expr;
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Display name held by conversations whose contact is not yet known.
pub const PLACEHOLDER_NAME: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conversation")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub contact_phone: String,
    pub contact_name: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Which conversations a contact rename touches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenameScope {
    /// Only rows still carrying [`PLACEHOLDER_NAME`].
    PlaceholderOnly,
    /// Every row for the phone.
    All,
}

pub async fn create<C: ConnectionTrait>(db: &C, contact_phone: &str, contact_name: Option<&str>) -> Result<Model, ModelError> {
    if contact_phone.trim().is_empty() {
        return Err(ModelError::Validation("contact_phone required".into()));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        contact_phone: Set(contact_phone.trim().to_string()),
        contact_name: Set(contact_name.unwrap_or(PLACEHOLDER_NAME).to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn list_by_phone<C: ConnectionTrait>(db: &C, contact_phone: &str) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find().filter(Column::ContactPhone.eq(contact_phone)).all(db).await?)
}

/// Bulk-rewrite `contact_name` for a phone. Returns the number of rows changed.
pub async fn rename_for_phone<C: ConnectionTrait>(
    db: &C,
    contact_phone: &str,
    contact_name: &str,
    scope: RenameScope,
) -> Result<u64, ModelError> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut update = Entity::update_many()
        .col_expr(Column::ContactName, Expr::value(contact_name.to_string()))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::ContactPhone.eq(contact_phone));
    if scope == RenameScope::PlaceholderOnly {
        update = update.filter(Column::ContactName.eq(PLACEHOLDER_NAME));
    }
    let res = update.exec(db).await?;
    Ok(res.rows_affected)
}
