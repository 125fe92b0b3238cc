use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction, EntityTrait, TransactionTrait};

use models::contact::{self, ContactFields};
use models::conversation::{self, RenameScope};

use crate::contact::domain::{Contact, ContactFilter};
use crate::contact::repository::{ContactRepository, ContactTransaction};
use crate::errors::ServiceError;

/// SeaORM-backed repository implementation.
#[derive(Clone)]
pub struct SeaOrmContactRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmContactRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

pub struct SeaOrmContactTransaction {
    txn: DatabaseTransaction,
}

#[async_trait]
impl ContactRepository for SeaOrmContactRepository {
    type Tx = SeaOrmContactTransaction;

    async fn begin(&self) -> Result<Self::Tx, ServiceError> {
        let txn = self.db.begin().await?;
        Ok(SeaOrmContactTransaction { txn })
    }

    async fn list(&self, filter: &ContactFilter) -> Result<Vec<Contact>, ServiceError> {
        Ok(contact::search(&self.db, filter.search.as_deref(), filter.segment).await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Contact>, ServiceError> {
        Ok(contact::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<Contact>, ServiceError> {
        Ok(contact::find_by_phone(&self.db, phone).await?)
    }
}

#[async_trait]
impl ContactTransaction for SeaOrmContactTransaction {
    async fn find_by_id(&mut self, id: i32) -> Result<Option<Contact>, ServiceError> {
        Ok(contact::Entity::find_by_id(id).one(&self.txn).await?)
    }

    async fn find_by_phone(&mut self, phone: &str) -> Result<Option<Contact>, ServiceError> {
        Ok(contact::find_by_phone(&self.txn, phone).await?)
    }

    async fn insert(&mut self, phone: &str, fields: ContactFields) -> Result<Contact, ServiceError> {
        Ok(contact::create(&self.txn, phone, fields).await?)
    }

    async fn update(&mut self, existing: Contact, fields: ContactFields) -> Result<Contact, ServiceError> {
        Ok(contact::update(&self.txn, existing, fields).await?)
    }

    async fn delete(&mut self, id: i32) -> Result<bool, ServiceError> {
        Ok(contact::hard_delete(&self.txn, id).await?)
    }

    async fn rename_conversations(&mut self, phone: &str, name: &str, scope: RenameScope) -> Result<u64, ServiceError> {
        Ok(conversation::rename_for_phone(&self.txn, phone, name, scope).await?)
    }

    async fn commit(self) -> Result<(), ServiceError> {
        self.txn.commit().await?;
        Ok(())
    }
}
