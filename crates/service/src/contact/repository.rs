use async_trait::async_trait;
use models::contact::ContactFields;
use models::conversation::RenameScope;

use super::domain::{Contact, ContactFilter};
use crate::errors::ServiceError;

/// Repository abstraction for contact persistence.
///
/// Reads go straight to the store. Multi-step writes go through a
/// [`ContactTransaction`] obtained from [`begin`](ContactRepository::begin):
/// nothing is visible to other callers until `commit`, and dropping the
/// transaction discards its writes.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    type Tx: ContactTransaction;

    async fn begin(&self) -> Result<Self::Tx, ServiceError>;

    async fn list(&self, filter: &ContactFilter) -> Result<Vec<Contact>, ServiceError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Contact>, ServiceError>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<Contact>, ServiceError>;
}

/// Unit of work spanning lookup, write and conversation cascade.
#[async_trait]
pub trait ContactTransaction: Send {
    async fn find_by_id(&mut self, id: i32) -> Result<Option<Contact>, ServiceError>;
    async fn find_by_phone(&mut self, phone: &str) -> Result<Option<Contact>, ServiceError>;
    /// Fails with `Conflict` if the phone already exists.
    async fn insert(&mut self, phone: &str, fields: ContactFields) -> Result<Contact, ServiceError>;
    async fn update(&mut self, existing: Contact, fields: ContactFields) -> Result<Contact, ServiceError>;
    async fn delete(&mut self, id: i32) -> Result<bool, ServiceError>;
    /// Rewrite `contact_name` on conversations for `phone`; returns rows changed.
    async fn rename_conversations(&mut self, phone: &str, name: &str, scope: RenameScope) -> Result<u64, ServiceError>;

    async fn commit(self) -> Result<(), ServiceError>;
}

/// In-memory repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Arc;

    use chrono::Utc;
    use models::conversation::PLACEHOLDER_NAME;
    use sea_orm::prelude::DateTimeWithTimeZone;
    use tokio::sync::{Mutex, OwnedMutexGuard};

    #[derive(Clone, Debug)]
    struct ConversationRow {
        contact_phone: String,
        contact_name: String,
    }

    #[derive(Clone, Debug, Default)]
    struct MemoryState {
        contacts: BTreeMap<i32, Contact>,
        conversations: Vec<ConversationRow>,
        next_id: i32,
        // phones whose next insert loses a simulated creation race; consumed
        // outside the transaction so a rolled-back attempt does not re-arm it
        conflicting_phones: HashSet<String>,
        commits: usize,
    }

    impl MemoryState {
        fn by_phone(&self, phone: &str) -> Option<Contact> {
            self.contacts.values().find(|c| c.phone == phone).cloned()
        }
    }

    #[derive(Clone, Default)]
    pub struct MockContactRepository {
        state: Arc<Mutex<MemoryState>>,
    }

    impl MockContactRepository {
        pub async fn seed_conversation(&self, contact_phone: &str, contact_name: Option<&str>) {
            let mut state = self.state.lock().await;
            state.conversations.push(ConversationRow {
                contact_phone: contact_phone.to_string(),
                contact_name: contact_name.unwrap_or(PLACEHOLDER_NAME).to_string(),
            });
        }

        pub async fn conversation_names(&self, contact_phone: &str) -> Vec<String> {
            let state = self.state.lock().await;
            state
                .conversations
                .iter()
                .filter(|c| c.contact_phone == contact_phone)
                .map(|c| c.contact_name.clone())
                .collect()
        }

        pub async fn contact_count(&self) -> usize {
            self.state.lock().await.contacts.len()
        }

        pub async fn commit_count(&self) -> usize {
            self.state.lock().await.commits
        }

        /// Make the next insert for `phone` fail as if another writer created it first.
        pub async fn simulate_creation_race(&self, phone: &str) {
            self.state.lock().await.conflicting_phones.insert(phone.to_string());
        }
    }

    pub struct MockContactTransaction {
        guard: OwnedMutexGuard<MemoryState>,
        working: MemoryState,
    }

    #[async_trait]
    impl ContactRepository for MockContactRepository {
        type Tx = MockContactTransaction;

        async fn begin(&self) -> Result<Self::Tx, ServiceError> {
            let guard = Arc::clone(&self.state).lock_owned().await;
            let working = guard.clone();
            Ok(MockContactTransaction { guard, working })
        }

        async fn list(&self, filter: &ContactFilter) -> Result<Vec<Contact>, ServiceError> {
            let state = self.state.lock().await;
            let needle = filter
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase);
            let mut found: Vec<Contact> = state
                .contacts
                .values()
                .filter(|c| match &needle {
                    Some(n) => {
                        c.name.as_deref().map(|name| name.to_lowercase().contains(n.as_str())).unwrap_or(false)
                            || c.phone.contains(n.as_str())
                            || c.cpf.as_deref().map(|cpf| cpf.contains(n.as_str())).unwrap_or(false)
                    }
                    None => true,
                })
                .filter(|c| filter.segment.map_or(true, |s| c.segment == Some(s)))
                .cloned()
                .collect();
            found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(found)
        }

        async fn find_by_id(&self, id: i32) -> Result<Option<Contact>, ServiceError> {
            Ok(self.state.lock().await.contacts.get(&id).cloned())
        }

        async fn find_by_phone(&self, phone: &str) -> Result<Option<Contact>, ServiceError> {
            Ok(self.state.lock().await.by_phone(phone))
        }
    }

    #[async_trait]
    impl ContactTransaction for MockContactTransaction {
        async fn find_by_id(&mut self, id: i32) -> Result<Option<Contact>, ServiceError> {
            Ok(self.working.contacts.get(&id).cloned())
        }

        async fn find_by_phone(&mut self, phone: &str) -> Result<Option<Contact>, ServiceError> {
            Ok(self.working.by_phone(phone))
        }

        async fn insert(&mut self, phone: &str, fields: ContactFields) -> Result<Contact, ServiceError> {
            if self.guard.conflicting_phones.remove(phone) || self.working.by_phone(phone).is_some() {
                return Err(ServiceError::Conflict(format!("contact.phone {phone}")));
            }
            self.working.next_id += 1;
            let now: DateTimeWithTimeZone = Utc::now().into();
            let mut contact = Contact {
                id: self.working.next_id,
                phone: phone.to_string(),
                name: None,
                cpf: None,
                segment: None,
                is_cpc: false,
                last_cpc_at: None,
                is_name_manual: false,
                created_at: now,
                updated_at: now,
            };
            apply(&mut contact, fields);
            self.working.contacts.insert(contact.id, contact.clone());
            Ok(contact)
        }

        async fn update(&mut self, existing: Contact, fields: ContactFields) -> Result<Contact, ServiceError> {
            let stored = self
                .working
                .contacts
                .get_mut(&existing.id)
                .ok_or_else(|| ServiceError::not_found("contact", existing.id))?;
            apply(stored, fields);
            stored.updated_at = Utc::now().into();
            Ok(stored.clone())
        }

        async fn delete(&mut self, id: i32) -> Result<bool, ServiceError> {
            Ok(self.working.contacts.remove(&id).is_some())
        }

        async fn rename_conversations(&mut self, phone: &str, name: &str, scope: RenameScope) -> Result<u64, ServiceError> {
            let mut changed = 0;
            for conv in self.working.conversations.iter_mut().filter(|c| c.contact_phone == phone) {
                if scope == RenameScope::PlaceholderOnly && conv.contact_name != PLACEHOLDER_NAME {
                    continue;
                }
                conv.contact_name = name.to_string();
                changed += 1;
            }
            Ok(changed)
        }

        async fn commit(mut self) -> Result<(), ServiceError> {
            self.working.commits += 1;
            let pending = std::mem::take(&mut self.guard.conflicting_phones);
            *self.guard = self.working;
            self.guard.conflicting_phones = pending;
            Ok(())
        }
    }

    fn apply(contact: &mut Contact, fields: ContactFields) {
        if let Some(name) = fields.name { contact.name = Some(name); }
        if let Some(cpf) = fields.cpf { contact.cpf = Some(cpf); }
        if let Some(segment) = fields.segment { contact.segment = Some(segment); }
        if let Some(is_cpc) = fields.is_cpc { contact.is_cpc = is_cpc; }
        if let Some(last_cpc_at) = fields.last_cpc_at { contact.last_cpc_at = last_cpc_at; }
        if let Some(manual) = fields.is_name_manual { contact.is_name_manual = manual; }
    }
}
