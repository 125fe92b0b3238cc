use std::sync::Arc;

use chrono::Utc;
use models::contact::ContactFields;
use models::conversation::RenameScope;
use tracing::{debug, info, instrument};

use super::domain::{Contact, ContactFilter, ContactPatch, UpsertContactInput};
use super::repository::{ContactRepository, ContactTransaction};
use crate::errors::ServiceError;

/// Contact directory: single source of truth for contact records.
///
/// Every write runs inside one repository transaction covering the lookup,
/// the contact write and the conversation name cascade.
pub struct ContactService<R: ContactRepository> {
    repo: Arc<R>,
}

impl<R: ContactRepository> ContactService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Create the contact for `input.phone`, or merge the provided fields into
    /// the existing one. Conversations still showing the placeholder name pick
    /// up the contact's name.
    ///
    /// # Examples
    /// ```
    /// use service::contact::{ContactService, UpsertContactInput};
    /// use service::contact::repository::mock::MockContactRepository;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockContactRepository::default());
    /// let svc = ContactService::new(repo.clone());
    /// tokio_test::block_on(repo.seed_conversation("5511999999999", None));
    /// let c = tokio_test::block_on(svc.upsert_by_phone(UpsertContactInput::new("5511999999999").with_name("Ana"))).unwrap();
    /// assert_eq!(c.name.as_deref(), Some("Ana"));
    /// assert_eq!(tokio_test::block_on(repo.conversation_names("5511999999999")), vec!["Ana"]);
    /// ```
    #[instrument(skip(self, input), fields(phone = %input.phone))]
    pub async fn upsert_by_phone(&self, input: UpsertContactInput) -> Result<Contact, ServiceError> {
        let phone = models::contact::validate_phone(&input.phone)?;
        input.validate()?;
        let mut fields = input.fields();
        fields.sync_cpc_stamp(Utc::now().into());

        let mut tx = self.repo.begin().await?;
        let contact = match tx.find_by_phone(&phone).await? {
            Some(existing) => {
                let merged = tx.update(existing, fields).await?;
                debug!(contact_id = merged.id, "contact_merged");
                merged
            }
            None => {
                let created = tx.insert(&phone, fields).await?;
                info!(contact_id = created.id, "contact_created");
                created
            }
        };
        if let Some(name) = contact.display_name() {
            let renamed = tx.rename_conversations(&contact.phone, name, RenameScope::PlaceholderOnly).await?;
            if renamed > 0 {
                info!(contact_id = contact.id, renamed, "conversations_renamed");
            }
        }
        tx.commit().await?;
        Ok(contact)
    }

    /// Contacts matching `filter`, newest first.
    pub async fn list(&self, filter: &ContactFilter) -> Result<Vec<Contact>, ServiceError> {
        self.repo.list(filter).await
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Contact, ServiceError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("contact", id))
    }

    /// Absence is not an error here, unlike [`get_by_id`](Self::get_by_id).
    pub async fn get_by_phone(&self, phone: &str) -> Result<Option<Contact>, ServiceError> {
        self.repo.find_by_phone(phone.trim()).await
    }

    /// Apply `patch`; a name change is copied to every conversation of the contact.
    /// `is_cpc` moves `last_cpc_at` with it.
    #[instrument(skip(self, patch))]
    pub async fn update_by_id(&self, id: i32, patch: ContactPatch) -> Result<Contact, ServiceError> {
        patch.validate()?;
        let mut tx = self.repo.begin().await?;
        let existing = tx
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("contact", id))?;
        let renamed_to = patch.renamed_to(&existing);
        let mut changes = patch.changes();
        changes.sync_cpc_stamp(Utc::now().into());
        let updated = apply_patch(&mut tx, existing, changes, renamed_to).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Like [`update_by_id`](Self::update_by_id), plus:
    /// - `is_cpc = true` stamps `last_cpc_at`, `is_cpc = false` clears it;
    /// - a name change marks the name as manually curated.
    #[instrument(skip(self, patch))]
    pub async fn update_by_phone(&self, phone: &str, patch: ContactPatch) -> Result<Contact, ServiceError> {
        patch.validate()?;
        let phone = phone.trim();
        let mut tx = self.repo.begin().await?;
        let existing = tx
            .find_by_phone(phone)
            .await?
            .ok_or_else(|| ServiceError::not_found("contact", phone))?;

        let renamed_to = patch.renamed_to(&existing);
        let mut changes = patch.changes();
        changes.sync_cpc_stamp(Utc::now().into());
        if renamed_to.is_some() {
            changes.is_name_manual = Some(true);
        }

        let updated = apply_patch(&mut tx, existing, changes, renamed_to).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Delete the contact. Its conversations are left in place.
    #[instrument(skip(self))]
    pub async fn remove_by_id(&self, id: i32) -> Result<(), ServiceError> {
        let mut tx = self.repo.begin().await?;
        if !tx.delete(id).await? {
            return Err(ServiceError::not_found("contact", id));
        }
        tx.commit().await?;
        info!(contact_id = id, "contact_removed");
        Ok(())
    }
}

async fn apply_patch<T: ContactTransaction>(
    tx: &mut T,
    existing: Contact,
    changes: ContactFields,
    renamed_to: Option<String>,
) -> Result<Contact, ServiceError> {
    let updated = tx.update(existing, changes).await?;
    info!(contact_id = updated.id, "contact_updated");
    if let Some(name) = renamed_to {
        let renamed = tx.rename_conversations(&updated.phone, &name, RenameScope::All).await?;
        info!(contact_id = updated.id, renamed, "conversations_renamed");
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::repository::mock::MockContactRepository;

    const PHONE: &str = "5511999999999";

    fn svc() -> (Arc<MockContactRepository>, ContactService<MockContactRepository>) {
        let repo = Arc::new(MockContactRepository::default());
        (repo.clone(), ContactService::new(repo))
    }

    #[tokio::test]
    async fn create_renames_placeholder_conversations_only() {
        let (repo, svc) = svc();
        repo.seed_conversation(PHONE, None).await;
        repo.seed_conversation(PHONE, Some("Aninha")).await;

        let c = svc.upsert_by_phone(UpsertContactInput::new(PHONE).with_name("Ana")).await.unwrap();
        assert_eq!(c.name.as_deref(), Some("Ana"));

        let mut names = repo.conversation_names(PHONE).await;
        names.sort();
        assert_eq!(names, vec!["Ana", "Aninha"]);
    }

    #[tokio::test]
    async fn create_without_name_leaves_placeholder() {
        let (repo, svc) = svc();
        repo.seed_conversation(PHONE, None).await;
        svc.upsert_by_phone(UpsertContactInput::new(PHONE)).await.unwrap();
        assert_eq!(repo.conversation_names(PHONE).await, vec!["Unknown"]);
    }

    #[tokio::test]
    async fn upsert_twice_merges_into_one_row() {
        let (repo, svc) = svc();
        let first = svc
            .upsert_by_phone(UpsertContactInput { phone: PHONE.into(), name: Some("Ana".into()), segment: Some(1), ..Default::default() })
            .await
            .unwrap();
        let second = svc
            .upsert_by_phone(UpsertContactInput { phone: PHONE.into(), cpf: Some("12345678901".into()), segment: Some(2), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(repo.contact_count().await, 1);
        assert_eq!(first.id, second.id);
        assert_eq!(second.name.as_deref(), Some("Ana"));
        assert_eq!(second.cpf.as_deref(), Some("12345678901"));
        assert_eq!(second.segment, Some(2));
    }

    #[tokio::test]
    async fn merge_with_known_name_fills_late_placeholder() {
        let (repo, svc) = svc();
        svc.upsert_by_phone(UpsertContactInput::new(PHONE).with_name("Ana")).await.unwrap();
        // conversation opened after the contact got its name
        repo.seed_conversation(PHONE, None).await;
        svc.upsert_by_phone(UpsertContactInput::new(PHONE)).await.unwrap();
        assert_eq!(repo.conversation_names(PHONE).await, vec!["Ana"]);
    }

    #[tokio::test]
    async fn creation_race_surfaces_conflict_and_rolls_back() {
        let (repo, svc) = svc();
        repo.seed_conversation(PHONE, None).await;
        repo.simulate_creation_race(PHONE).await;

        let err = svc.upsert_by_phone(UpsertContactInput::new(PHONE).with_name("Ana")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "unexpected: {err:?}");
        assert_eq!(repo.contact_count().await, 0);
        assert_eq!(repo.conversation_names(PHONE).await, vec!["Unknown"]);
        assert_eq!(repo.commit_count().await, 0);
    }

    #[tokio::test]
    async fn blank_phone_is_rejected() {
        let (_, svc) = svc();
        let err = svc.upsert_by_phone(UpsertContactInput::new("  ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn get_by_id_missing_is_not_found_with_id() {
        let (_, svc) = svc();
        match svc.get_by_id(404).await {
            Err(ServiceError::NotFound { entity, key }) => {
                assert_eq!(entity, "contact");
                assert_eq!(key, "404");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_by_phone_missing_is_none() {
        let (_, svc) = svc();
        assert!(svc.get_by_phone(PHONE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_by_id_renames_all_conversations() {
        let (repo, svc) = svc();
        repo.seed_conversation(PHONE, Some("Aninha")).await;
        let c = svc.upsert_by_phone(UpsertContactInput::new(PHONE).with_name("Ana")).await.unwrap();
        repo.seed_conversation(PHONE, None).await;

        let updated = svc
            .update_by_id(c.id, ContactPatch { name: Some("Ana Maria".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Ana Maria"));
        assert!(!updated.is_name_manual);
        assert_eq!(repo.conversation_names(PHONE).await, vec!["Ana Maria", "Ana Maria"]);
    }

    #[tokio::test]
    async fn update_by_id_same_name_does_not_cascade() {
        let (repo, svc) = svc();
        let c = svc.upsert_by_phone(UpsertContactInput::new(PHONE).with_name("Ana")).await.unwrap();
        repo.seed_conversation(PHONE, Some("Aninha")).await;
        svc.update_by_id(c.id, ContactPatch { name: Some("Ana".into()), segment: Some(5), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(repo.conversation_names(PHONE).await, vec!["Aninha"]);
    }

    #[tokio::test]
    async fn update_by_id_missing_is_not_found() {
        let (_, svc) = svc();
        let err = svc.update_by_id(1, ContactPatch::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_by_phone_stamps_and_clears_cpc() {
        let (_, svc) = svc();
        svc.upsert_by_phone(UpsertContactInput::new(PHONE)).await.unwrap();

        let on = svc.update_by_phone(PHONE, ContactPatch { is_cpc: Some(true), ..Default::default() }).await.unwrap();
        assert!(on.is_cpc);
        assert!(on.last_cpc_at.is_some());

        let off = svc.update_by_phone(PHONE, ContactPatch { is_cpc: Some(false), ..Default::default() }).await.unwrap();
        assert!(!off.is_cpc);
        assert!(off.last_cpc_at.is_none());
    }

    #[tokio::test]
    async fn upsert_keeps_cpc_flag_and_stamp_together() {
        let (_, svc) = svc();
        let on = svc
            .upsert_by_phone(UpsertContactInput { is_cpc: Some(true), ..UpsertContactInput::new(PHONE) })
            .await
            .unwrap();
        assert!(on.is_cpc);
        assert!(on.last_cpc_at.is_some());

        let untouched = svc.upsert_by_phone(UpsertContactInput::new(PHONE).with_name("Ana")).await.unwrap();
        assert!(untouched.is_cpc);
        assert_eq!(untouched.last_cpc_at, on.last_cpc_at);

        let off = svc
            .upsert_by_phone(UpsertContactInput { is_cpc: Some(false), ..UpsertContactInput::new(PHONE) })
            .await
            .unwrap();
        assert!(!off.is_cpc);
        assert!(off.last_cpc_at.is_none());
    }

    #[tokio::test]
    async fn update_by_id_keeps_cpc_flag_and_stamp_together() {
        let (_, svc) = svc();
        let c = svc.upsert_by_phone(UpsertContactInput::new(PHONE)).await.unwrap();
        let on = svc.update_by_id(c.id, ContactPatch { is_cpc: Some(true), ..Default::default() }).await.unwrap();
        assert!(on.is_cpc && on.last_cpc_at.is_some());
        let off = svc.update_by_id(c.id, ContactPatch { is_cpc: Some(false), ..Default::default() }).await.unwrap();
        assert!(!off.is_cpc && off.last_cpc_at.is_none());
    }

    #[tokio::test]
    async fn upsert_rejects_overlong_name_and_cpf() {
        let (repo, svc) = svc();
        let err = svc.upsert_by_phone(UpsertContactInput::new(PHONE).with_name("a".repeat(300))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = svc
            .upsert_by_phone(UpsertContactInput { cpf: Some("1".repeat(15)), ..UpsertContactInput::new(PHONE) })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(repo.contact_count().await, 0);
    }

    #[tokio::test]
    async fn update_by_phone_name_change_marks_manual_and_cascades() {
        let (repo, svc) = svc();
        svc.upsert_by_phone(UpsertContactInput::new(PHONE).with_name("Ana")).await.unwrap();
        repo.seed_conversation(PHONE, Some("Aninha")).await;

        let updated = svc
            .update_by_phone(PHONE, ContactPatch { name: Some("Ana Paula".into()), ..Default::default() })
            .await
            .unwrap();
        assert!(updated.is_name_manual);
        assert_eq!(repo.conversation_names(PHONE).await, vec!["Ana Paula"]);
    }

    #[tokio::test]
    async fn update_by_phone_without_name_keeps_manual_flag() {
        let (_, svc) = svc();
        svc.upsert_by_phone(UpsertContactInput::new(PHONE).with_name("Ana")).await.unwrap();
        let updated = svc.update_by_phone(PHONE, ContactPatch { segment: Some(9), ..Default::default() }).await.unwrap();
        assert!(!updated.is_name_manual);
        assert_eq!(updated.segment, Some(9));
    }

    #[tokio::test]
    async fn update_by_phone_missing_is_not_found() {
        let (_, svc) = svc();
        let err = svc.update_by_phone(PHONE, ContactPatch::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { ref key, .. } if key == PHONE));
    }

    #[tokio::test]
    async fn remove_by_id_keeps_conversations() {
        let (repo, svc) = svc();
        repo.seed_conversation(PHONE, None).await;
        let c = svc.upsert_by_phone(UpsertContactInput::new(PHONE).with_name("Ana")).await.unwrap();

        svc.remove_by_id(c.id).await.unwrap();
        assert_eq!(repo.contact_count().await, 0);
        assert_eq!(repo.conversation_names(PHONE).await, vec!["Ana"]);

        let err = svc.remove_by_id(c.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let (_, svc) = svc();
        let a = svc.upsert_by_phone(UpsertContactInput { phone: "5511900000001".into(), name: Some("Ana".into()), segment: Some(1), ..Default::default() }).await.unwrap();
        let b = svc.upsert_by_phone(UpsertContactInput { phone: "5511900000002".into(), name: Some("Bruno".into()), segment: Some(2), ..Default::default() }).await.unwrap();

        let all = svc.list(&ContactFilter::default()).await.unwrap();
        assert_eq!(all.iter().map(|c| c.id).collect::<Vec<_>>(), vec![b.id, a.id]);

        let ana = svc.list(&ContactFilter { search: Some("ANA".into()), segment: None }).await.unwrap();
        assert_eq!(ana.len(), 1);
        assert_eq!(ana[0].id, a.id);

        let seg = svc.list(&ContactFilter { search: None, segment: Some(2) }).await.unwrap();
        assert_eq!(seg.len(), 1);
        assert_eq!(seg[0].id, b.id);
    }
}
