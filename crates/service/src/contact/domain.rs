use models::contact::ContactFields;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Contact row as exposed by the service.
pub type Contact = models::contact::Model;

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Input for create-or-merge keyed by phone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertContactInput {
    pub phone: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub segment: Option<i32>,
    #[serde(default, alias = "isCPC")]
    pub is_cpc: Option<bool>,
}

impl UpsertContactInput {
    pub fn new(phone: impl Into<String>) -> Self {
        Self { phone: phone.into(), ..Default::default() }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Non-blank name and cpf must fit their columns. Blank ones are ignored
    /// by [`fields`](Self::fields), so they pass.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            models::contact::validate_name(name)?;
        }
        if let Some(cpf) = self.cpf.as_deref().filter(|c| !c.trim().is_empty()) {
            models::contact::validate_cpf(cpf)?;
        }
        Ok(())
    }

    /// Provided fields only; blank name/cpf count as not provided.
    pub(crate) fn fields(&self) -> ContactFields {
        ContactFields {
            name: non_blank(self.name.clone()),
            cpf: non_blank(self.cpf.clone()),
            segment: self.segment,
            is_cpc: self.is_cpc,
            ..Default::default()
        }
    }
}

/// Listing filter. Both parts optional; empty filter lists everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub segment: Option<i32>,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub segment: Option<i32>,
    #[serde(default, alias = "isCPC")]
    pub is_cpc: Option<bool>,
}

impl ContactPatch {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if let Some(name) = &self.name {
            models::contact::validate_name(name)?;
        }
        if let Some(cpf) = &self.cpf {
            models::contact::validate_cpf(cpf)?;
        }
        Ok(())
    }

    /// New name if it differs from what `current` stores.
    pub(crate) fn renamed_to(&self, current: &Contact) -> Option<String> {
        let name = self.name.as_deref()?.trim();
        (current.name.as_deref() != Some(name)).then(|| name.to_string())
    }

    /// Column changes carried by the patch, before any derived fields.
    pub(crate) fn changes(&self) -> ContactFields {
        ContactFields {
            name: non_blank(self.name.clone()),
            cpf: non_blank(self.cpf.clone()),
            segment: self.segment,
            is_cpc: self.is_cpc,
            ..Default::default()
        }
    }
}
