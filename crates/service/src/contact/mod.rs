//! Contact directory: three-layer architecture (domain, repository, service).
//!
//! Contacts are keyed by phone. Name changes are mirrored into the
//! denormalized `contact_name` of conversation rows for the same phone.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use domain::{Contact, ContactFilter, ContactPatch, UpsertContactInput};
pub use service::ContactService;
