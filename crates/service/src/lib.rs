//! Service layer for the contact feature.
//! - `contact`: the contact directory (CRUD keyed by phone, conversation name cascade).
//! - `cpc`: the partner can-contact gate.
//!
//! Business rules live here; persistence goes through repository traits and
//! the entities in the `models` crate.

pub mod errors;
pub mod contact;
pub mod cpc;
#[cfg(test)]
pub mod test_support;
