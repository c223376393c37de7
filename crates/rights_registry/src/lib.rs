//! Rights Registry
//!
//! Mints sequentially numbered rights, tracks the identity currently holding
//! each one and keeps a bounded metadata string per right. Registration and
//! revocation are reserved to a single registry administrator fixed at
//! construction; transfer and metadata updates are reserved to the current
//! owner of the right.
//!
//! Every mutation is authorized and validated before anything is written, then
//! committed to the storage backend as one [`ChangeSet`] and only afterwards
//! applied to the in-memory [`LedgerState`]. A rejected call is a no-op.

pub mod config;
pub mod errors;
pub mod guard;
pub mod logging;
pub mod metadata;
pub mod ownership;
pub mod registry;
pub mod sequence;
pub mod state;
pub mod storage;
pub mod types;

pub use crate::config::RegistryConfig;
pub use errors::*;
pub use guard::{AcceptAnyIdentity, AuthorizationGuard, IdentityPolicy};
pub use registry::RightsRegistry;
pub use state::{ChangeSet, LedgerSnapshot, LedgerState, Mutation};
pub use storage::{MemoryStorage, RegistryStorage, SledStorage};
pub use types::*;
