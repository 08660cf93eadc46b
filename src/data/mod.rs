//! Data module: distributed fields and the two interface caches.

pub mod correspondence;
pub mod field;
pub mod interface_state;

pub use correspondence::{Correspondence, CorrespondenceCache, RefreshStats};
pub use field::{DistributedField, FieldKind, LocalField};
pub use interface_state::InterfaceStateCache;
