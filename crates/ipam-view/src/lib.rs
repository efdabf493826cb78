//! IPAC console view-state
//!
//! Backend-independent logic behind the console screens:
//!
//! - [`collection`]: filter, sort and paginate host lists
//! - [`dnd`]: drag-and-drop reorder and cross-subnet moves
//! - [`topology`]: node positions, pan, zoom and edges of the topology canvases
//! - [`validation`]: form rules and the debounced IP-conflict check
//! - [`cache`]: query cache with optimistic patch and rollback
//! - [`rack`]: U-slot occupancy and rack invariants
//! - [`session`]: persisted session token, remembered email and theme
//!
//! Nothing here performs I/O except [`session::FileStore`] and the
//! [`validation::ConflictProbe`] implementation for
//! [`IpamService`](ipam_client::IpamService).

pub mod cache;
pub mod collection;
pub mod dnd;
pub mod error;
pub mod geometry;
pub mod rack;
pub mod session;
pub mod topology;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use cache::{QueryCache, Snapshot};
pub use collection::{Pagination, SortDirection, SortKey, SortSpec};
pub use dnd::{DragController, DropOutcome};
pub use error::{RackError, SessionError, ValidationErrors};
pub use geometry::{Point, Rect};
pub use session::{FileStore, KeyValueStore, MemoryStore, SessionContext, Theme};
pub use topology::{Interaction, TopologyState, ViewConfig};
pub use validation::{ConflictStatus, HostForm, IpConflictChecker, SubnetForm};
