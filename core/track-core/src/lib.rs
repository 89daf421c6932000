//! # shiptrack-core
//!
//! Activity-log reconciliation and live tracking for shiptrack clients
//! (the `shiptrack` CLI today, any UI that implements [`RenderSink`]).
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Clients can wrap with async if needed.
//! - **Not thread-safe**: One [`TrackingSession`] per view; clients provide their own `Mutex`.
//! - **Pure core**: Snapshot, merge, reconcile and render never fail and never do I/O.
//! - **Collaborators behind traits**: Storage, history, geocoding and presentation
//!   are reached only through [`services`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shiptrack_core::*;
//!
//! let mut controller = TrackingController::new(
//!     shipments, history, geocoder, RecordingSink::new(), load_config(None)?,
//! );
//! controller.lookup("ST123")?;
//! let table = controller.open_history()?;
//! ```

// Public modules
pub mod config;
pub mod controller;
pub mod ephemeral;
pub mod error;
pub mod map;
pub mod memory;
pub mod reconcile;
pub mod registration;
pub mod render;
pub mod services;
pub mod session;
pub mod snapshot;
pub mod timeline;

// Re-export commonly used items at crate root
pub use config::*;
pub use controller::{PushOutcome, RefreshTicket, TrackingController};
pub use ephemeral::{EphemeralBuffer, MAX_EPHEMERAL_ROWS};
pub use error::{Result, ServiceError, TrackError};
pub use map::*;
pub use memory::{MemoryGeocoder, MemoryHistoryStore, MemoryShipmentStore, RecordingSink, Rendered};
pub use reconcile::{reconcile, reconcile_with_limit, MAX_ACTIVITY_ROWS};
pub use registration::*;
pub use render::*;
pub use services::*;
pub use session::*;
pub use snapshot::{build_snapshot, merge_with_latest};
pub use timeline::*;
