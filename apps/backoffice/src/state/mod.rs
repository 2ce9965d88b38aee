//! # State Module
//!
//! Application state for the back office.
//!
//! Instead of a single `AppState` struct containing everything, commands
//! take the separate state types they need:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐      │
//! │  │     DbState      │  │  SessionManager  │  │   ConfigState    │      │
//! │  │                  │  │                  │  │                  │      │
//! │  │  Database        │  │  AuthProvider    │  │  currency        │      │
//! │  │  SnapshotCaches  │  │  current session │  │  quotation       │      │
//! │  │  Clock           │  │  observers       │  │  defaults        │      │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────┘      │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: pool and caches are internally synchronized                │
//! │  • SessionManager: RwLock for the session, Mutex for observers         │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod session;

pub use config::ConfigState;
pub use db::{Caches, DbState};
pub use session::{AuthEvent, ObserverId, SessionManager, SessionObserver};
