//! Service Layer
//!
//! Everything that talks to the configuration backend: the API contract and
//! its HTTP and in-memory implementations, section persistence, the save
//! orchestrator, job polling and the editor that ties them together.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ConfigEditor                            │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌───────────────┐   │
//! │  │ ValueStore  │  │ SaveOrchestrator │  │ ResetController│  │
//! │  │  (state)    │  │  (sequencing)    │  │  (discard)    │   │
//! │  └─────────────┘  └──────────────────┘  └───────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼ Persister (role check, SLA fan-out)
//! ┌─────────────────────────────────────────────────────────────┐
//! │           ConfigApi: HttpConfigApi | InMemoryConfigApi       │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼ EditorEvent
//!                     UI / binary consumer
//! ```

mod api;
mod editor;
mod events;
mod http_api;
mod memory_api;
mod orchestrator;
mod persister;
mod poller;
mod runtime;

pub use api::*;
pub use editor::*;
pub use events::*;
pub use http_api::*;
pub use memory_api::*;
pub use orchestrator::*;
pub use persister::*;
pub use poller::*;
pub use runtime::*;
