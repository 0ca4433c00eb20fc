//! Domain - Pure Data Structures and Protocol Types
//!
//! These types carry no editor state and describe what the configuration
//! API exchanges.

pub mod config;
pub mod job;
pub mod role;
pub mod section;
pub mod settings;

pub use job::{JobSnapshot, JobStatus};
pub use role::{AccessPolicy, DefaultAccessPolicy, Role};
pub use section::{SAVE_ORDER, SectionKey};
pub use settings::{HitlGates, PreviewStrategy, SlaStage, TemplateSummary, Thresholds};
