//! Delivery Console Library
//!
//! Section-scoped configuration editing for the project delivery pipeline:
//! change tracking and validation of each settings section, ordered saves
//! with optimistic concurrency, discard, onboarding progress and bounded
//! job status polling.

pub mod constants;
pub mod domain;
pub mod error;
pub mod helpers;
pub mod services;
pub mod settings;
pub mod state;
