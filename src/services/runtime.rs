//! Tokio Runtime Bridge
//!
//! The binary is synchronous at its edge; API calls and job polling need
//! tokio. One lazily built multi-threaded runtime is shared by the process.
//!
//! ```text
//! main()
//!   │
//!   ▼
//! block_on(editor.load_all())      spawn_in_tokio(watch_job(...))
//!   │                                 │
//!   ▼                                 ▼
//! tokio::Runtime (global, shared by both)
//! ```

use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

use crate::error::Result;

/// Global tokio runtime instance
static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or initialize the global tokio runtime
fn get_runtime() -> Result<&'static Runtime> {
    if let Some(runtime) = TOKIO_RUNTIME.get() {
        return Ok(runtime);
    }
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .thread_name("delivery-console-io")
        .build()?;
    Ok(TOKIO_RUNTIME.get_or_init(|| runtime))
}

/// Drive a future to completion on the global runtime
///
/// Must not be called from inside a tokio task.
pub fn block_on<F>(future: F) -> Result<F::Output>
where
    F: Future,
{
    Ok(get_runtime()?.block_on(future))
}

/// Spawn a background task (job watchers) on the global runtime
pub fn spawn_in_tokio<F>(future: F) -> Result<JoinHandle<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    Ok(get_runtime()?.spawn(future))
}
