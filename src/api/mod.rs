//! Purpose: Define the public Rust API boundary for bookshelf.
//! Exports: Service types, error types, and the blocking HTTP client.
//! Role: Additive-only surface used by the CLI, server, and integration tests.

mod remote;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::latency::{DEFAULT_LIST_STEP_MS, DEFAULT_SAVE_SCALE_MS, Latency};
pub use crate::core::library::{Library, LibraryObserver, TracingObserver};
pub use remote::RemoteClient;
