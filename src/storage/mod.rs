//! Storage layer for Questlog artifacts.
//!
//! The vault persists these entries (conceptually key → opaque string):
//!
//! - `verification-token` - encrypted constant used to check a password cheaply
//! - `encrypted-state` - encrypted JSON of the application state
//! - `legacy-state` / `legacy-version` - markers left by pre-encryption releases
//!
//! ## Storage Backends
//!
//! - **File backend** (default): one file per artifact in `~/.local/share/questlog/`
//! - **Memory backend**: in-process map for tests and dry runs

pub mod backend;
pub mod file;
pub mod memory;

pub use backend::ArtifactStore;
pub use file::FileStore;
pub use memory::MemoryStore;

/// Key of the encrypted verification literal.
pub const VERIFICATION_KEY: &str = "verification-token";

/// Key of the encrypted application state.
pub const STATE_KEY: &str = "encrypted-state";

/// Keys whose presence marks a pre-encryption legacy install.
pub const LEGACY_KEYS: [&str; 2] = ["legacy-state", "legacy-version"];
