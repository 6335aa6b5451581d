//! Questlog - encrypted vault and state engine for a gamified productivity tracker.
//!
//! The library pairs two subsystems:
//! - the [`vault`], a password-derived encryption layer that is the only path between the
//!   in-memory [`models::AppState`] and its persisted form;
//! - the [`engine`], a deterministic reducer chain that turns [`engine::Action`]s into new
//!   states while applying XP, leveling, streak, quest, questline, loot and achievement rules.
//!
//! [`session::Session`] wires them together: unlock, hydrate, roll the day over, then reduce
//! and persist every accepted action through the [`persist::Persister`].

pub mod achievements;
pub mod cli;
pub mod commands;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod hydrate;
pub mod leveling;
pub mod models;
pub mod persist;
pub mod session;
pub mod storage;
pub mod suggest;
pub mod vault;


/// Library-level error type for Questlog operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authenticated decryption failed: wrong password or tampered ciphertext.
    #[error("Invalid credentials: wrong password or corrupted data")]
    InvalidCredentials,

    /// The vault was asked to unlock but holds no verification token.
    #[error("Vault has no verification token; create a password first")]
    MissingVerificationToken,

    #[error("Corrupt bundle: {0}")]
    CorruptBundle(String),

    #[error("Corrupt ciphertext: {0}")]
    CorruptCiphertext(String),

    #[error("Not initialized: run `qlog init` first")]
    NotInitialized,

    #[error("Vault already initialized")]
    AlreadyInitialized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error should be shown to the user as "wrong password / corrupted data".
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, Error::InvalidCredentials | Error::CorruptCiphertext(_))
    }
}

/// Result type alias for Questlog operations.
pub type Result<T> = std::result::Result<T, Error>;
