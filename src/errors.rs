//! Error types.

use thiserror::Error;

use crate::storage::{SessionState, StorageError};

/// Errors surfaced by the verifier generator, client, and server.
///
/// Nothing is retried internally: every failure is returned to the caller
/// and a failed step never advances the stored session state. The two
/// credential variants deliberately carry no detail so they can be
/// forwarded upstream as-is.
#[derive(Debug, Error)]
pub enum SrpError {
    /// Lookup of a named group failed.
    #[error("unknown SRP group '{0}'")]
    UnknownGroup(String),

    /// A caller-supplied value was rejected before any computation.
    #[error("illegal parameter: bad '{name}' value")]
    IllegalParameter {
        /// Parameter name
        name: &'static str,
    },

    /// A storage backend call failed; the session record was not touched.
    #[error("could not {op} session record")]
    Storage {
        /// Which backend operation failed
        op: &'static str,
        #[source]
        source: StorageError,
    },

    /// The stored session was not in the state the operation requires.
    #[error("state violation: session must be in '{expected}' state")]
    StateViolation {
        /// State the operation requires
        expected: SessionState,
    },

    /// The session's last activity is older than the configured timeout.
    #[error("session timeout")]
    Timeout,

    /// The client evidence message did not match (server side).
    #[error("bad client credentials")]
    BadClientCredentials,

    /// The server evidence message did not match (client side).
    #[error("bad server credentials")]
    BadServerCredentials,
}
