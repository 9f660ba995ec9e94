//! Session storage contract shared by the client and server state
//! machines.
//!
//! Every protocol step persists what the next round trip needs through a
//! [`Backend`] keyed by the user identity, so the [`crate::client`] and
//! [`crate::server`] objects themselves stay stateless and can drive many
//! exchanges at once. [`memory::MemoryBackend`] is the bundled
//! in-process implementation; a distributed deployment would back the
//! trait with a cache or database instead.
//!
//! Records are single-use: the server deletes on a successful step 2, the
//! client on a successful step 3, and a failed call never mutates what is
//! stored. Within one identity, calls must be externally serialized by
//! the caller; `get` followed by `put` is not atomic.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use num_bigint::BigUint;
use thiserror::Error;
use zeroize::Zeroizing;

pub mod memory;

/// Errors returned by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No record exists under the requested key.
    #[error("key not found")]
    NotFound,

    /// The backend's cancellation or deadline context fired before the
    /// operation completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}

/// Protocol state a stored session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// First step completed, waiting for the peer's reply.
    Step1,
    /// Second step completed (client only), waiting for the server
    /// evidence.
    Step2,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step1 => f.write_str("step1"),
            Self::Step2 => f.write_str("step2"),
        }
    }
}

/// Per-identity session record carried across protocol round trips.
///
/// One variant per (role, state), holding exactly the fields that state
/// needs; a record of the wrong variant surfaces as a state violation,
/// never as a missing field.
#[derive(Clone)]
pub enum SessionRecord {
    /// Client after step 1: the password, awaiting the server's public
    /// value. The only point in the protocol where the password is at
    /// rest; it is wiped whenever a copy is dropped.
    ClientStep1 {
        last_activity: SystemTime,
        password: Zeroizing<String>,
    },
    /// Client after step 2: everything needed to verify the server
    /// evidence.
    ClientStep2 {
        last_activity: SystemTime,
        a_pub: BigUint,
        m1: BigUint,
        session_key: BigUint,
    },
    /// Server after step 1: the ephemeral pair, awaiting the client's
    /// proof.
    ServerStep1 {
        last_activity: SystemTime,
        b_pub: BigUint,
        b: BigUint,
    },
}

impl SessionRecord {
    /// Protocol state this record represents.
    pub fn state(&self) -> SessionState {
        match self {
            Self::ClientStep1 { .. } | Self::ServerStep1 { .. } => SessionState::Step1,
            Self::ClientStep2 { .. } => SessionState::Step2,
        }
    }

    /// Wall-clock time of the step that wrote this record.
    pub fn last_activity(&self) -> SystemTime {
        match self {
            Self::ClientStep1 { last_activity, .. }
            | Self::ClientStep2 { last_activity, .. }
            | Self::ServerStep1 { last_activity, .. } => *last_activity,
        }
    }

    /// True if the record's last activity is older than `timeout`.
    ///
    /// A zero timeout never expires, and a record stamped in the future
    /// (clock skew) is treated as fresh.
    pub(crate) fn timed_out(&self, timeout: Duration) -> bool {
        if timeout.is_zero() {
            return false;
        }
        match self.last_activity().elapsed() {
            Ok(elapsed) => elapsed > timeout,
            Err(_) => false,
        }
    }
}

/// Storage backend holding one [`SessionRecord`] per identity.
///
/// `get` must fail with [`StorageError::NotFound`] for absent keys.
/// Backends that support cancellation or deadlines report interruption
/// as [`StorageError::Cancelled`]; the library propagates every backend
/// error to the caller without retrying and without touching its own
/// state.
pub trait Backend {
    /// Insert or replace the record stored under `key`.
    fn put(&self, key: &str, record: SessionRecord) -> Result<(), StorageError>;

    /// Fetch the record stored under `key`.
    fn get(&self, key: &str) -> Result<SessionRecord, StorageError>;

    /// Permanently remove the record stored under `key`.
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Lets one backend instance be shared between roles and threads.
impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn put(&self, key: &str, record: SessionRecord) -> Result<(), StorageError> {
        (**self).put(key, record)
    }

    fn get(&self, key: &str) -> Result<SessionRecord, StorageError> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }
}
