//! SRP server state machine.
//!
//! The server authenticates a client against a previously registered
//! verifier in two steps:
//!
//! 1. [`SrpServer::step1`] takes the user's (salt, verifier) record and
//!    produces the server public value B;
//! 2. [`SrpServer::step2`] checks the client evidence M1 and, on
//!    success, answers with the server evidence M2 and discards the
//!    session.
//!
//! The server never learns the password; the caller supplies the salt
//! and verifier on every attempt, typically looked up from its user
//! store after the client announces its identity.
//!
//! ```ignore
//! let server = SrpServerBuilder::<Sha256>::new()
//!     .timeout(Duration::from_secs(60))
//!     .build(backend);
//!
//! // ... receive the identity, look up (salt, v) ...
//! let b_pub = server.step1(identity, &salt, &v)?;
//! // ... send (salt, B), receive (A, M1) ...
//! let m2 = server.step2(identity, &salt, &v, &a_pub, &m1)?;
//! // ... send M2 ...
//! ```

use std::marker::PhantomData;
use std::time::{Duration, SystemTime};

use digest::Digest;
use log::{debug, warn};
use num_bigint::BigUint;
use sha2::Sha256;

use crate::errors::SrpError;
use crate::groups::G_2048;
use crate::storage::{Backend, SessionRecord, SessionState};
use crate::types::{SrpGroup, XVariant};
use crate::utils::{
    compute_b_pub, compute_k, compute_m1, compute_m2, compute_server_session_key, compute_u,
    evidence_eq, generate_private_value, is_valid_public_value, PrivateValueFn,
};

/// Builder for [`SrpServer`].
///
/// Defaults mirror [`crate::client::SrpClientBuilder`]: SHA-256 via the
/// digest type parameter, the RFC 5054 2048-bit group,
/// [`XVariant::WithoutUsername`], and no session timeout.
pub struct SrpServerBuilder<D = Sha256> {
    group: SrpGroup,
    x_variant: XVariant,
    timeout: Duration,
    generate_private_value: PrivateValueFn,
    _digest: PhantomData<D>,
}

impl<D: Digest> SrpServerBuilder<D> {
    pub fn new() -> Self {
        Self {
            group: G_2048.clone(),
            x_variant: XVariant::default(),
            timeout: Duration::ZERO,
            generate_private_value,
            _digest: PhantomData,
        }
    }

    /// Replace the default rfc-2048 group.
    pub fn group(mut self, group: SrpGroup) -> Self {
        self.group = group;
        self
    }

    /// Pick the password-to-x mapping.
    pub fn x_variant(mut self, x_variant: XVariant) -> Self {
        self.x_variant = x_variant;
        self
    }

    /// Session inactivity limit. Zero, the default, disables expiry.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the private-value generator.
    ///
    /// The default draws uniformly from the system CSPRNG. Substituting
    /// a fixed-output function makes the exchange deterministic, which
    /// is only ever wanted in tests.
    pub fn private_value_fn(mut self, f: PrivateValueFn) -> Self {
        self.generate_private_value = f;
        self
    }

    /// Finish the builder, attaching the storage backend that will hold
    /// in-flight sessions.
    pub fn build<B: Backend>(self, backend: B) -> SrpServer<B, D> {
        SrpServer {
            backend,
            group: self.group,
            x_variant: self.x_variant,
            timeout: self.timeout,
            generate_private_value: self.generate_private_value,
            _digest: PhantomData,
        }
    }
}

impl<D: Digest> Default for SrpServerBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// SRP server: the party holding the verifier.
///
/// Carries only configuration plus the backend handle; per-exchange
/// state is stored through the backend under the identity. Shareable
/// across threads whenever the backend is.
pub struct SrpServer<B, D = Sha256> {
    backend: B,
    group: SrpGroup,
    // The server's computations never derive x, but the variant is part
    // of the shared deployment configuration the builder records.
    #[allow(dead_code)]
    x_variant: XVariant,
    timeout: Duration,
    generate_private_value: PrivateValueFn,
    _digest: PhantomData<D>,
}

impl<B: Backend, D: Digest> SrpServer<B, D> {
    /// Open a session for the identity and produce the server public
    /// value B = k*v + g^b mod N.
    ///
    /// The salt is accepted alongside the verifier because the two
    /// travel together in the user record; only the verifier enters the
    /// computation.
    pub fn step1(&self, identity: &str, _salt: &[u8], verifier: &BigUint) -> Result<BigUint, SrpError> {
        if identity.is_empty() {
            return Err(SrpError::IllegalParameter { name: "identity" });
        }
        debug!("srp server step1 (identity={identity})");

        let k = compute_k::<D>(&self.group);
        let b = (self.generate_private_value)(&self.group.n)?;
        let b_pub = compute_b_pub(&self.group, &k, verifier, &b);

        let record = SessionRecord::ServerStep1 {
            last_activity: SystemTime::now(),
            b_pub: b_pub.clone(),
            b,
        };
        self.backend
            .put(identity, record)
            .map_err(|source| SrpError::Storage { op: "put", source })?;

        Ok(b_pub)
    }

    /// Verify the client's (A, M1); produce the server evidence M2 and
    /// close the session.
    ///
    /// On an evidence mismatch the session is left intact, so the caller
    /// may retry with corrected input while the timeout window lasts.
    pub fn step2(
        &self,
        identity: &str,
        _salt: &[u8],
        verifier: &BigUint,
        a_pub: &BigUint,
        m1: &BigUint,
    ) -> Result<BigUint, SrpError> {
        if identity.is_empty() {
            return Err(SrpError::IllegalParameter { name: "identity" });
        }
        if !is_valid_public_value(&self.group.n, a_pub) {
            return Err(SrpError::IllegalParameter {
                name: "client public value",
            });
        }
        debug!("srp server step2 (identity={identity})");

        let record = self
            .backend
            .get(identity)
            .map_err(|source| SrpError::Storage { op: "get", source })?;
        let (b_pub, b) = match &record {
            SessionRecord::ServerStep1 { b_pub, b, .. } => (b_pub, b),
            _ => {
                return Err(SrpError::StateViolation {
                    expected: SessionState::Step1,
                })
            }
        };
        if record.timed_out(self.timeout) {
            return Err(SrpError::Timeout);
        }

        let u = compute_u::<D>(&self.group.n, a_pub, b_pub);
        if u == BigUint::default() {
            return Err(SrpError::IllegalParameter {
                name: "scrambling parameter",
            });
        }
        let session_key = compute_server_session_key(&self.group, verifier, &u, a_pub, b);

        let expected = compute_m1::<D>(a_pub, b_pub, &session_key);
        if !evidence_eq(&expected, m1) {
            warn!("srp server step2: client evidence mismatch (identity={identity})");
            return Err(SrpError::BadClientCredentials);
        }

        let m2 = compute_m2::<D>(a_pub, m1, &session_key);

        self.backend
            .delete(identity)
            .map_err(|source| SrpError::Storage { op: "delete", source })?;

        Ok(m2)
    }
}
