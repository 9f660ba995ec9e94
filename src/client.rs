//! SRP client state machine.
//!
//! The client proves knowledge of the password in three steps, each a
//! separate call so the exchange can straddle network round trips:
//!
//! 1. [`SrpClient::step1`] records the identity and password;
//! 2. [`SrpClient::step2`] consumes the server's public value B and the
//!    salt, and produces the client public value A together with the
//!    client evidence M1;
//! 3. [`SrpClient::step3`] checks the server evidence M2 and, on
//!    success, discards the session.
//!
//! In-flight state lives in the configured [`Backend`] under the
//! identity, so one `SrpClient` can drive any number of concurrent
//! exchanges as long as calls for a single identity are serialized by
//! the caller.
//!
//! ```ignore
//! let client = SrpClientBuilder::<Sha256>::new()
//!     .group(get_group("rfc-4096")?.clone())
//!     .timeout(Duration::from_secs(60))
//!     .build(backend);
//!
//! client.step1(identity, password)?;
//! // ... send the identity, receive (salt, B) ...
//! let (a_pub, m1) = client.step2(identity, &salt, &b_pub)?;
//! // ... send (A, M1), receive M2 ...
//! client.step3(identity, &m2)?;
//! ```

use std::marker::PhantomData;
use std::time::{Duration, SystemTime};

use digest::Digest;
use log::{debug, warn};
use num_bigint::BigUint;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::errors::SrpError;
use crate::groups::G_2048;
use crate::storage::{Backend, SessionRecord, SessionState};
use crate::types::{SrpGroup, XVariant};
use crate::utils::{
    compute_a_pub, compute_client_session_key, compute_k, compute_m1, compute_m2, compute_u,
    evidence_eq, generate_private_value, is_valid_public_value, PrivateValueFn,
};

/// Builder for [`SrpClient`].
///
/// Defaults: SHA-256 via the digest type parameter, the RFC 5054
/// 2048-bit group, [`XVariant::WithoutUsername`], and no session
/// timeout. The hash, group, and variant must match the server's
/// configuration.
pub struct SrpClientBuilder<D = Sha256> {
    group: SrpGroup,
    x_variant: XVariant,
    timeout: Duration,
    generate_private_value: PrivateValueFn,
    _digest: PhantomData<D>,
}

impl<D: Digest> SrpClientBuilder<D> {
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
    pub fn build<B: Backend>(self, backend: B) -> SrpClient<B, D> {
        SrpClient {
            backend,
            group: self.group,
            x_variant: self.x_variant,
            timeout: self.timeout,
            generate_private_value: self.generate_private_value,
            _digest: PhantomData,
        }
    }
}

impl<D: Digest> Default for SrpClientBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// SRP client: the party proving knowledge of the password.
///
/// Carries only configuration plus the backend handle; per-exchange
/// state is stored through the backend under the identity. Shareable
/// across threads whenever the backend is.
pub struct SrpClient<B, D = Sha256> {
    backend: B,
    group: SrpGroup,
    x_variant: XVariant,
    timeout: Duration,
    generate_private_value: PrivateValueFn,
    _digest: PhantomData<D>,
}

impl<B: Backend, D: Digest> SrpClient<B, D> {
    /// Record the identity and password, opening a session.
    ///
    /// Any prior session for the same identity is overwritten without
    /// error, which restarts the exchange.
    pub fn step1(&self, identity: &str, password: &str) -> Result<(), SrpError> {
        if identity.is_empty() {
            return Err(SrpError::IllegalParameter { name: "identity" });
        }
        if password.is_empty() {
            return Err(SrpError::IllegalParameter { name: "password" });
        }
        debug!("srp client step1 (identity={identity})");

        let record = SessionRecord::ClientStep1 {
            last_activity: SystemTime::now(),
            password: Zeroizing::new(password.to_owned()),
        };
        self.backend
            .put(identity, record)
            .map_err(|source| SrpError::Storage { op: "put", source })
    }

    /// Process the server's reply (salt, B); produce (A, M1).
    ///
    /// Requires the session written by [`Self::step1`]. The password is
    /// consumed here: the step-2 record that replaces it holds only the
    /// public value, the evidence, and the session key.
    pub fn step2(
        &self,
        identity: &str,
        salt: &[u8],
        b_pub: &BigUint,
    ) -> Result<(BigUint, BigUint), SrpError> {
        if identity.is_empty() {
            return Err(SrpError::IllegalParameter { name: "identity" });
        }
        if !is_valid_public_value(&self.group.n, b_pub) {
            return Err(SrpError::IllegalParameter {
                name: "server public value",
            });
        }
        debug!("srp client step2 (identity={identity})");

        let record = self
            .backend
            .get(identity)
            .map_err(|source| SrpError::Storage { op: "get", source })?;
        let password = match &record {
            SessionRecord::ClientStep1 { password, .. } => password,
            _ => {
                return Err(SrpError::StateViolation {
                    expected: SessionState::Step1,
                })
            }
        };
        if record.timed_out(self.timeout) {
            return Err(SrpError::Timeout);
        }

        let x = self.x_variant.compute::<D>(salt, identity, password);
        let a = (self.generate_private_value)(&self.group.n)?;
        let a_pub = compute_a_pub(&self.group, &a);
        let k = compute_k::<D>(&self.group);
        let u = compute_u::<D>(&self.group.n, &a_pub, b_pub);
        if u == BigUint::default() {
            return Err(SrpError::IllegalParameter {
                name: "scrambling parameter",
            });
        }
        let session_key = compute_client_session_key(&self.group, &k, &x, &u, &a, b_pub);
        let m1 = compute_m1::<D>(&a_pub, b_pub, &session_key);

        // Replacing the step-1 record also drops (and wipes) the stored
        // password.
        let next = SessionRecord::ClientStep2 {
            last_activity: SystemTime::now(),
            a_pub: a_pub.clone(),
            m1: m1.clone(),
            session_key,
        };
        self.backend
            .put(identity, next)
            .map_err(|source| SrpError::Storage { op: "put", source })?;

        Ok((a_pub, m1))
    }

    /// Verify the server evidence M2 and close the session.
    ///
    /// On a mismatch the session is left intact, so the caller may retry
    /// with a corrected value while the timeout window lasts.
    pub fn step3(&self, identity: &str, m2: &BigUint) -> Result<(), SrpError> {
        if identity.is_empty() {
            return Err(SrpError::IllegalParameter { name: "identity" });
        }
        debug!("srp client step3 (identity={identity})");

        let record = self
            .backend
            .get(identity)
            .map_err(|source| SrpError::Storage { op: "get", source })?;
        let (a_pub, m1, session_key) = match &record {
            SessionRecord::ClientStep2 {
                a_pub,
                m1,
                session_key,
                ..
            } => (a_pub, m1, session_key),
            _ => {
                return Err(SrpError::StateViolation {
                    expected: SessionState::Step2,
                })
            }
        };
        if record.timed_out(self.timeout) {
            return Err(SrpError::Timeout);
        }

        let expected = compute_m2::<D>(a_pub, m1, session_key);
        if !evidence_eq(&expected, m2) {
            warn!("srp client step3: server evidence mismatch (identity={identity})");
            return Err(SrpError::BadServerCredentials);
        }

        self.backend
            .delete(identity)
            .map_err(|source| SrpError::Storage { op: "delete", source })
    }
}
