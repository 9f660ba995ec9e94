//! Offline verifier generation for user registration.
//!
//! The server never stores passwords, only verifiers. At registration
//! time the party that does hold the password (usually the client, or a
//! provisioning tool) derives `v = g^x mod N` and ships
//! (identity, salt, verifier) to the server over a protected channel.
//!
//! ```
//! use sha2::Sha256;
//! use srp_session::utils::generate_random_salt;
//! use srp_session::verifier::SrpVerifierBuilder;
//!
//! let salt = generate_random_salt(16);
//! let generator = SrpVerifierBuilder::<Sha256>::new().build();
//! let v = generator.generate_verifier(&salt, "alice", "password123");
//! ```

use std::marker::PhantomData;

use digest::Digest;
use num_bigint::BigUint;
use sha2::Sha256;

use crate::groups::G_2048;
use crate::types::{SrpGroup, XVariant};
use crate::utils::compute_v;

/// Builder for [`SrpVerifier`].
///
/// Defaults match the client and server builders: SHA-256 via the digest
/// type parameter, the RFC 5054 2048-bit group, and
/// [`XVariant::WithoutUsername`]. All three must match the peers that
/// will consume the verifier.
pub struct SrpVerifierBuilder<D = Sha256> {
    group: SrpGroup,
    x_variant: XVariant,
    _digest: PhantomData<D>,
}

impl<D: Digest> SrpVerifierBuilder<D> {
    pub fn new() -> Self {
        Self {
            group: G_2048.clone(),
            x_variant: XVariant::default(),
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

    pub fn build(self) -> SrpVerifier<D> {
        SrpVerifier {
            group: self.group,
            x_variant: self.x_variant,
            _digest: PhantomData,
        }
    }
}

impl<D: Digest> Default for SrpVerifierBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates password verifiers. Pure and deterministic; holds no
/// per-session state.
pub struct SrpVerifier<D = Sha256> {
    group: SrpGroup,
    x_variant: XVariant,
    _digest: PhantomData<D>,
}

impl<D: Digest> SrpVerifier<D> {
    /// Compute the verifier v = g^x mod N for the given salt and
    /// credentials.
    pub fn generate_verifier(&self, salt: &[u8], identity: &str, password: &str) -> BigUint {
        let x = self.x_variant.compute::<D>(salt, identity, password);
        compute_v(&self.group, &x)
    }
}
