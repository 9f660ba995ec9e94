//! Core SRP types.

use digest::Digest;
use num_bigint::BigUint;

use crate::utils::{compute_x_with_username, compute_x_without_username};

/// Group used for SRP computations.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SrpGroup {
    /// A large safe prime (N = 2q+1, where q is prime)
    pub n: BigUint,
    /// A generator modulo N
    pub g: BigUint,
}

/// Which password-to-x mapping the deployment uses.
///
/// The variant is part of the shared configuration: a client and server
/// (and the verifier generator that registered the user) must all agree,
/// or the derived verifiers and session keys will never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XVariant {
    /// x = H(s | H(I | ":" | P)), the RFC 5054 form.
    WithUsername,
    /// x = H(s | H(P)), the SRP-6a form where the identity is not mixed
    /// into the hash.
    #[default]
    WithoutUsername,
}

impl XVariant {
    /// Compute x from the salt and credentials using this variant.
    pub fn compute<D: Digest>(self, salt: &[u8], identity: &str, password: &str) -> BigUint {
        match self {
            Self::WithUsername => compute_x_with_username::<D>(salt, identity, password),
            Self::WithoutUsername => compute_x_without_username::<D>(salt, identity, password),
        }
    }
}
