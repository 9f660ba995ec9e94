//! The SRP-6a math kernel.
//!
//! Pure functions over [`BigUint`] computing every algebraic quantity the
//! protocol needs: the multiplier k, the password hash x, the verifier v,
//! the public values A and B, the scrambling parameter u, the premaster
//! secret S seen from either side, and the evidence messages M1 and M2.
//! The state machines in [`crate::client`] and [`crate::server`] are thin
//! drivers around these.
//!
//! All arithmetic is modulo the group prime N with nonnegative canonical
//! representatives. `PAD(x)` below means the big-endian encoding of x
//! left-zero-padded to N's byte length; plain concatenation uses the
//! unpadded (trimmed) encoding.

use digest::Digest;
use num_bigint::{BigUint, RandBigInt};
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::errors::SrpError;
use crate::types::SrpGroup;

/// Signature of the private-value generator.
///
/// The default is [`generate_private_value`]; tests substitute a function
/// returning a fixed value to drive the state machines through the
/// RFC 5054 vectors.
pub type PrivateValueFn = fn(&BigUint) -> Result<BigUint, SrpError>;

/// Parse hexadecimal text, tolerating embedded whitespace.
///
/// Only meant for the built-in group constants and for tests.
///
/// # Panics
///
/// Panics on empty input or non-hex characters; both are programming
/// errors in a constant, not runtime conditions.
pub fn biguint_from_hex(text: &str) -> BigUint {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    assert!(!digits.is_empty(), "empty hex input");
    BigUint::parse_bytes(digits.as_bytes(), 16).expect("non-hex character in input")
}

/// Big-endian encoding of `x` left-zero-padded to `len` bytes.
///
/// An encoding already `len` bytes or longer is returned unpadded.
pub fn to_padded_bytes(x: &BigUint, len: usize) -> Vec<u8> {
    let bytes = x.to_bytes_be();
    if bytes.len() >= len {
        return bytes;
    }
    let mut buf = vec![0u8; len];
    buf[len - bytes.len()..].copy_from_slice(&bytes);
    buf
}

// k = H(N | PAD(g)) mod N
pub fn compute_k<D: Digest>(group: &SrpGroup) -> BigUint {
    let n_bytes = group.n.to_bytes_be();
    let mut d = D::new();
    d.update(&n_bytes);
    d.update(to_padded_bytes(&group.g, n_bytes.len()));
    BigUint::from_bytes_be(&d.finalize()) % &group.n
}

/// x = H(s | H(I | ":" | P)), the RFC 5054 form.
pub fn compute_x_with_username<D: Digest>(salt: &[u8], identity: &str, password: &str) -> BigUint {
    let inner = {
        let mut d = D::new();
        d.update(identity.as_bytes());
        d.update(b":");
        d.update(password.as_bytes());
        d.finalize()
    };
    let mut d = D::new();
    d.update(salt);
    d.update(&inner);
    BigUint::from_bytes_be(&d.finalize())
}

/// x = H(s | H(P)), the SRP-6a form.
///
/// The identity argument is accepted for signature symmetry with
/// [`compute_x_with_username`] and does not enter the hash.
pub fn compute_x_without_username<D: Digest>(
    salt: &[u8],
    _identity: &str,
    password: &str,
) -> BigUint {
    let inner = {
        let mut d = D::new();
        d.update(password.as_bytes());
        d.finalize()
    };
    let mut d = D::new();
    d.update(salt);
    d.update(&inner);
    BigUint::from_bytes_be(&d.finalize())
}

// v = g^x mod N
pub fn compute_v(group: &SrpGroup, x: &BigUint) -> BigUint {
    group.g.modpow(x, &group.n)
}

// A = g^a mod N
pub fn compute_a_pub(group: &SrpGroup, a: &BigUint) -> BigUint {
    group.g.modpow(a, &group.n)
}

// B = (k*v + g^b) mod N
pub fn compute_b_pub(group: &SrpGroup, k: &BigUint, v: &BigUint, b: &BigUint) -> BigUint {
    let inter = (k * v) % &group.n;
    (inter + group.g.modpow(b, &group.n)) % &group.n
}

/// u = H(PAD(A) | PAD(B))
///
/// The result is taken as an integer and is deliberately not reduced
/// modulo N. Callers reject u = 0 before using it.
pub fn compute_u<D: Digest>(n: &BigUint, a_pub: &BigUint, b_pub: &BigUint) -> BigUint {
    let len = n.to_bytes_be().len();
    let mut d = D::new();
    d.update(to_padded_bytes(a_pub, len));
    d.update(to_padded_bytes(b_pub, len));
    BigUint::from_bytes_be(&d.finalize())
}

/// Client-side premaster secret S = (B - k*g^x) ^ (a + u*x) mod N.
///
/// The subtraction is performed modulo N so the base stays in [0, N);
/// the exponent is not reduced.
pub fn compute_client_session_key(
    group: &SrpGroup,
    k: &BigUint,
    x: &BigUint,
    u: &BigUint,
    a: &BigUint,
    b_pub: &BigUint,
) -> BigUint {
    let n = &group.n;
    let inter = (k * group.g.modpow(x, n)) % n;
    let base = ((b_pub % n) + n - inter) % n;
    base.modpow(&(a + u * x), n)
}

// S = (A * v^u) ^ b mod N
pub fn compute_server_session_key(
    group: &SrpGroup,
    v: &BigUint,
    u: &BigUint,
    a_pub: &BigUint,
    b: &BigUint,
) -> BigUint {
    let n = &group.n;
    let base = (a_pub * v.modpow(u, n)) % n;
    base.modpow(b, n)
}

/// M1 = H(A | B | S), over unpadded encodings, taken as an integer.
pub fn compute_m1<D: Digest>(a_pub: &BigUint, b_pub: &BigUint, key: &BigUint) -> BigUint {
    let mut d = D::new();
    d.update(a_pub.to_bytes_be());
    d.update(b_pub.to_bytes_be());
    d.update(key.to_bytes_be());
    BigUint::from_bytes_be(&d.finalize())
}

/// M2 = H(A | M1 | S), over unpadded encodings, taken as an integer.
pub fn compute_m2<D: Digest>(a_pub: &BigUint, m1: &BigUint, key: &BigUint) -> BigUint {
    let mut d = D::new();
    d.update(a_pub.to_bytes_be());
    d.update(m1.to_bytes_be());
    d.update(key.to_bytes_be());
    BigUint::from_bytes_be(&d.finalize())
}

/// True unless X is congruent to 0 modulo N.
///
/// Both peers run incoming public values through this before touching
/// them; a multiple of N would collapse the session key to 0.
pub fn is_valid_public_value(n: &BigUint, x: &BigUint) -> bool {
    x % n != BigUint::default()
}

/// Uniform random integer in [1, N-1] from the system CSPRNG.
///
/// Zero is rejected by resampling.
pub fn generate_private_value(n: &BigUint) -> Result<BigUint, SrpError> {
    let mut rng = OsRng;
    loop {
        let v = rng.gen_biguint_below(n);
        if v != BigUint::default() {
            return Ok(v);
        }
    }
}

/// `num_bytes` random bytes from the system CSPRNG.
pub fn generate_random_salt(num_bytes: usize) -> Vec<u8> {
    let mut salt = vec![0u8; num_bytes];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Constant-time equality of two evidence values.
pub(crate) fn evidence_eq(a: &BigUint, b: &BigUint) -> bool {
    a.to_bytes_be().ct_eq(&b.to_bytes_be()).unwrap_u8() == 1
}
