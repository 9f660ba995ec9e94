//! Secure Remote Password (SRP-6a) authenticated key exchange with
//! pluggable per-session storage.
//!
//! SRP lets a client prove knowledge of a password to a server that only
//! ever stores a *verifier* derived from it. A successful exchange also
//! leaves both sides with a shared session secret. This crate implements
//! the SRP-6a flavor checked against the RFC 5054 test vectors, split into
//! three parties:
//!
//! * [`verifier::SrpVerifier`], an offline registration aid turning
//!   (salt, identity, password) into a verifier;
//! * [`client::SrpClient`], a three-step driver proving the password;
//! * [`server::SrpServer`], a two-step driver authenticating the client.
//!
//! The client and server are state machines: each step persists what the
//! next round trip needs through a [`storage::Backend`] keyed by identity,
//! so a single client/server object can juggle many concurrent exchanges.
//! [`storage::memory::MemoryBackend`] is the bundled in-process backend;
//! anything that can hold a [`storage::SessionRecord`] per identity
//! (a cache, a database row) can replace it.
//!
//! # Usage
//!
//! ```
//! use sha2::Sha256;
//! use srp_session::client::SrpClientBuilder;
//! use srp_session::server::SrpServerBuilder;
//! use srp_session::storage::memory::MemoryBackend;
//! use srp_session::utils::generate_random_salt;
//! use srp_session::verifier::SrpVerifierBuilder;
//!
//! # fn main() -> Result<(), srp_session::errors::SrpError> {
//! // Registration, done once: the server persists (identity, salt, v)
//! // out of band. The password itself never leaves the client.
//! let salt = generate_random_salt(16);
//! let v = SrpVerifierBuilder::<Sha256>::new()
//!     .build()
//!     .generate_verifier(&salt, "alice", "password123");
//!
//! let client = SrpClientBuilder::<Sha256>::new().build(MemoryBackend::new());
//! let server = SrpServerBuilder::<Sha256>::new().build(MemoryBackend::new());
//!
//! // Authentication.
//! client.step1("alice", "password123")?;
//! let b_pub = server.step1("alice", &salt, &v)?;
//! let (a_pub, m1) = client.step2("alice", &salt, &b_pub)?;
//! let m2 = server.step2("alice", &salt, &v, &a_pub, &m1)?;
//! client.step3("alice", &m2)?;
//! # Ok(())
//! # }
//! ```
//!
//! Both peers must agree on the hash, the group, and the
//! [`types::XVariant`]; the defaults are SHA-256, the RFC 5054 2048-bit
//! group, and the SRP-6a x = H(s | H(P)) mapping.
//!
//! # Caveats
//!
//! The evidence messages are computed as M1 = H(A | B | S) and
//! M2 = H(A | M1 | S) over *unpadded* big-endian encodings of the raw
//! premaster secret S. Several SRP deployments instead pad A and B or
//! hash K = H(S); peers must use this crate's formulation (or replicate
//! it) to interoperate.
//!
//! There is no wire format: public values and evidence cross the API as
//! arbitrary-precision integers and callers serialize them however their
//! transport likes.

pub mod client;
pub mod errors;
pub mod groups;
pub mod server;
pub mod storage;
pub mod types;
pub mod utils;
pub mod verifier;
