//! End-to-end exercises of the client and server state machines, plus
//! the failure paths a network peer can trigger.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use num_bigint::BigUint;
use sha1::Sha1;
use sha2::Sha256;
use srp_session::client::SrpClientBuilder;
use srp_session::errors::SrpError;
use srp_session::groups::get_group;
use srp_session::server::SrpServerBuilder;
use srp_session::storage::memory::MemoryBackend;
use srp_session::storage::{Backend, SessionRecord, SessionState, StorageError};
use srp_session::types::XVariant;
use srp_session::utils::generate_random_salt;
use srp_session::verifier::SrpVerifierBuilder;

fn vector_a(_n: &BigUint) -> Result<BigUint, SrpError> {
    Ok(common::a())
}

fn vector_b(_n: &BigUint) -> Result<BigUint, SrpError> {
    Ok(common::b())
}

/// Counts backend calls so tests can assert that input validation fires
/// before any storage access.
#[derive(Default)]
struct CountingBackend {
    calls: AtomicUsize,
    inner: MemoryBackend,
}

impl CountingBackend {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Backend for CountingBackend {
    fn put(&self, key: &str, record: SessionRecord) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, record)
    }

    fn get(&self, key: &str) -> Result<SessionRecord, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key)
    }
}

#[test]
fn full_dance_succeeds_and_deletes_both_sessions() {
    let salt = generate_random_salt(16);
    let v = SrpVerifierBuilder::<Sha256>::new()
        .build()
        .generate_verifier(&salt, common::IDENTITY, common::PASSWORD);

    let client_store = Arc::new(MemoryBackend::new());
    let server_store = Arc::new(MemoryBackend::new());
    let client = SrpClientBuilder::<Sha256>::new().build(Arc::clone(&client_store));
    let server = SrpServerBuilder::<Sha256>::new().build(Arc::clone(&server_store));

    client.step1(common::IDENTITY, common::PASSWORD).unwrap();
    let b_pub = server.step1(common::IDENTITY, &salt, &v).unwrap();
    let (a_pub, m1) = client.step2(common::IDENTITY, &salt, &b_pub).unwrap();
    let m2 = server
        .step2(common::IDENTITY, &salt, &v, &a_pub, &m1)
        .unwrap();
    client.step3(common::IDENTITY, &m2).unwrap();

    assert!(matches!(
        client_store.get(common::IDENTITY),
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        server_store.get(common::IDENTITY),
        Err(StorageError::NotFound)
    ));
}

#[test]
fn wrong_password_fails_at_server_step2() {
    let salt = generate_random_salt(16);
    let v = SrpVerifierBuilder::<Sha256>::new()
        .build()
        .generate_verifier(&salt, common::IDENTITY, common::PASSWORD);

    let server_store = Arc::new(MemoryBackend::new());
    let client = SrpClientBuilder::<Sha256>::new().build(MemoryBackend::new());
    let server = SrpServerBuilder::<Sha256>::new().build(Arc::clone(&server_store));

    client.step1(common::IDENTITY, "paSsword123").unwrap();
    let b_pub = server.step1(common::IDENTITY, &salt, &v).unwrap();
    let (a_pub, m1) = client.step2(common::IDENTITY, &salt, &b_pub).unwrap();

    assert!(matches!(
        server.step2(common::IDENTITY, &salt, &v, &a_pub, &m1),
        Err(SrpError::BadClientCredentials)
    ));
    // Deletion happens only on success.
    assert!(server_store.get(common::IDENTITY).is_ok());
}

#[test]
fn repeating_step1_overwrites_the_session() {
    let store = Arc::new(MemoryBackend::new());
    let client = SrpClientBuilder::<Sha256>::new().build(Arc::clone(&store));

    client.step1(common::IDENTITY, "first").unwrap();
    client.step1(common::IDENTITY, "second").unwrap();

    let record = store.get(common::IDENTITY).unwrap();
    assert_eq!(record.state(), SessionState::Step1);
}

#[test]
fn client_steps_match_rfc5054_vector() {
    let store = Arc::new(MemoryBackend::new());
    let client = SrpClientBuilder::<Sha1>::new()
        .group(get_group("rfc-1024").unwrap().clone())
        .x_variant(XVariant::WithUsername)
        .private_value_fn(vector_a)
        .build(Arc::clone(&store));

    client.step1(common::IDENTITY, common::PASSWORD).unwrap();
    let (a_pub, m1) = client
        .step2(common::IDENTITY, &common::salt(), &common::b_pub())
        .unwrap();
    assert_eq!(a_pub, common::a_pub());
    assert_eq!(m1, common::m1());

    client.step3(common::IDENTITY, &common::m2()).unwrap();
    assert!(matches!(
        store.get(common::IDENTITY),
        Err(StorageError::NotFound)
    ));
}

#[test]
fn server_steps_match_rfc5054_vector() {
    let store = Arc::new(MemoryBackend::new());
    let server = SrpServerBuilder::<Sha1>::new()
        .group(get_group("rfc-1024").unwrap().clone())
        .x_variant(XVariant::WithUsername)
        .private_value_fn(vector_b)
        .build(Arc::clone(&store));

    let b_pub = server
        .step1(common::IDENTITY, &common::salt(), &common::v())
        .unwrap();
    assert_eq!(b_pub, common::b_pub());

    let m2 = server
        .step2(
            common::IDENTITY,
            &common::salt(),
            &common::v(),
            &common::a_pub(),
            &common::m1(),
        )
        .unwrap();
    assert_eq!(m2, common::m2());
    assert!(matches!(
        store.get(common::IDENTITY),
        Err(StorageError::NotFound)
    ));
}

#[test]
fn steps_out_of_order_are_state_violations() {
    let salt = generate_random_salt(16);
    let v = SrpVerifierBuilder::<Sha256>::new()
        .build()
        .generate_verifier(&salt, common::IDENTITY, common::PASSWORD);

    let client = SrpClientBuilder::<Sha256>::new().build(MemoryBackend::new());
    let server = SrpServerBuilder::<Sha256>::new().build(MemoryBackend::new());

    // Step 2 with no session at all surfaces the backend miss.
    assert!(matches!(
        client.step2(common::IDENTITY, &salt, &BigUint::from(7u32)),
        Err(SrpError::Storage {
            op: "get",
            source: StorageError::NotFound,
        })
    ));

    client.step1(common::IDENTITY, common::PASSWORD).unwrap();

    // Step 3 straight after step 1: the record is in the wrong state.
    assert!(matches!(
        client.step3(common::IDENTITY, &BigUint::from(7u32)),
        Err(SrpError::StateViolation {
            expected: SessionState::Step2,
        })
    ));

    let b_pub = server.step1(common::IDENTITY, &salt, &v).unwrap();
    let (a_pub, m1) = client.step2(common::IDENTITY, &salt, &b_pub).unwrap();

    // Repeating client step 2 finds a step-2 record.
    assert!(matches!(
        client.step2(common::IDENTITY, &salt, &b_pub),
        Err(SrpError::StateViolation {
            expected: SessionState::Step1,
        })
    ));

    // A completed server session is gone; a second step 2 cannot find it.
    let m2 = server
        .step2(common::IDENTITY, &salt, &v, &a_pub, &m1)
        .unwrap();
    assert!(matches!(
        server.step2(common::IDENTITY, &salt, &v, &a_pub, &m1),
        Err(SrpError::Storage {
            op: "get",
            source: StorageError::NotFound,
        })
    ));

    client.step3(common::IDENTITY, &m2).unwrap();
}

#[test]
fn tampered_client_evidence_leaves_session_retryable() {
    let salt = generate_random_salt(16);
    let v = SrpVerifierBuilder::<Sha256>::new()
        .build()
        .generate_verifier(&salt, common::IDENTITY, common::PASSWORD);

    let server_store = Arc::new(MemoryBackend::new());
    let client = SrpClientBuilder::<Sha256>::new().build(MemoryBackend::new());
    let server = SrpServerBuilder::<Sha256>::new().build(Arc::clone(&server_store));

    client.step1(common::IDENTITY, common::PASSWORD).unwrap();
    let b_pub = server.step1(common::IDENTITY, &salt, &v).unwrap();
    let (a_pub, m1) = client.step2(common::IDENTITY, &salt, &b_pub).unwrap();

    let tampered = &m1 + 1u32;
    assert!(matches!(
        server.step2(common::IDENTITY, &salt, &v, &a_pub, &tampered),
        Err(SrpError::BadClientCredentials)
    ));
    assert!(server_store.get(common::IDENTITY).is_ok());

    // The untouched session still accepts the genuine evidence.
    server
        .step2(common::IDENTITY, &salt, &v, &a_pub, &m1)
        .unwrap();
}

#[test]
fn tampered_server_evidence_leaves_session_retryable() {
    let salt = generate_random_salt(16);
    let v = SrpVerifierBuilder::<Sha256>::new()
        .build()
        .generate_verifier(&salt, common::IDENTITY, common::PASSWORD);

    let client_store = Arc::new(MemoryBackend::new());
    let client = SrpClientBuilder::<Sha256>::new().build(Arc::clone(&client_store));
    let server = SrpServerBuilder::<Sha256>::new().build(MemoryBackend::new());

    client.step1(common::IDENTITY, common::PASSWORD).unwrap();
    let b_pub = server.step1(common::IDENTITY, &salt, &v).unwrap();
    let (a_pub, m1) = client.step2(common::IDENTITY, &salt, &b_pub).unwrap();
    let m2 = server
        .step2(common::IDENTITY, &salt, &v, &a_pub, &m1)
        .unwrap();

    let tampered = &m2 + 1u32;
    assert!(matches!(
        client.step3(common::IDENTITY, &tampered),
        Err(SrpError::BadServerCredentials)
    ));
    assert!(client_store.get(common::IDENTITY).is_ok());

    client.step3(common::IDENTITY, &m2).unwrap();
    assert!(matches!(
        client_store.get(common::IDENTITY),
        Err(StorageError::NotFound)
    ));
}

#[test]
fn elapsed_timeout_rejects_but_keeps_the_session() {
    let salt = generate_random_salt(16);
    let v = SrpVerifierBuilder::<Sha256>::new()
        .build()
        .generate_verifier(&salt, common::IDENTITY, common::PASSWORD);

    let server_store = Arc::new(MemoryBackend::new());
    let client = SrpClientBuilder::<Sha256>::new().build(MemoryBackend::new());
    let server = SrpServerBuilder::<Sha256>::new()
        .timeout(Duration::from_millis(5))
        .build(Arc::clone(&server_store));

    client.step1(common::IDENTITY, common::PASSWORD).unwrap();
    let b_pub = server.step1(common::IDENTITY, &salt, &v).unwrap();
    let (a_pub, m1) = client.step2(common::IDENTITY, &salt, &b_pub).unwrap();

    sleep(Duration::from_millis(20));
    assert!(matches!(
        server.step2(common::IDENTITY, &salt, &v, &a_pub, &m1),
        Err(SrpError::Timeout)
    ));
    // Rejected, not reaped.
    assert!(server_store.get(common::IDENTITY).is_ok());
}

#[test]
fn zero_timeout_never_expires() {
    let salt = generate_random_salt(16);
    let v = SrpVerifierBuilder::<Sha256>::new()
        .build()
        .generate_verifier(&salt, common::IDENTITY, common::PASSWORD);

    let client = SrpClientBuilder::<Sha256>::new()
        .timeout(Duration::ZERO)
        .build(MemoryBackend::new());
    let server = SrpServerBuilder::<Sha256>::new()
        .timeout(Duration::ZERO)
        .build(MemoryBackend::new());

    client.step1(common::IDENTITY, common::PASSWORD).unwrap();
    let b_pub = server.step1(common::IDENTITY, &salt, &v).unwrap();
    sleep(Duration::from_millis(20));
    let (a_pub, m1) = client.step2(common::IDENTITY, &salt, &b_pub).unwrap();
    let m2 = server
        .step2(common::IDENTITY, &salt, &v, &a_pub, &m1)
        .unwrap();
    client.step3(common::IDENTITY, &m2).unwrap();
}

#[test]
fn empty_inputs_fail_before_any_backend_access() {
    let store = Arc::new(CountingBackend::default());
    let client = SrpClientBuilder::<Sha256>::new().build(Arc::clone(&store));
    let server = SrpServerBuilder::<Sha256>::new().build(Arc::clone(&store));

    let v = BigUint::from(7u32);
    let m = BigUint::from(9u32);

    assert!(matches!(
        client.step1("", "password123"),
        Err(SrpError::IllegalParameter { name: "identity" })
    ));
    assert!(matches!(
        client.step1("alice", ""),
        Err(SrpError::IllegalParameter { name: "password" })
    ));
    assert!(matches!(
        client.step2("", b"salt", &v),
        Err(SrpError::IllegalParameter { name: "identity" })
    ));
    assert!(matches!(
        client.step3("", &m),
        Err(SrpError::IllegalParameter { name: "identity" })
    ));
    assert!(matches!(
        server.step1("", b"salt", &v),
        Err(SrpError::IllegalParameter { name: "identity" })
    ));
    assert!(matches!(
        server.step2("", b"salt", &v, &v, &m),
        Err(SrpError::IllegalParameter { name: "identity" })
    ));

    assert_eq!(store.calls(), 0);
}
