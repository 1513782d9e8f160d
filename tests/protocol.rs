//! End-to-end exercises of the split-key protocol over its TCP transport.

use authority::Authority;
use combiner::{Combiner, Verdict};
use link::{KeyTableService, LinkError, ServiceError, TcpLink};
use num_bigint::BigUint;
use std::net::{SocketAddr, TcpListener};
use std::thread;

fn spawn_authority(
    rsa_bits: usize,
    hash_bits: usize,
    max_queries: usize,
    debug_key: bool,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let service = Authority::new(rsa_bits, hash_bits, max_queries);
        if debug_key {
            service.install_debug_key();
        }
        let _ = link::serve(listener, &service);
    });

    addr
}

#[test]
fn sign_and_verify_over_tcp() {
    let addr = spawn_authority(64, 64, 4, false);
    let service = TcpLink::connect(addr).unwrap();

    assert!(!service.is_initialized().unwrap());
    service.generate_new_key().unwrap();
    assert!(service.is_initialized().unwrap());

    let combiner = Combiner::connect(service).unwrap();
    let signature = combiner.sign("over the wire").unwrap();
    assert_eq!(
        combiner.verify("over the wire", &signature).unwrap(),
        Verdict::Valid
    );
    assert_eq!(
        combiner.verify("over the wIre", &signature).unwrap(),
        Verdict::Invalid
    );
}

#[test]
fn exhaustion_crosses_the_wire() {
    let addr = spawn_authority(9, 7, 2, true);
    let service = TcpLink::connect(addr).unwrap();

    let hash = BigUint::from(5u32);
    assert_eq!(
        service.private_key_table_rows(&hash).unwrap(),
        vec![BigUint::from(59u32), BigUint::from(145u32)]
    );
    service.private_key_table_rows(&hash).unwrap();

    match service.private_key_table_rows(&hash) {
        Err(LinkError::Service(ServiceError::Exhausted)) => {}
        other => panic!("expected Exhausted, got {other:?}"),
    }

    // the failing call purged the epoch on the far side
    match service.public_key_table() {
        Err(LinkError::Service(ServiceError::Uninitialized)) => {}
        other => panic!("expected Uninitialized, got {other:?}"),
    }
}

#[test]
fn parameters_and_deletion_cross_the_wire() {
    let addr = spawn_authority(9, 7, 5, true);
    let service = TcpLink::connect(addr).unwrap();

    let params = service.parameters().unwrap();
    assert_eq!(
        (params.rsa_bits, params.hash_bits, params.max_queries),
        (9, 7, 5)
    );
    assert_eq!(service.modulus_n().unwrap(), BigUint::from(323u32));

    service.delete_keys().unwrap();
    assert!(!service.is_initialized().unwrap());
    match service.modulus_n() {
        Err(LinkError::Service(ServiceError::Uninitialized)) => {}
        other => panic!("expected Uninitialized, got {other:?}"),
    }
}

#[test]
fn invalid_queries_cross_the_wire() {
    let addr = spawn_authority(9, 7, 5, true);
    let service = TcpLink::connect(addr).unwrap();

    for hash in [BigUint::from(0u32), BigUint::from(0b1111111u32)] {
        match service.private_key_table_rows(&hash) {
            Err(LinkError::Service(ServiceError::InvalidQuery(_))) => {}
            other => panic!("expected InvalidQuery for {hash}, got {other:?}"),
        }
    }
}
