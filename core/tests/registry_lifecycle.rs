//! End-to-end registry lifecycle through the public API

use std::sync::Arc;
use std::thread;

use data_registry_core::crypto::keygen::recover_group_key;
use data_registry_core::utils::ManualClock;
use data_registry_core::{
    ChannelWorkerDirectory, DataStatus, EncryptionSchema, PriceInfo, Registry, RegistryConfig, RegistryError,
    RegistryEvent, ShamirKeyGenerator, WorkerId,
};
use ethers::types::{Address, Bytes, U256};

fn setup(worker_count: u8) -> (Registry, tokio::sync::mpsc::UnboundedReceiver<data_registry_core::ShareDelivery>) {
    let workers = (1..=worker_count).map(|i| WorkerId::new([i; 32])).collect();
    let (directory, deliveries) = ChannelWorkerDirectory::new(workers);
    let registry = Registry::new(
        RegistryConfig::testing(),
        Arc::new(ShamirKeyGenerator::new()),
        Arc::new(directory),
        Arc::new(ManualClock::new(1_700_000_000)),
    )
    .unwrap();
    registry.initialize(Address::repeat_byte(0xad)).unwrap();
    (registry, deliveries)
}

#[test]
fn sensor_log_lifecycle() {
    let (registry, mut deliveries) = setup(4);
    let owner = Address::repeat_byte(0x01);

    let prepared = registry.prepare_registry(owner, EncryptionSchema::new(2, 3)).unwrap();
    assert_eq!(prepared.public_keys.len(), 3);

    let reserved = registry.get_data_by_id(prepared.data_id).unwrap().unwrap();
    assert_eq!(reserved.status, DataStatus::Reserved);
    assert_eq!(reserved.worker_ids.len(), 3);

    // Each assigned worker has a share whose public key was published
    let mut shares = Vec::new();
    for (worker, public_key) in reserved.worker_ids.iter().zip(&prepared.public_keys) {
        let delivery = deliveries.try_recv().unwrap();
        assert_eq!(delivery.worker_id, *worker);
        assert_eq!(public_key.len(), 32);
        shares.push(delivery.share);
    }
    assert_eq!(recover_group_key(&shares[..2]).unwrap(), recover_group_key(&shares[1..]).unwrap());

    registry
        .register(
            owner,
            prepared.data_id,
            "sensor-log".to_string(),
            PriceInfo::new("USDC", 1000u64),
            Bytes::from(vec![0xaa, 0xbb]),
        )
        .unwrap();

    let registered = registry.get_data_by_id(prepared.data_id).unwrap().unwrap();
    assert_eq!(registered.status, DataStatus::Registered);
    assert_eq!(registered.data_tag, "sensor-log");
    assert_eq!(registered.data_content.to_vec(), vec![0xaa, 0xbb]);
    assert_eq!(registered.price_info.token_symbol, "USDC");
    assert_eq!(registered.price_info.price, U256::from(1000u64));

    registry.delete_data_by_id(owner, prepared.data_id).unwrap();
    let deleted = registry.get_data_by_id(prepared.data_id).unwrap().unwrap();
    assert_eq!(deleted.status, DataStatus::Deleted);

    let owned = registry.get_data_by_owner(owner).unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].data_id, prepared.data_id);

    let events: Vec<RegistryEvent> = registry.events().unwrap().into_iter().map(|e| e.event).collect();
    assert_eq!(
        events,
        vec![
            RegistryEvent::Initialized { version: 1 },
            RegistryEvent::PrepareRegistry { data_id: prepared.data_id, public_keys: prepared.public_keys.clone() },
            RegistryEvent::Register { data_id: prepared.data_id },
        ]
    );
}

#[test]
fn failed_calls_leave_no_trace() {
    let (registry, _deliveries) = setup(3);
    let owner = Address::repeat_byte(0x01);
    let prepared = registry.prepare_registry(owner, EncryptionSchema::new(1, 3)).unwrap();
    registry
        .register(owner, prepared.data_id, "x".to_string(), PriceInfo::default(), Bytes::from(vec![1]))
        .unwrap();

    let root = registry.state_root().unwrap();
    let event_count = registry.events().unwrap().len();

    let failures = [
        registry.prepare_registry(owner, EncryptionSchema::new(0, 1)).unwrap_err(),
        registry.prepare_registry(owner, EncryptionSchema::new(1, 4)).unwrap_err(),
        registry
            .register(owner, prepared.data_id, "y".to_string(), PriceInfo::default(), Bytes::default())
            .unwrap_err(),
        registry.delete_data_by_id(Address::repeat_byte(0x02), prepared.data_id).unwrap_err(),
    ];

    assert!(matches!(failures[0], RegistryError::InvalidSchema { .. }));
    assert!(matches!(failures[1], RegistryError::WorkerUnavailable { .. }));
    assert!(matches!(failures[2], RegistryError::AlreadyRegistered(_)));
    assert!(matches!(failures[3], RegistryError::NotOwner(_)));

    assert_eq!(registry.state_root().unwrap(), root);
    assert_eq!(registry.events().unwrap().len(), event_count);
}

#[test]
fn concurrent_owners_keep_separate_indices() {
    let (registry, _deliveries) = setup(5);
    let registry = Arc::new(registry);

    let handles: Vec<_> = (1..=4u8)
        .map(|owner_byte| {
            let registry = registry.clone();
            thread::spawn(move || {
                let owner = Address::repeat_byte(owner_byte);
                let mut finalized = Vec::new();
                for i in 0..10u64 {
                    let id = registry.prepare_registry(owner, EncryptionSchema::new(2, 3)).unwrap().data_id;
                    registry
                        .register(owner, id, format!("{}-{}", owner_byte, i), PriceInfo::new("USDC", i), Bytes::default())
                        .unwrap();
                    finalized.push(id);
                }
                (owner, finalized)
            })
        })
        .collect();

    for handle in handles {
        let (owner, finalized) = handle.join().unwrap();
        let listed: Vec<_> = registry.get_data_by_owner(owner).unwrap().into_iter().map(|r| r.data_id).collect();
        assert_eq!(listed, finalized);
    }

    let all = registry.get_all_data().unwrap();
    assert_eq!(all.len(), 40);

    assert!(all.iter().all(|r| r.registered_timestamp == 1_700_000_000));
}
