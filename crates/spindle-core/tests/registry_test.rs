//! Hook registry and operation table tests.
//!
//! The registry is the hub's ground truth for which endpoints exist; these
//! tests pin down the register/unregister contract and the one-way freeze of
//! the operation table at the first hook registration.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use spindle_core::{EndpointHook, Hub, HubConfig, HubError, Ops};

fn hub() -> Hub {
    // Port 0 keeps concurrent test processes from colliding.
    Hub::new(HubConfig::new(0)).unwrap()
}

#[test]
fn new_hub_has_no_endpoints() {
    let hub = hub();
    for id in [0, 3, 127, 255] {
        assert!(!hub.endpoint_exists(id));
    }
}

#[test]
fn register_then_exists() {
    let hub = hub();
    let hook = Arc::new(EndpointHook::new(3));

    hub.register_hook(&hook).unwrap();
    assert!(hub.endpoint_exists(3));
    assert!(!hub.endpoint_exists(4));
}

#[test]
fn duplicate_registration_fails_and_changes_nothing() {
    let hub = hub();
    let first = Arc::new(EndpointHook::new(3));
    let second = Arc::new(EndpointHook::new(3));

    hub.register_hook(&first).unwrap();
    let result = hub.register_hook(&second);
    assert!(matches!(result, Err(HubError::DuplicateEndpoint(3))));

    // The first registration is untouched: unregistering it empties the slot.
    hub.unregister_hook(&first);
    assert!(!hub.endpoint_exists(3));
}

#[test]
fn unregister_then_reregister_succeeds() {
    let hub = hub();
    let hook = Arc::new(EndpointHook::new(3));

    hub.register_hook(&hook).unwrap();
    hub.unregister_hook(&hook);
    assert!(!hub.endpoint_exists(3));

    hub.register_hook(&hook).unwrap();
    assert!(hub.endpoint_exists(3));
}

#[test]
fn unregister_unknown_is_noop() {
    let hub = hub();
    let hook = Arc::new(EndpointHook::new(3));

    hub.unregister_hook(&hook);
    assert!(!hub.endpoint_exists(3));
}

#[test]
fn unregister_by_different_hook_is_noop() {
    let hub = hub();
    let registered = Arc::new(EndpointHook::new(3));
    let imposter = Arc::new(EndpointHook::new(3));

    hub.register_hook(&registered).unwrap();
    hub.unregister_hook(&imposter);

    assert!(hub.endpoint_exists(3));
}

#[test]
fn ops_registration_open_before_first_hook() {
    let hub = hub();

    for request_type in [0, 1, 7, 255] {
        hub.register_ops(request_type, Ops::new(|_| {})).unwrap();
    }
    // Overwriting a prior entry for the same type is allowed pre-freeze.
    hub.register_ops(7, Ops::new(|_| {})).unwrap();
}

#[test]
fn ops_registration_fails_after_first_hook() {
    let hub = hub();
    hub.register_ops(7, Ops::new(|_| {})).unwrap();

    let hook = Arc::new(EndpointHook::new(1));
    hub.register_hook(&hook).unwrap();

    for request_type in [0, 7, 255] {
        let result = hub.register_ops(request_type, Ops::new(|_| {}));
        assert!(matches!(result, Err(HubError::OpsTableFrozen)));
    }
}

#[test]
fn ops_table_stays_frozen_after_all_hooks_leave() {
    let hub = hub();
    let hook = Arc::new(EndpointHook::new(1));

    hub.register_hook(&hook).unwrap();
    hub.unregister_hook(&hook);

    let result = hub.register_ops(0, Ops::new(|_| {}));
    assert!(matches!(result, Err(HubError::OpsTableFrozen)));
}

#[test]
fn host_and_clock_queries_are_cached() {
    let hub = hub();

    assert!(!hub.hostname().is_empty());
    assert!(hub.clock().freq_ghz() > 0.0);
    assert_ne!(hub.local_addr().port(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// The registry reflects exactly the net registered set for arbitrary
    /// register/unregister sequences over a small id space.
    #[test]
    fn registry_matches_reference_model(
        steps in proptest::collection::vec((any::<bool>(), 0u8..8), 1..40),
    ) {
        let hub = Hub::new(HubConfig::new(0)).unwrap();
        let mut model: HashSet<u8> = HashSet::new();
        let mut live: Vec<Option<Arc<EndpointHook>>> = (0..8).map(|_| None).collect();

        for (register, id) in steps {
            if register {
                let hook = Arc::new(EndpointHook::new(id));
                let result = hub.register_hook(&hook);
                if model.insert(id) {
                    prop_assert!(result.is_ok());
                    live[id as usize] = Some(hook);
                } else {
                    prop_assert!(matches!(result, Err(HubError::DuplicateEndpoint(_))));
                }
            } else if let Some(hook) = live[id as usize].take() {
                hub.unregister_hook(&hook);
                model.remove(&id);
            }

            for id in 0u8..8 {
                prop_assert_eq!(hub.endpoint_exists(id), model.contains(&id));
            }
        }
    }
}
