//! Tests for owner isolation in shared events

use modhook_core::{EventError, Listener, OwnerId, OwnerResolver, SharedModEvent};
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    static CALLER: RefCell<Option<OwnerId>> = const { RefCell::new(None) };
}

/// Resolves to whatever owner the current test thread pretends to be.
fn thread_caller() -> Option<OwnerId> {
    CALLER.with(|c| c.borrow().clone())
}

fn as_owner<T>(name: &str, f: impl FnOnce() -> T) -> T {
    let previous = CALLER.with(|c| c.replace(Some(OwnerId::new(name))));
    let result = f();
    CALLER.with(|c| *c.borrow_mut() = previous);
    result
}

fn shared_event() -> SharedModEvent<Vec<&'static str>> {
    SharedModEvent::new(thread_caller)
}

#[test]
fn test_invoke_own_sees_only_own_listeners() {
    let event = shared_event();
    as_owner("alpha", || event.on_ref(|log| log.push("alpha")));
    as_owner("beta", || event.on_ref(|log| log.push("beta")));

    assert_eq!(as_owner("alpha", || event.run_own(Vec::new())), vec!["alpha"]);
    assert_eq!(as_owner("beta", || event.run_own(Vec::new())), vec!["beta"]);
    assert_eq!(event.run_all(Vec::new()), vec!["alpha", "beta"]);
}

#[test]
fn test_invoke_all_follows_first_seen_order() {
    let event = shared_event();
    as_owner("late", || event.owner_event());
    as_owner("early", || event.on_ref(|log| log.push("early")));
    as_owner("late", || event.on_ref(|log| log.push("late")));

    assert_eq!(event.run_all(Vec::new()), vec!["late", "early"]);
    assert_eq!(event.owners(), vec![OwnerId::new("late"), OwnerId::new("early")]);
}

#[test]
fn test_cannot_remove_other_owners_listener() {
    let event = shared_event();
    let listener = Listener::by_ref(|log: &mut Vec<&'static str>| log.push("alpha"));
    assert!(as_owner("alpha", || event.add_listener(listener.clone())));

    assert!(!as_owner("beta", || event.remove_listener(&listener)));
    assert_eq!(
        as_owner("beta", || event.try_remove_listener(&listener)),
        Err(EventError::ListenerNotFound)
    );
    assert_eq!(event.run_all(Vec::new()), vec!["alpha"]);

    assert!(as_owner("alpha", || event.remove_listener(&listener)));
    assert!(event.run_all(Vec::new()).is_empty());
}

#[test]
fn test_same_handle_under_two_owners() {
    let event = shared_event();
    let listener = Listener::by_ref(|log: &mut Vec<&'static str>| log.push("tick"));
    as_owner("alpha", || event.add_listener(listener.clone()));
    as_owner("beta", || event.add_listener(listener.clone()));

    assert!(as_owner("alpha", || event.remove_listener(&listener)));
    assert_eq!(event.run_all(Vec::new()), vec!["tick"]);
    assert_eq!(as_owner("beta", || event.run_own(Vec::new())), vec!["tick"]);
}

#[test]
fn test_unresolved_caller() {
    let event = shared_event();
    let listener = Listener::by_ref(|log: &mut Vec<&'static str>| log.push("x"));
    assert!(!event.add_listener(listener.clone()));
    assert!(!event.remove_listener(&listener));
    assert_eq!(event.try_remove_listener_at(0), Err(EventError::OwnerUnresolved));
    assert!(event.on(|_| {}).is_none());
    assert!(event.run_own(Vec::new()).is_empty());
    assert_eq!(event.owner_count(), 0);
}

#[test]
fn test_listener_registering_new_owner_mid_dispatch() {
    let event = Arc::new(shared_event());
    {
        let handle = Arc::clone(&event);
        as_owner("alpha", || {
            event.on_ref(move |log| {
                log.push("alpha");
                as_owner("gamma", || handle.on_ref(|log| log.push("gamma")));
            })
        });
    }

    assert_eq!(event.run_all(Vec::new()), vec!["alpha"]);
    assert_eq!(event.owner_count(), 2);
    // Round one's gamma listener runs now; the one alpha adds this round waits.
    assert_eq!(event.run_all(Vec::new()), vec!["alpha", "gamma"]);
}

#[test]
fn test_racing_first_registration_shares_one_entry() {
    let owner = OwnerId::new("racer");
    let resolver_owner = owner.clone();
    let resolver: Arc<dyn OwnerResolver> = Arc::new(move || Some(resolver_owner.clone()));
    let event: Arc<SharedModEvent<u32>> = Arc::new(SharedModEvent::with_resolver(resolver));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let event = Arc::clone(&event);
            std::thread::spawn(move || {
                event.on_ref(|v| *v += 1);
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(event.owner_count(), 1);
    assert_eq!(event.event_for(&owner).map(|e| e.listener_count()), Some(8));
    assert_eq!(event.run_all(0), 8);
}
