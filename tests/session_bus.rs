//! Session-bus integration tests for the object cache
//!
//! These talk to a real `systemd --user` instance over the session bus, so
//! they only run where one is available.
//!
//! Run with: cargo test --test session_bus -- --ignored

use std::collections::HashMap;
use std::rc::Rc;

use sysbus::BusObjectCache;

/// Check if a session bus is reachable
fn session_bus_available() -> bool {
    zbus::blocking::Connection::session().is_ok()
}

#[test]
#[ignore] // Requires a session bus and systemd --user
fn manager_proxy_is_created_once() {
    if !session_bus_available() {
        eprintln!("session bus not available, skipping test");
        return;
    }
    let bus = BusObjectCache::session().unwrap();
    let first = bus.manager().unwrap();
    let second = bus.manager().unwrap();
    assert!(Rc::ptr_eq(&first, &second));

    let props_first = bus.manager_properties().unwrap();
    let props_second = bus.manager_properties().unwrap();
    assert!(Rc::ptr_eq(&props_first, &props_second));

    let daemon_first = bus.bus_daemon().unwrap();
    let daemon_second = bus.bus_daemon().unwrap();
    assert!(Rc::ptr_eq(&daemon_first, &daemon_second));
}

#[test]
#[ignore] // Requires a session bus and systemd --user
fn unit_proxies_are_cached_per_unit() {
    if !session_bus_available() {
        eprintln!("session bus not available, skipping test");
        return;
    }
    let bus = BusObjectCache::session().unwrap();
    let default_first = bus.unit_properties("default.target").unwrap();
    let default_second = bus.unit_properties("default.target").unwrap();
    let basic = bus.unit_properties("basic.target").unwrap();

    assert!(Rc::ptr_eq(&default_first, &default_second));
    assert!(!Rc::ptr_eq(&default_first, &basic));
}

#[test]
#[ignore] // Requires a session bus and systemd --user
fn property_read_builds_the_proxy_chain_transitively() {
    if !session_bus_available() {
        eprintln!("session bus not available, skipping test");
        return;
    }
    // Fresh cache, no accessor called beforehand: get_unit_property must
    // create the manager proxy and the per-unit proxy on its own.
    let bus = BusObjectCache::session().unwrap();
    let value = bus.get_unit_property("default.target", "Id").unwrap();
    let id = String::try_from(value).unwrap();
    assert_eq!(id, "default.target");
}

#[test]
#[ignore] // Requires a session bus and systemd --user
fn fault_for_unknown_unit_propagates() {
    if !session_bus_available() {
        eprintln!("session bus not available, skipping test");
        return;
    }
    let bus = BusObjectCache::session().unwrap();
    let unit = "sysbus-no-such-unit-31337.service";
    assert!(bus.get_unit_property(unit, "ActiveState").is_err());
    assert!(bus.stop_unit(unit, None).is_err());
}

#[test]
#[ignore] // Requires a session bus and systemd --user
fn manager_vars_roundtrip() {
    if !session_bus_available() {
        eprintln!("session bus not available, skipping test");
        return;
    }
    let bus = BusObjectCache::session().unwrap();

    let mut vars = HashMap::new();
    // Value contains '=' and a space to exercise first-equals splitting
    vars.insert("SYSBUS_TEST_VAR".to_string(), "one=two three".to_string());
    bus.set_manager_vars(&vars).unwrap();

    let env = bus.get_manager_vars().unwrap();
    assert_eq!(
        env.get("SYSBUS_TEST_VAR").map(String::as_str),
        Some("one=two three")
    );

    bus.unset_manager_vars(&["SYSBUS_TEST_VAR".to_string()]).unwrap();
    let env = bus.get_manager_vars().unwrap();
    assert!(!env.contains_key("SYSBUS_TEST_VAR"));
}

#[test]
#[ignore] // Requires a session bus and systemd --user
fn manager_vars_apply_in_input_order() {
    if !session_bus_available() {
        eprintln!("session bus not available, skipping test");
        return;
    }
    let bus = BusObjectCache::session().unwrap();

    // Ordered input: systemd applies the assignment list in order, so the
    // later entry for the same name must win.
    let vars = vec![
        ("SYSBUS_ORDER_VAR", "first"),
        ("SYSBUS_ORDER_VAR", "second"),
    ];
    bus.set_manager_vars(vars).unwrap();

    let env = bus.get_manager_vars().unwrap();
    assert_eq!(
        env.get("SYSBUS_ORDER_VAR").map(String::as_str),
        Some("second")
    );

    bus.unset_manager_vars(&["SYSBUS_ORDER_VAR".to_string()]).unwrap();
}
