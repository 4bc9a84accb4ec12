//! zbus proxy definitions for systemd and the bus daemon
//!
//! Only the methods this crate actually calls are declared; systemd's full
//! Manager interface is much larger. See
//! <https://www.freedesktop.org/wiki/Software/systemd/dbus/> for the
//! authoritative signatures.

use std::collections::HashMap;

use serde::Deserialize;
use zbus::proxy;
use zbus::zvariant::{OwnedObjectPath, Type};

/// One entry of the `ListJobs` reply, wire signature `(usssoo)`.
#[derive(Debug, Clone, Deserialize, Type)]
pub struct JobListing {
    pub id: u32,
    pub unit: String,
    pub job_type: String,
    pub state: String,
    pub job_path: OwnedObjectPath,
    pub unit_path: OwnedObjectPath,
}

/// One entry of the `ListUnitsByPatterns` reply, wire signature `(ssssssouso)`.
#[derive(Debug, Clone, Deserialize, Type)]
pub struct UnitListing {
    pub name: String,
    pub description: String,
    pub load_state: String,
    pub active_state: String,
    pub sub_state: String,
    /// Unit this one is "following" in state, or empty.
    pub following: String,
    pub unit_path: OwnedObjectPath,
    /// Queued job id for this unit, 0 if none.
    pub job_id: u32,
    pub job_type: String,
    pub job_path: OwnedObjectPath,
}

#[proxy(
    interface = "org.freedesktop.systemd1.Manager",
    default_service = "org.freedesktop.systemd1",
    default_path = "/org/freedesktop/systemd1"
)]
pub trait SystemdManager {
    /// Resolve a unit name to its object path. Fails if the unit is not
    /// currently loaded.
    fn get_unit(&self, name: &str) -> zbus::Result<OwnedObjectPath>;

    /// Reload the service manager configuration (daemon-reload).
    fn reload(&self) -> zbus::Result<()>;

    fn list_jobs(&self) -> zbus::Result<Vec<JobListing>>;

    /// List units matching any of `states` and any of the glob `patterns`.
    /// Empty slices match everything.
    fn list_units_by_patterns(
        &self,
        states: &[&str],
        patterns: &[&str],
    ) -> zbus::Result<Vec<UnitListing>>;

    /// Stop a unit. Returns the queued job's object path.
    fn stop_unit(&self, name: &str, mode: &str) -> zbus::Result<OwnedObjectPath>;

    /// Add `NAME=value` assignments to the manager's activation environment.
    fn set_environment(&self, assignments: &[String]) -> zbus::Result<()>;

    /// Remove variables from the manager's activation environment.
    fn unset_environment(&self, names: &[String]) -> zbus::Result<()>;
}

#[proxy(
    interface = "org.freedesktop.DBus",
    default_service = "org.freedesktop.DBus",
    default_path = "/org/freedesktop/DBus"
)]
pub trait DbusDaemon {
    /// Merge variables into the bus daemon's activation environment, used for
    /// services the bus itself spawns.
    fn update_activation_environment(&self, environment: HashMap<&str, &str>)
        -> zbus::Result<()>;
}
