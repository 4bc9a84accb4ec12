//! Memoizing D-Bus client for systemd
//!
//! [`BusObjectCache`] owns one blocking bus connection plus lazily created
//! proxies for the systemd manager, its properties, per-unit properties and
//! the bus daemon. Each proxy is created on first use and reused for the
//! lifetime of the cache; nothing is ever evicted or reconnected.
//!
//! The cache is deliberately single-threaded (`RefCell`/`Rc` make it neither
//! `Send` nor `Sync`). Callers that want concurrency create one cache per
//! thread.

pub mod proxies;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use log::debug;
use zbus::blocking::Connection;
use zbus::blocking::fdo::PropertiesProxy as PropertiesProxyBlocking;
use zbus::names::InterfaceName;
use zbus::zvariant::{OwnedObjectPath, OwnedValue};

use crate::env;
use crate::error::{Error, Result};
use proxies::{DbusDaemonProxyBlocking, JobListing, SystemdManagerProxyBlocking, UnitListing};

const SYSTEMD_SERVICE: &str = "org.freedesktop.systemd1";
const SYSTEMD_PATH: &str = "/org/freedesktop/systemd1";

const MANAGER_INTERFACE: InterfaceName<'static> =
    InterfaceName::from_static_str_unchecked("org.freedesktop.systemd1.Manager");
const UNIT_INTERFACE: InterfaceName<'static> =
    InterfaceName::from_static_str_unchecked("org.freedesktop.systemd1.Unit");

/// Which bus to talk to: the system-wide one or the user session's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusLevel {
    System,
    Session,
}

impl BusLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            BusLevel::System => "system",
            BusLevel::Session => "session",
        }
    }

    fn connect(self) -> zbus::Result<Connection> {
        match self {
            BusLevel::System => Connection::system(),
            BusLevel::Session => Connection::session(),
        }
    }
}

impl FromStr for BusLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "system" => Ok(BusLevel::System),
            "session" => Ok(BusLevel::Session),
            other => Err(Error::InvalidBusLevel(other.to_string())),
        }
    }
}

impl fmt::Display for BusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lazily populated set of proxies on one bus connection.
///
/// Proxy accessors are get-or-create: the first call builds the proxy, later
/// calls hand back the same `Rc`. Dependencies are resolved transitively, so
/// e.g. [`BusObjectCache::get_unit_property`] on a fresh cache first creates
/// the manager proxy, then the per-unit properties proxy.
///
/// Remote faults are never caught here; every operation passes them through
/// to the caller unchanged.
pub struct BusObjectCache {
    level: BusLevel,
    conn: Connection,
    manager: RefCell<Option<Rc<SystemdManagerProxyBlocking<'static>>>>,
    manager_props: RefCell<Option<Rc<PropertiesProxyBlocking<'static>>>>,
    unit_props: RefCell<HashMap<String, Rc<PropertiesProxyBlocking<'static>>>>,
    bus_daemon: RefCell<Option<Rc<DbusDaemonProxyBlocking<'static>>>>,
}

impl BusObjectCache {
    /// Connect to the given bus. The connection is established immediately;
    /// all proxies are created on first use.
    pub fn new(level: BusLevel) -> Result<Self> {
        debug!("connecting to the {} bus", level);
        Ok(Self {
            level,
            conn: level.connect()?,
            manager: RefCell::new(None),
            manager_props: RefCell::new(None),
            unit_props: RefCell::new(HashMap::new()),
            bus_daemon: RefCell::new(None),
        })
    }

    pub fn system() -> Result<Self> {
        Self::new(BusLevel::System)
    }

    pub fn session() -> Result<Self> {
        Self::new(BusLevel::Session)
    }

    pub fn level(&self) -> BusLevel {
        self.level
    }

    // ==================== Proxy accessors ====================

    /// org.freedesktop.systemd1.Manager proxy.
    pub fn manager(&self) -> Result<Rc<SystemdManagerProxyBlocking<'static>>> {
        if let Some(proxy) = self.manager.borrow().as_ref() {
            return Ok(Rc::clone(proxy));
        }
        debug!("creating systemd manager proxy on the {} bus", self.level);
        let proxy = Rc::new(SystemdManagerProxyBlocking::new(&self.conn)?);
        *self.manager.borrow_mut() = Some(Rc::clone(&proxy));
        Ok(proxy)
    }

    /// Properties proxy for the manager object itself (used to read the
    /// `Environment` property).
    pub fn manager_properties(&self) -> Result<Rc<PropertiesProxyBlocking<'static>>> {
        if let Some(proxy) = self.manager_props.borrow().as_ref() {
            return Ok(Rc::clone(proxy));
        }
        debug!("creating manager properties proxy on the {} bus", self.level);
        let proxy = Rc::new(
            PropertiesProxyBlocking::builder(&self.conn)
                .destination(SYSTEMD_SERVICE)?
                .path(SYSTEMD_PATH)?
                .build()?,
        );
        *self.manager_props.borrow_mut() = Some(Rc::clone(&proxy));
        Ok(proxy)
    }

    /// Properties proxy for one unit's object, keyed by unit name.
    ///
    /// Resolving the unit's object path requires a manager `GetUnit` call, so
    /// the unit must be loaded.
    pub fn unit_properties(&self, unit_id: &str) -> Result<Rc<PropertiesProxyBlocking<'static>>> {
        if let Some(proxy) = self.unit_props.borrow().get(unit_id) {
            return Ok(Rc::clone(proxy));
        }
        let manager = self.manager()?;
        let unit_path = manager.get_unit(unit_id)?;
        debug!("creating properties proxy for {} at {}", unit_id, unit_path);
        let proxy = Rc::new(
            PropertiesProxyBlocking::builder(&self.conn)
                .destination(SYSTEMD_SERVICE)?
                .path(unit_path)?
                .build()?,
        );
        self.unit_props
            .borrow_mut()
            .insert(unit_id.to_string(), Rc::clone(&proxy));
        Ok(proxy)
    }

    /// org.freedesktop.DBus proxy for the bus daemon itself.
    pub fn bus_daemon(&self) -> Result<Rc<DbusDaemonProxyBlocking<'static>>> {
        if let Some(proxy) = self.bus_daemon.borrow().as_ref() {
            return Ok(Rc::clone(proxy));
        }
        debug!("creating bus daemon proxy on the {} bus", self.level);
        let proxy = Rc::new(DbusDaemonProxyBlocking::new(&self.conn)?);
        *self.bus_daemon.borrow_mut() = Some(Rc::clone(&proxy));
        Ok(proxy)
    }

    // ==================== Operations ====================

    /// Read one property of a unit (interface org.freedesktop.systemd1.Unit).
    pub fn get_unit_property(&self, unit_id: &str, property: &str) -> Result<OwnedValue> {
        let props = self.unit_properties(unit_id)?;
        debug!("Get {} {} on the {} bus", unit_id, property, self.level);
        Ok(props.get(UNIT_INTERFACE, property)?)
    }

    /// Reload the service manager configuration.
    pub fn reload_manager(&self) -> Result<()> {
        let manager = self.manager()?;
        debug!("Reload on the {} bus", self.level);
        Ok(manager.reload()?)
    }

    /// List currently queued jobs.
    pub fn list_jobs(&self) -> Result<Vec<JobListing>> {
        let manager = self.manager()?;
        debug!("ListJobs on the {} bus", self.level);
        Ok(manager.list_jobs()?)
    }

    /// List units matching any of `states` and any of the glob `patterns`;
    /// empty slices match everything.
    pub fn list_units_by_patterns(
        &self,
        states: &[&str],
        patterns: &[&str],
    ) -> Result<Vec<UnitListing>> {
        let manager = self.manager()?;
        debug!(
            "ListUnitsByPatterns states={:?} patterns={:?} on the {} bus",
            states, patterns, self.level
        );
        Ok(manager.list_units_by_patterns(states, patterns)?)
    }

    /// Stop a unit. `job_mode` defaults to "fail", which refuses to stop if
    /// that would conflict with a queued job. Returns the job's object path.
    pub fn stop_unit(&self, unit: &str, job_mode: Option<&str>) -> Result<OwnedObjectPath> {
        let manager = self.manager()?;
        let mode = job_mode.unwrap_or("fail");
        debug!("StopUnit {} mode={} on the {} bus", unit, mode, self.level);
        Ok(manager.stop_unit(unit, mode)?)
    }

    /// Merge variables into the bus daemon's activation environment.
    pub fn set_bus_activation_vars(&self, vars: &HashMap<String, String>) -> Result<()> {
        let daemon = self.bus_daemon()?;
        debug!(
            "UpdateActivationEnvironment {:?} on the {} bus",
            vars.keys().collect::<Vec<_>>(),
            self.level
        );
        let environment: HashMap<&str, &str> = vars
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        Ok(daemon.update_activation_environment(environment)?)
    }

    /// Add variables to the manager's activation environment.
    ///
    /// Assignments are sent in input iteration order, so with an ordered
    /// input a later entry for the same name wins on the systemd side.
    pub fn set_manager_vars<I, K, V>(&self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let manager = self.manager()?;
        let assignments = env::format_assignments(vars);
        debug!("SetEnvironment {:?} on the {} bus", assignments, self.level);
        Ok(manager.set_environment(&assignments)?)
    }

    /// Remove variables from the manager's activation environment.
    pub fn unset_manager_vars(&self, names: &[String]) -> Result<()> {
        let manager = self.manager()?;
        debug!("UnsetEnvironment {:?} on the {} bus", names, self.level);
        Ok(manager.unset_environment(names)?)
    }

    /// Read the manager's activation environment as a name→value map.
    ///
    /// systemd returns an array of `NAME=value` strings; later duplicates win,
    /// and an entry without `=` is reported as [`Error::MalformedAssignment`].
    pub fn get_manager_vars(&self) -> Result<HashMap<String, String>> {
        let props = self.manager_properties()?;
        debug!("Get Environment on the {} bus", self.level);
        let value = props.get(MANAGER_INTERFACE, "Environment")?;
        let assignments = Vec::<String>::try_from(value).map_err(zbus::Error::from)?;
        env::parse_environment(assignments)
    }
}

impl fmt::Debug for BusObjectCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusObjectCache")
            .field("level", &self.level)
            .field("manager", &self.manager.borrow().is_some())
            .field("manager_properties", &self.manager_props.borrow().is_some())
            .field(
                "unit_properties",
                &self.unit_props.borrow().keys().cloned().collect::<Vec<_>>(),
            )
            .field("bus_daemon", &self.bus_daemon.borrow().is_some())
            .finish()
    }
}
