//! sysbus - Memoizing D-Bus client for systemd
//!
//! A thin façade over [`zbus`] that:
//! - Queries and controls the service manager (unit properties, job and unit
//!   listings, reload, stop)
//! - Reads and writes the activation environment of both systemd and the bus
//!   daemon
//! - Creates each bus proxy once on first use and reuses it for the lifetime
//!   of the [`BusObjectCache`]
//!
//! All protocol work (framing, auth, dispatch) is zbus's; remote faults
//! propagate to the caller unchanged.
//!
//! ```no_run
//! use sysbus::BusObjectCache;
//!
//! fn main() -> sysbus::Result<()> {
//!     let bus = BusObjectCache::session()?;
//!     let state = bus.get_unit_property("default.target", "ActiveState")?;
//!     println!("{:?}", state);
//!     Ok(())
//! }
//! ```

pub mod dbus;
pub mod env;
pub mod error;

pub use dbus::proxies::{JobListing, UnitListing};
pub use dbus::{BusLevel, BusObjectCache};
pub use error::{Error, Result};
