//! sysbusctl - Query and control systemd over D-Bus
//!
//! Talks to the system service manager by default; use --user for the
//! session's `systemd --user` instance.

use clap::{Parser, Subcommand};
use std::collections::HashMap;

use sysbus::{BusLevel, BusObjectCache, JobListing, UnitListing};

#[derive(Parser)]
#[command(name = "sysbusctl")]
#[command(about = "Query and control systemd over D-Bus")]
struct Args {
    /// Talk to the user service manager on the session bus
    #[arg(long, global = true)]
    user: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the manager's activation environment
    ShowEnv,

    /// Set variables in the manager's activation environment
    SetEnv {
        /// NAME=VALUE assignments
        #[arg(required = true)]
        vars: Vec<String>,
    },

    /// Unset variables from the manager's activation environment
    UnsetEnv {
        /// Variable names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Set variables in the bus daemon's activation environment
    SetActivationEnv {
        /// NAME=VALUE assignments
        #[arg(required = true)]
        vars: Vec<String>,
    },

    /// Read a single unit property
    GetProperty {
        /// Unit name (e.g., "docker.service")
        unit: String,
        /// Property name (e.g., "ActiveState")
        property: String,
    },

    /// Reload the service manager configuration (daemon-reload)
    Reload,

    /// List queued jobs
    ListJobs,

    /// List units, optionally filtered by state and glob patterns
    ListUnits {
        /// Filter by unit state (repeatable, e.g. --state active)
        #[arg(short = 's', long = "state")]
        states: Vec<String>,
        /// Glob patterns to match unit names against
        patterns: Vec<String>,
    },

    /// Stop a unit
    Stop {
        /// Unit name
        name: String,
        /// Job mode (fail, replace, ...)
        #[arg(long, default_value = "fail")]
        job_mode: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let level = if args.user {
        BusLevel::Session
    } else {
        BusLevel::System
    };

    if let Err(e) = run(level, args.command) {
        eprintln!("sysbusctl: {}", e);
        std::process::exit(1);
    }
}

fn run(level: BusLevel, command: Command) -> sysbus::Result<()> {
    let bus = BusObjectCache::new(level)?;

    match command {
        Command::ShowEnv => {
            let mut vars: Vec<_> = bus.get_manager_vars()?.into_iter().collect();
            vars.sort();
            for (name, value) in vars {
                println!("{}={}", name, value);
            }
        }
        Command::SetEnv { vars } => {
            bus.set_manager_vars(parse_var_pairs(&vars)?)?;
        }
        Command::UnsetEnv { names } => {
            bus.unset_manager_vars(&names)?;
        }
        Command::SetActivationEnv { vars } => {
            bus.set_bus_activation_vars(&parse_vars(&vars)?)?;
        }
        Command::GetProperty { unit, property } => {
            let value = bus.get_unit_property(&unit, &property)?;
            println!("{:?}", value);
        }
        Command::Reload => {
            bus.reload_manager()?;
        }
        Command::ListJobs => {
            print_jobs(&bus.list_jobs()?);
        }
        Command::ListUnits { states, patterns } => {
            let states: Vec<&str> = states.iter().map(String::as_str).collect();
            let patterns: Vec<&str> = patterns.iter().map(String::as_str).collect();
            print_units(&bus.list_units_by_patterns(&states, &patterns)?);
        }
        Command::Stop { name, job_mode } => {
            let job = bus.stop_unit(&name, Some(&job_mode))?;
            println!("{}", job);
        }
    }

    Ok(())
}

/// Parse NAME=VALUE command line arguments into a map.
fn parse_vars(vars: &[String]) -> sysbus::Result<HashMap<String, String>> {
    sysbus::env::parse_environment(vars)
}

/// Parse NAME=VALUE command line arguments, preserving argument order.
fn parse_var_pairs(vars: &[String]) -> sysbus::Result<Vec<(&str, &str)>> {
    vars.iter()
        .map(|entry| sysbus::env::parse_assignment(entry))
        .collect()
}

fn print_jobs(jobs: &[JobListing]) {
    if jobs.is_empty() {
        println!("No jobs queued");
        return;
    }
    println!("{:<6} {:<40} {:>10} {:>10}", "JOB", "UNIT", "TYPE", "STATE");
    for job in jobs {
        println!(
            "{:<6} {:<40} {:>10} {:>10}",
            job.id, job.unit, job.job_type, job.state
        );
    }
}

fn print_units(units: &[UnitListing]) {
    if units.is_empty() {
        println!("No matching units");
        return;
    }
    println!(
        "{:<40} {:>10} {:>10} {:>10}",
        "UNIT", "LOAD", "ACTIVE", "SUB"
    );
    for unit in units {
        println!(
            "{:<40} {:>10} {:>10} {:>10}",
            unit.name, unit.load_state, unit.active_state, unit.sub_state
        );
    }
}
