//! TCAS CLI - command line tools for the TCAS node.
//!
//! This crate provides:
//! - send_squitter: injects a fixed squitter for a fake aircraft
//! - demo_encounter: runs simulated aircraft against each other in-process

pub mod scenarios;

pub use scenarios::{
    by_name, create_crossing_scenario, create_head_on_scenario, create_parallel_scenario, Encounter,
};
