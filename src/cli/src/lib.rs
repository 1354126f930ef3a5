//! olmoci CLI - manage OLM artifacts on OCI registries.

pub mod commands;
pub mod output;
