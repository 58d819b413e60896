//! Command-line interface for the `conftree` binary.

pub mod args;
pub mod commands;
