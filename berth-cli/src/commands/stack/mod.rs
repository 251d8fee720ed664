//! `berth stack` commands

pub mod common;
pub mod deploy;
pub mod ps;
