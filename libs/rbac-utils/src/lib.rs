//! Small utilities shared across the RBAC gateway crates.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod humantime_serde;
