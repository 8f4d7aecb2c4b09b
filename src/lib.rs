//! Surtir — storage provisioning workflow generator.
//!
//! Reads a storage-array facts document (LDEVs, host groups, and their
//! embedded associations) and compiles it into ordered, idempotent Ansible
//! provisioning playbooks: create volumes, create host groups, bind volumes
//! to host groups.

pub mod cli;
pub mod core;
