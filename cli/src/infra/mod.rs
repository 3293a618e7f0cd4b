//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, SSH
//! transport, registry loading, terminal prompts, and template rendering.
//!
//! Imports from `crate::domain` and `crate::application` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod prompter;
pub mod registry;
pub mod ssh;
pub mod templates;
pub mod workstation;
