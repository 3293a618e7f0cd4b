//! Application services — use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod cache;
pub mod credentials;
pub mod deploy;
pub mod ensure;
pub mod lifecycle;
pub mod maintenance;
pub mod nginx;
pub mod pip_freeze;
pub mod render;
pub mod scripts;
pub mod supervisor;
