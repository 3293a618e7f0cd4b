//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod app;
pub mod credentials;
pub mod environment;
pub mod error;
pub mod health;
pub mod platform;
pub mod registry;
pub mod requirements;
pub mod shell;
pub mod template;
pub mod varnish;

pub use app::AppDescriptor;
pub use environment::Environment;
pub use error::{
    AppError, ConfigError, EnvironmentError, HealthCheckError, PlatformError, RemoteError,
};
pub use platform::Release;
pub use registry::{AppRegistry, RegistryFile};
pub use template::ProvisioningContext;
