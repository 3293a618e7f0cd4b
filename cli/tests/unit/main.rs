//! Unit tests for appconfig CLI
//!
//! These tests drive the services against recording fakes and run fast
//! without SSH, local processes or a terminal.

mod cache_service;
mod deploy_service;
mod helpers;
mod lifecycle;
