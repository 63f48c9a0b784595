//! taskmirror - Asana Workspace Extraction Daemon
//!
//! taskmirror periodically pulls the users and projects of an Asana
//! workspace and mirrors each entity as an individual JSON file in a local
//! storage directory.
//!
//! ## Core Features
//!
//! - **Paginated Listings**: cursor-based pagination handled transparently
//! - **Rate-Limit Aware**: bounded Retry-After backoff on HTTP 429
//! - **Concurrent Extraction**: users and projects extracted in parallel
//!   under one shared cycle deadline
//! - **Configuration Management**: YAML-based configuration with XDG
//!   compliance and environment-sourced credentials
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`asana`]: Asana API client (pagination, rate-limit retry)
//! - [`extractor`]: Extraction orchestration
//! - [`storage`]: Local file sink

pub mod asana;
pub mod config;
pub mod daemon;
pub mod deadline;
pub mod error;
pub mod extractor;
pub mod models;
pub mod storage;

pub use asana::AsanaClient;
pub use config::Config;
pub use daemon::Daemon;
pub use deadline::Deadline;
pub use error::{Error, Result};
pub use extractor::{Extractor, WorkspaceClient};
pub use models::{Project, User};
pub use storage::{LocalStorage, Storage};
