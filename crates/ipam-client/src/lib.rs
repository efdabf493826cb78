//! IPAC REST API Client
//!
//! A Rust client library for the IPAC inventory backend.
//! Provides type-safe models for hosts, subnets and racks, a REST client,
//! and a data access layer that keeps the console usable when the backend
//! is unreachable.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ipam_client::{HostFilter, HostStatus, IpamClient, IpamService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = IpamClient::new("http://ipac:8080/api".to_string())?;
//! let service = IpamService::new(Arc::new(client));
//!
//! // Reads never fail: a bundled dataset is returned when the backend is down
//! let filter = HostFilter {
//!     statuses: vec![HostStatus::Online],
//!     ..Default::default()
//! };
//! let hosts = service.hosts(&filter).await;
//!
//! // Mutations propagate backend failures
//! if let Some(host) = hosts.first() {
//!     service.delete_host(&host.id).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Hosts and Subnets**: list, create, update, delete
//! - **Dashboard**: aggregated overview
//! - **Bulk ping** and **report export**
//! - **Fallback**: deterministic datasets substituted for failed reads

pub mod client;
pub mod common;
pub mod error;
pub mod fallback;
pub mod models;
#[path = "trait.rs"]
pub mod ipam_trait;
pub mod service;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::IpamClient;
pub use common::HttpClient;
pub use error::IpamError;
pub use ipam_trait::IpamClientTrait;
pub use models::*;
pub use service::IpamService;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockIpamClient;
