//! Derives Hasura metadata from a declarative entity schema graph.
//!
//! The pipeline walks a read-only graph of entities, fields, and foreign-key
//! edges, synthesizes table customizations and relationships for every table,
//! derives role-scoped permissions (propagating each entity's rules to the
//! dependent tables reachable through its non-owning edges), and submits the
//! result as ordered command batches to a remote metadata store.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod naming;
pub mod permissions;
pub mod runtime;
pub mod synthesis;

pub use client::{BulkOutcome, HasuraClient, MetadataClient};
pub use config::RuntimeConfig;
pub use error::{HasuraSyncError, Result};
pub use graph::SchemaGraph;
pub use runtime::Runtime;
