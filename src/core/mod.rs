//! core
//!
//! Core domain types and collaborators for repometa.
//!
//! # Modules
//!
//! - [`types`] - Strong types: FieldName, OwnerId, RelationshipId, etc.
//! - [`registry`] - Metadata field registry and field path parsing
//! - [`record`] - Metadata records and the virtual authority encoding
//! - [`owner`] - Objects that own metadata records
//! - [`relationship`] - Typed relationships and their store
//! - [`authority`] - Confidence, authority policy and resolvers
//! - [`matcher`] - Field and language selection
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Records are created and changed only through the engine

pub mod authority;
pub mod config;
pub mod matcher;
pub mod owner;
pub mod record;
pub mod registry;
pub mod relationship;
pub mod types;
