//! repometa - ordered, authority-controlled metadata for repository objects
//!
//! Every repository object (item, collection, community, person, ...) owns
//! a list of metadata records. Each record is a value for one registered
//! field, with an optional language, an optional authority key and
//! confidence, and a place giving its position among the owner's values
//! for that field. Some records are derived from typed relationships
//! between items and keep the relationship's place in sync.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, field registry, records, owners, relationships,
//!   authority control and configuration
//! - [`engine`] - The metadata service: reads, writes, reordering,
//!   renumbering and relationship-derived values
//! - [`cli`] - Command-line interface over JSON owner documents
//!
//! # Guarantees
//!
//! 1. After an update pass the places of each field are `0..n-1`
//! 2. A non-controlled field never stores an authority key
//! 3. Failed writes leave the owner unchanged

pub mod cli;
pub mod core;
pub mod engine;
