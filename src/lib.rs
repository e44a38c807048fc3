//! sievedb - query construction and multi-tenant data access for web APIs
//!
//! Composes filter predicates from recursive descriptors, resolves symbolic
//! column names and the tables they touch, paginates composed queries, and
//! keeps a registry of named logical databases with independent schema
//! metadata, engine and session factory.

pub mod executor;
pub mod expr;
pub mod filter;
pub mod observability;
pub mod options;
pub mod pagination;
pub mod registry;
pub mod schema;
pub mod temporal;
