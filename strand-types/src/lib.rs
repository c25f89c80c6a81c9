//! Shared type definitions for the Strand Protocol.
//!
//! Primitives, wire messages, collaborator traits, and protocol constants
//! used by every other crate in the workspace.

pub mod collab;
pub mod constants;
pub mod error;
pub mod message;
pub mod primitives;
