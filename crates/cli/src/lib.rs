//! Public library modules for the CLI crate
pub mod corpus;
pub mod entries;
pub mod notebook;
pub mod search;
