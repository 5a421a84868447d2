// This file makes items available to main.rs and integration tests.

pub mod abundance;
pub mod assembler;
pub mod cli;
pub mod commands;
pub mod errors;
pub mod graph;
pub mod indexer;
pub mod kmer;
pub mod matcher;
pub mod pipeline;
pub mod types;
pub mod utils;
