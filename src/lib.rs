#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classifier;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod text;
