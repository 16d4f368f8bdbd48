//! Knowledge-tagged hint and review engine for programming problems.
//!
//! The core tags problems with algorithm concepts, checks submitted code for the
//! idioms those concepts imply, builds level-graded prompts, parses the model's
//! replies and caches the results. `routes` and `state` expose it over HTTP.

pub mod vocabulary;
pub mod extractor;
pub mod patterns;
pub mod knowledge;
pub mod domain;
pub mod prompts;
pub mod parser;
pub mod cache;
pub mod model;
pub mod fallback;
pub mod engine;

pub mod config;
pub mod util;
pub mod state;
pub mod protocol;
pub mod routes;
pub mod telemetry;
