//! Accord: runs accessibility checkers against a page and accords their results.
//!
//! The binary wires configuration, logging and the built-in checkers around the
//! orchestrator in `accord-scheduler`.

pub mod checkers;
pub mod config;
pub mod runtime;

pub use checkers::{builtin_registry, DocTypeChecker, NativeReplayChecker, ShootChecker};
pub use config::{load_config, AccordConfig, LoadedConfig};
pub use runtime::{build_orchestrator, init_logging, load_job, load_page, run_fixture_job};
