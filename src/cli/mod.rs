//! CLI command implementations
//!
//! - `evaluate`: flow, table, requirements and explanation commands
//! - `config`: configuration check and schema commands
//! - `util`: shared loading and output helpers

pub mod config;
pub mod evaluate;
pub mod util;

pub use config::{cmd_config_check, cmd_schema};
pub use evaluate::{cmd_basic, cmd_evaluate, cmd_explain, cmd_requirements, cmd_table};
pub use util::Options;
