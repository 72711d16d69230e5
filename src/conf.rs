//! Page builder settings
//!
//! Settings merge builtin defaults, an optional TOML file and `KAPWA_*`
//! environment variables, later sources winning.

pub use kapwa_conf::*;
