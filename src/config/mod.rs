//! Configuration module
//!
//! CLI arguments and environment/binding configuration.

mod settings;

pub use settings::{
    build_backend, resolve_bindings, BindingSettings, CliArgs, Commands, EnvConfig,
    ExclusionRules,
};
