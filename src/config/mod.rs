//! Configuration merge system
//!
//! Implements the 4-layer configuration merge:
//! 1. Built-in defaults
//! 2. Host config (~/.config/emailflow/intake.toml)
//! 3. Repo config (.emailflow/intake.toml)
//! 4. CLI overrides (JSON)

mod defaults;
mod effective;
mod merge;
mod policy;

pub use defaults::BuiltinDefaults;
pub use effective::{
    default_host_path, default_repo_path, ConfigError, ConfigOrigin, ConfigSource,
    EffectiveConfig, HOST_CONFIG_PATH, REPO_CONFIG_PATH, SCHEMA_ID, SCHEMA_VERSION,
};
pub use merge::{deep_merge, merge_layers};
pub use policy::{
    HintSection, IntakePolicy, NotifySection, PollSection, SubmitModeName, SubmitSection,
    UploadSection, MAX_UPLOAD_CEILING,
};
