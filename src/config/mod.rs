//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated)
//!     → App::from_config (settings, templates, static mounts)
//!     → frozen behind Arc once the application is built
//! ```
//!
//! # Design Decisions
//! - Configure once before serving; no runtime reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod settings;
pub mod validation;

pub use schema::AppConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::StaticConfig;
pub use schema::TemplatesConfig;
pub use settings::{EtagMode, SettingValue, Settings, SettingsError};
