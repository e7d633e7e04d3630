//! View subsystem.
//!
//! # Data Flow
//! ```text
//! App::load_templates(fs, root, config)
//!     → templates.rs (list files, compile into one tera instance)
//!     → Arc<Templates> shared by every Response
//!     → Response::render(name, data)
//! ```

pub mod templates;

pub use templates::Templates;
