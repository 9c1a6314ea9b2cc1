//! Global identifier mangling for utility-class names
//!
//! One [`Context`] per build session is the single source of truth for
//! identifier assignment and protection: it owns the replacement map, the
//! preserve set and the [`ClassGenerator`]. Source rewriters consume it:
//!
//! - [`css_handler`] rewrites class selectors in stylesheets (selector-aware,
//!   scoped-attribute aware);
//! - [`pre_process_js`] rewrites candidate occurrences in JS/TS sources at
//!   scanner-reported offsets;
//! - [`pre_process_raw_code`] is the conservative fallback for any other file
//!   kind (word-boundary-safe literal replacement).
//!
//! The context is threaded explicitly through every call; there is no ambient
//! singleton. All naming state sits behind one lock, so files can be processed
//! concurrently without double-allocating on first sight of a name.

pub mod config;
pub mod css;
pub mod ctx;
pub mod extract;
pub mod generator;
pub mod report;
pub mod rewrite;

pub use config::{ClassMapOutputOptions, ConfigError, MangleConfig, MangleUserConfig};
pub use css::{css_handler, CssHandlerOptions, CssOutput};
pub use ctx::{Context, MangleError};
pub use extract::{CandidateExtractor, RawCandidate, SplitExtractor};
pub use generator::{ClassGenerator, CollisionError, Generated};
pub use report::{class_map_entries, write_class_map, ClassMapEntry, ReportError};
pub use rewrite::{pre_process_js, pre_process_raw_code};
