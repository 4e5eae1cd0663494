//! # calc_engine - Multilingual Calculator Engine
//!
//! `calc_engine` is the core of Calcboard: declarative calculator
//! configurations, per-locale string bundles, and pure compute functions
//! behind a single evaluation entry point. Requests and results are plain
//! serde types, so the engine can sit behind a web form, a CLI or an RPC
//! boundary without adapters.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: compute functions are pure; configs never change after startup
//! - **JSON-First**: every request, result and config serializes
//! - **Two error channels**: schema violations are `Err`, domain problems are
//!   results with `is_valid == false`
//! - **Localized at the edge**: numbers and summaries are formatted per locale
//!
//! ## Quick Start
//!
//! ```rust
//! use calc_engine::{Engine, EngineSettings, EvaluationRequest};
//!
//! let engine = Engine::new(EngineSettings::default()).unwrap();
//! let results = engine
//!     .evaluate(&EvaluationRequest::new("vlsm").with_locale("de"))
//!     .unwrap();
//! println!("{}", results.summary);
//! ```
//!
//! ## Modules
//!
//! - [`engine`] - Request evaluation and validation
//! - [`registry`] - Calculator id to definition map
//! - [`calculators`] - Bandwidth, VLSM, RAID, investment and loan calculators
//! - [`schema`] - Configuration types, visibility rules and config checks
//! - [`locale`] - Embedded locale bundles with reference fallback
//! - [`view`] - Localized calculator descriptions
//! - [`units`] / [`format`] - Unit conversion and locale-aware formatting
//! - [`settings`] - Engine settings loaded from TOML
//! - [`errors`] - Structured error types

pub mod calculators;
pub mod engine;
pub mod errors;
pub mod format;
pub mod input;
pub mod locale;
pub mod registry;
pub mod results;
pub mod schema;
pub mod settings;
pub mod template;
pub mod units;
pub mod view;

// Re-export commonly used types at crate root for convenience
pub use engine::{Engine, EvaluationRequest};
pub use errors::{CalcError, CalcResult};
pub use input::ComputeInput;
pub use results::CalculatorResults;
pub use schema::CalculatorConfig;
pub use settings::{EngineSettings, MissingTranslationPolicy};
pub use view::CalculatorView;
