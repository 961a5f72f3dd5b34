//! Title extraction from the raw text of a document's first pages.
//!
//! Pure text in, text out: nothing here touches the filesystem. The
//! [`TitleExtractor`] runs a fixed sequence of heuristics whose keyword sets
//! and window sizes live in [`TitleConfig`]; each predicate is exposed on
//! [`Heuristics`] so it can be tested on its own.

pub mod config;
pub mod heuristics;
pub mod text_processing;
pub mod title;

pub use config::{ListOverride, TitleConfig, TitleConfigBuilder};
pub use heuristics::Heuristics;
pub use title::{TitleExtractor, extract_title};
