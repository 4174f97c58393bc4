//! Line-level lowering of OpenMP pragmas to explicit runtime calls.
//!
//! The passes in [`passes`] operate on text streams annotated with
//! preprocessor line markers, so the original line of every statement stays
//! recoverable across rewrites.

pub mod config;
pub mod error;
pub mod parser;
pub mod passes;

pub use config::Config;
pub use error::{Error, Result};
