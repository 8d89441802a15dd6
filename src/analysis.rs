//! Offline analysis of capture files.
//!
//! The invoker runs the decoding engine over a finished capture file and
//! returns its full output. The formatter then bounds the output size per
//! rendering mode before it reaches a caller.
//!
//! Re-exports:
//! - [`AnalysisInvoker`]: runs one analysis.
//! - [`AnalysisRequest`]: what to analyze and how to render it.
//! - [`trim`]: applies the per-format output ceiling.

pub mod formatter;
pub mod invoker;
pub mod types;

pub use formatter::{ceiling, trim};
pub use invoker::AnalysisInvoker;
pub use types::{AnalysisRequest, DEFAULT_FIELDS};
