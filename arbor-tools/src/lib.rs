//! Tooling primitives for arbor trees and planners.
//!
//! Lightweight and engine-agnostic. Rendering, inspectors and the like belong
//! in adapter crates built on top of these events.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{
    NullTraceSink, SharedTraceLog, TeeSink, TraceEvent, TraceLog, TraceSink, TracingSink,
    VecTraceSink,
};
