//! Observability utilities.

mod tracing;

pub use self::tracing::{init_tracing, init_tracing_with_writer, LogFormat, SpanTimer};
