// Raw trace ingestion: the line parser, the store, and the tracer subprocess

pub mod parser;
pub mod store;
pub mod tracer;

pub use parser::{ChildSignal, ExecEvent, StraceParser, TraceParser};
pub use store::TraceStore;
