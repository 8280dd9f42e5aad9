// Command-line interface: argument types, handlers, output formatting

pub mod commands;
pub mod handlers;
pub mod output;
