//! Terminal output.

pub mod console;
pub mod table;

pub use console::ConsoleReporter;
