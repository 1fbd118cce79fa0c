//! Engine module: CLI, progress, counting tools and in-memory splitting

pub mod arg_parser;
pub mod cli;
pub mod parallel;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use parallel::{count_in_memory, split_ranges};
pub use tools::{count_lines, count_words, is_word_byte, tally_chunk};
