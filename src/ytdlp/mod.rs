pub mod command;
pub mod ffmpeg;
pub mod progress;

pub use command::build_command;
pub use progress::{engine_error, parse_line, OutputLine};
