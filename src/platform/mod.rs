//! Terminal input sources.

pub mod chunker;
pub mod input_stream;
#[cfg(unix)]
pub mod process_input;

pub use chunker::Chunker;
pub use input_stream::{InputStream, ScriptedInput};
#[cfg(unix)]
pub use process_input::ProcessInput;
