pub mod console;
pub mod recording;
