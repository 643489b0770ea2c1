pub mod chart_probe;
pub mod execution_backend;
pub mod progress_stream;
pub mod renderer;
