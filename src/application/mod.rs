pub mod chart;
pub mod effect;
pub mod monitor;
pub mod runtime;
pub mod stream_event;
pub mod trades;
