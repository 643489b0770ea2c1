pub mod cache_buster;
pub mod metrics;
pub mod monitor_config;
pub mod monitor_state;
pub mod progress;
pub mod trade_action;
