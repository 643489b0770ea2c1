pub mod position;
pub mod run_status;
pub mod trade_record;
pub mod view_state;
