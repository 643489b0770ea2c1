use crate::domain::entities::trade_record::{lenient_f64, lenient_opt_f64};
use serde::{Deserialize, Serialize};

/// An open pair position, polled while a run is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub pair_id: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub stock1_code: String,
    pub stock2_code: String,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub stock1_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub stock2_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(default)]
    pub open_time: Option<String>,
}
