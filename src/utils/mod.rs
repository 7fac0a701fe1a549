// Utils

pub mod common;
pub mod prometheus_metrics;
pub mod utils;

pub use common::{connect_rabbitmq, consumer_tag, ctrl_c, keypress_or_ctrl_c};
pub use utils::setup_prometheus_metrics;
