pub mod clock;
pub mod collector;
pub mod config;
pub mod error;
pub mod exposition;
pub mod operations;
pub mod sessions;
pub mod violations;

pub use clock::{Clock, SystemClock};
pub use collector::MetricsCollector;
pub use config::{
    resolve_config_path, IndicatorConfig, LatencyConfig, MetricsConfig, MtbaConfig, SessionConfig,
};
pub use error::{Error, Result};
pub use exposition::build_samples;
pub use operations::{new_operation_id, OperationTracker};
pub use sessions::SessionTracker;
pub use violations::ViolationCounters;
