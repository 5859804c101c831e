// Core data model shared by the engine and runtime crates.
// Schemas only: no locking, no clocks, no I/O.

pub mod operation;
pub mod report;
pub mod session;

pub use operation::{OperationTiming, OperationType, StageLatencies, TimingStage, ViolationKind};
pub use report::{
    LatencyStats, MetricSample, PerformanceMetrics, PerformanceValidation, SessionMetricsSummary,
    TargetValidation,
};
pub use session::{
    ResponsePayload, SessionOutcome, SessionRecord, SessionSuccessMetrics, ToolExecutionRecord,
    TransactionType,
};
