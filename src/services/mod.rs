//! External collaborator services
//!
//! Reflection generation (LLM) and telemetry attachment. Both are
//! consumed through traits so the pipeline can run against stubs in
//! tests and a no-op telemetry sink in collector-less deployments.

pub mod reflection;
pub mod telemetry;

pub use reflection::{LlmReflectionGenerator, Reflection, ReflectionGenerator, ReflectionRequest};
pub use telemetry::{HttpTelemetry, NoopTelemetry, Telemetry};
