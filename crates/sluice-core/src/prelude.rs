//! Convenient re-exports for downstream crates.

pub use crate::config::PipelineConfig;
pub use crate::error::{Error, Result};
pub use crate::pipe::Pipe;
pub use crate::relay::Relay;
pub use crate::resource::{Capability, Resource};
pub use crate::source::{Origin, Source};
pub use crate::stage::{AnyStage, BoxStage, Context, Cursor, Operator, Stage, StageExt};
