#![forbid(unsafe_code)]
//! sluice-core: the stage contract, sources, relays and chain assembly.
//!
//! Design intent:
//! - Pull-based and single-threaded; nothing runs until a tail is pulled.
//! - A chain is owned by its tail. Each stage owns at most one upstream.
//! - Resource operations are forwarded through [`Capability`] lookups, never
//!   re-declared per stage.
//! - No I/O or parsing here; see `sluice-io`.

pub mod config;
pub mod error;
pub mod pipe;
pub mod prelude;
pub mod relay;
pub mod resource;
pub mod source;
pub mod stage;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use pipe::Pipe;
pub use relay::Relay;
pub use resource::{Capability, Resource};
pub use source::{Origin, Source};
pub use stage::{AnyStage, BoxStage, Context, Cursor, Iter, Operator, Stage, StageExt};
