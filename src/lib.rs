//! sluice: lazy, composable pull pipelines.
//!
//! The engine lives in `sluice-core`; this crate re-exports it next to the
//! operator library and the I/O layer so one dependency covers everything.
//!
//! ```no_run
//! use sluice::prelude::*;
//! use sluice::io::CsvFileReader;
//! use sluice::operators::limit;
//!
//! let mut rows = (CsvFileReader::open("people.csv")? >> limit(10))?;
//! for row in rows.iter() {
//!     println!("{:?}", row?);
//! }
//! # Ok::<(), sluice::Error>(())
//! ```

#![forbid(unsafe_code)]

pub use sluice_core::{
    config, error, pipe, relay, resource, source, stage, AnyStage, BoxStage, Capability, Context,
    Cursor, Error, Iter, Operator, Origin, Pipe, PipelineConfig, Relay, Resource, Result, Source,
    Stage, StageExt,
};

pub use sluice_io as io;
pub use sluice_operators as operators;

pub mod prelude {
    pub use sluice_core::prelude::*;
    pub use sluice_io::{Dialect, DsvParse, DsvFormat, Selector};
    pub use sluice_operators::IntoStage;
}
