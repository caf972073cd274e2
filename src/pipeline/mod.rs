//! Request pipeline: generation, naming and lifecycle tracking

mod generator;
mod naming;
mod state;

pub use generator::{stage, Generator, Progress};
pub use naming::{output_stem, slugify};
pub use state::{PipelineState, RequestTracker};
