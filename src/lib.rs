pub mod audio;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod summarize;
pub mod timestamps;
pub mod transcribe;

pub use config::{Config, Strategy};
pub use error::{Result, VidsumError};
pub use pipeline::{
    CostLedger, Pipeline, PipelineOptions, PipelineResult, ProgressEvent, UnitProcessor,
    UnitResult,
};
