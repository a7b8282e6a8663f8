use thiserror::Error;

/// Cause of a fatal source read failure.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A source table could not be read at all. Always aborts the run: no
    /// partial report is meaningful without both inputs.
    #[error("data source '{name}' unavailable: {source}")]
    DataUnavailable {
        name: String,
        #[source]
        source: SourceError,
    },

    /// A single record violated its expected shape. Skipped and counted by
    /// default; aborts the run in strict mode.
    #[error("{source_name} row {row}: {message}")]
    DataIntegrity {
        source_name: &'static str,
        row: usize,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("report construction failed: {0}")]
    Report(String),
}

impl PipelineError {
    pub(crate) fn unavailable(name: &str, source: impl Into<SourceError>) -> Self {
        PipelineError::DataUnavailable {
            name: name.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn integrity(source_name: &'static str, row: usize, message: impl Into<String>) -> Self {
        PipelineError::DataIntegrity {
            source_name,
            row,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
