use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustomError {
    #[error("could not read {path}")]
    ReadWithPath {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[error("could not parse {path} as tab-separated values")]
    TsvRead {
        #[source]
        source: csv::Error,
        path: std::path::PathBuf,
    },

    #[error("could not write to {path}")]
    Write {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[error("could not render the markdown report")]
    Render(#[from] std::fmt::Error),

    #[error("could not serialize metrics to JSON")]
    Json(#[from] serde_json::Error),

    #[error("could not read overwrite confirmation")]
    Prompt {
        #[source]
        source: std::io::Error,
    },

    #[error("{path} already exists and was not overwritten")]
    OutputExistsDeclined { path: std::path::PathBuf },

    #[error("input file {path} does not exist or is not readable")]
    InputMissing { path: std::path::PathBuf },

    #[error("could not parse column index \"{arg}\"")]
    ColumnIndexInt {
        #[source]
        source: std::num::ParseIntError,
        arg: String,
    },

    #[error("column indices are 1-based, 0 is not a column")]
    ColumnIndexLow,

    #[error("expected 4 column indices (chain, CDR3, species, epitope), got {n_columns}")]
    ColumnCount { n_columns: usize },

    #[error("could not build thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid progress bar template")]
    ProgressTemplate(#[from] indicatif::style::TemplateError),
}

pub type Result<T> = std::result::Result<T, CustomError>;
