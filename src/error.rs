use thiserror::Error;

/// One variant per failure class the pipeline branches on. Everything except
/// `Precondition` is recovered at the owning task's boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid {field}: {value:?}")]
    Validation { field: &'static str, value: String },

    #[error("search request failed: {0}")]
    Resolution(#[from] reqwest::Error),

    #[error("detail page request failed: {0}")]
    DetailFetch(#[source] reqwest::Error),

    #[error("detail page missing expected region: {region}")]
    Enrichment { region: &'static str },

    #[error("image download failed: {0}")]
    ImageFetch(String),

    #[error("duplicate title: {title}")]
    Conflict { title: String },

    #[error("store unreachable: {0}")]
    Precondition(String),

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
