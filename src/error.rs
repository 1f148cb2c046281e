pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("invalid history item: {0}")]
    InvalidItem(String),
    #[error("content not found: {id}")]
    ContentNotFound { id: String },
    #[error("content query failed: {0}")]
    ContentQuery(String),
}

impl From<std::io::Error> for AppError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            context: "I/O operation failed".to_string(),
        }
    }
}

impl AppError {
    pub fn io_with_context(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            source,
            context: context.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn invalid_action(message: impl Into<String>) -> Self {
        Self::InvalidAction(message.into())
    }

    pub fn invalid_item(message: impl Into<String>) -> Self {
        Self::InvalidItem(message.into())
    }

    pub fn content_not_found(id: impl Into<String>) -> Self {
        Self::ContentNotFound { id: id.into() }
    }

    pub fn content_query(message: impl Into<String>) -> Self {
        Self::ContentQuery(message.into())
    }
}
