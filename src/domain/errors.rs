use derive_more::Display;

/// Failure at the remote fetch boundary. The sync cache absorbs it.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TransportError {
    #[display(fmt = "Network Error: {}", _0)]
    Network(String),
    #[display(fmt = "HTTP error: {} - {}", status, text)]
    Status { status: u16, text: String },
    #[display(fmt = "Decode Error: {}", _0)]
    Decode(String),
}

impl std::error::Error for TransportError {}

/// A sample sequence that breaks the series invariants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SeriesError {
    #[display(fmt = "timestamp at index {} does not increase", index)]
    NonIncreasing { index: usize },
    #[display(fmt = "sample at index {} has a different channel shape", index)]
    MixedShape { index: usize },
}

impl std::error::Error for SeriesError {}

impl From<SeriesError> for TransportError {
    fn from(err: SeriesError) -> Self {
        TransportError::Decode(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ConfigError {
    #[display(fmt = "Config Error: {}", _0)]
    Parse(String),
    #[display(fmt = "Config Error: {} must be greater than zero", _0)]
    ZeroDuration(&'static str),
}

impl std::error::Error for ConfigError {}

pub type FetchResult<T> = Result<T, TransportError>;
