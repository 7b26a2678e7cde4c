/// Errors surfaced by the chart. Nothing is recovered locally.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartError {
    /// Container not resolvable or no room left to draw in.
    ConfigurationError(String),
    /// Empty dataset or a mapping that produced non-finite pixels.
    DataError(String),
    /// A record breaks the OHLC invariant or dates are out of order.
    ValidationError { index: usize, reason: String },
    /// The host scene backend refused an operation.
    RenderingError(String),
}

impl ChartError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        ChartError::ConfigurationError(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        ChartError::DataError(msg.into())
    }

    pub fn validation(index: usize, reason: impl Into<String>) -> Self {
        ChartError::ValidationError { index, reason: reason.into() }
    }

    pub fn rendering(msg: impl Into<String>) -> Self {
        ChartError::RenderingError(msg.into())
    }

    /// Short kind name, used as the JS error name at the wasm boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            ChartError::ConfigurationError(_) => "ConfigurationError",
            ChartError::DataError(_) => "DataError",
            ChartError::ValidationError { .. } => "ValidationError",
            ChartError::RenderingError(_) => "RenderingError",
        }
    }
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartError::ConfigurationError(msg) => write!(f, "Configuration Error: {}", msg),
            ChartError::DataError(msg) => write!(f, "Data Error: {}", msg),
            ChartError::ValidationError { index, reason } => {
                write!(f, "Validation Error: record {}: {}", index, reason)
            }
            ChartError::RenderingError(msg) => write!(f, "Rendering Error: {}", msg),
        }
    }
}

impl std::error::Error for ChartError {}

pub type ChartResult<T> = Result<T, ChartError>;
