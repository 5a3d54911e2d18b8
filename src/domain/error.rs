//! Domain error types.

/// Top-level error type for volsqueeze.
///
/// Per-asset failures (`NoData`, `InsufficientData`, `DataQuality`,
/// `IndicatorDegenerate`) are isolated by the pipeline: the offending
/// asset is skipped with a warning. Only `AllAssetsFailed` aborts a run.
#[derive(Debug, thiserror::Error)]
pub enum VolsqueezeError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("data quality check failed for {symbol}: {reason}")]
    DataQuality { symbol: String, reason: String },

    #[error("degenerate indicators for {symbol}: {reason}")]
    IndicatorDegenerate { symbol: String, reason: String },

    #[error("all {attempted} assets failed validation")]
    AllAssetsFailed { attempted: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("report write error: {0}")]
    Report(#[from] csv::Error),
}

impl From<&VolsqueezeError> for std::process::ExitCode {
    fn from(err: &VolsqueezeError) -> Self {
        let code: u8 = match err {
            VolsqueezeError::Io(_) | VolsqueezeError::Report(_) => 1,
            VolsqueezeError::ConfigParse { .. }
            | VolsqueezeError::ConfigMissing { .. }
            | VolsqueezeError::ConfigInvalid { .. } => 2,
            VolsqueezeError::DataSource { .. } => 3,
            VolsqueezeError::NoData { .. }
            | VolsqueezeError::InsufficientData { .. }
            | VolsqueezeError::DataQuality { .. }
            | VolsqueezeError::IndicatorDegenerate { .. } => 5,
            VolsqueezeError::AllAssetsFailed { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
