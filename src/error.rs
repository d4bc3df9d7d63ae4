use thiserror::Error;

/// Failures the component recovers from locally.
///
/// None of these ever escape to the host; they are logged where they are
/// handled and, where useful, kept around for inspection.
#[derive(Debug, Error)]
pub enum QuickMenuError {
    /// Icon content that could not be classified or sanitized.
    #[error("icon configuration rejected: {0}")]
    Configuration(String),
    /// The reply source failed to fetch or reported itself disabled.
    #[error("reply source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("failed to trigger quick reply \"{group}.{label}\": {source}")]
    Trigger {
        group: String,
        label: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to persist settings: {0}")]
    Persistence(#[source] anyhow::Error),
}
