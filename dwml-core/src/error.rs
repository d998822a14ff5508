use thiserror::Error;

/// Hard failures of the document pipeline.
///
/// Everything short of a document that is not XML at all is absorbed by the
/// aligner and reported as a [`crate::Diagnostic`] instead.
#[derive(Debug, Error)]
pub enum DwmlError {
    #[error("Malformed DWML document: {0}")]
    MalformedDocument(#[from] roxmltree::Error),
}

/// Failures while retrieving the raw DWML text.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Weather service request timed out")]
    Timeout,

    #[error("Weather service returned error: {0}")]
    Status(u16),

    #[error("Failed to fetch weather data: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// Errors surfaced by [`crate::get_hourly_forecast`].
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Invalid forecast request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Document(#[from] DwmlError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_document_message_carries_parser_detail() {
        let parse_err = roxmltree::Document::parse("<dwml><data></dwml>").unwrap_err();
        let err = DwmlError::from(parse_err);

        assert!(err.to_string().starts_with("Malformed DWML document:"));
    }

    #[test]
    fn forecast_error_is_transparent_over_fetch() {
        let err = ForecastError::from(FetchError::Status(503));
        assert_eq!(err.to_string(), "Weather service returned error: 503");
    }
}
