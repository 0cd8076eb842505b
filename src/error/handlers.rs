//! Standardized error handling patterns for registry and engine responses

use crate::error::{Result, WorkbenchError};
use reqwest::StatusCode;

/// Standard error handler for HTTP responses
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Handle registry-related HTTP errors
    ///
    /// 405 and the distribution error code `UNSUPPORTED` are reported as
    /// [`WorkbenchError::Unsupported`] so handlers can downgrade them to a warning.
    pub fn handle_registry_error(
        status: StatusCode,
        error_text: &str,
        operation: &str,
    ) -> WorkbenchError {
        if Self::is_unsupported_response(status, error_text) {
            return WorkbenchError::Unsupported(format!(
                "{} is not supported on this registry (status {})",
                operation, status
            ));
        }

        match status.as_u16() {
            401 => WorkbenchError::Auth(format!(
                "Unauthorized to perform {} operation: {}",
                operation, error_text
            )),
            403 => WorkbenchError::Auth(format!(
                "Forbidden: insufficient permissions for {}: {}",
                operation, error_text
            )),
            404 => WorkbenchError::NotFound(format!(
                "Resource not found for {}: {}",
                operation, error_text
            )),
            429 => WorkbenchError::Registry(format!(
                "Rate limited during {}: {}",
                operation, error_text
            )),
            500 => WorkbenchError::Registry(format!(
                "Registry server error during {}: {}",
                operation, error_text
            )),
            502 | 503 => WorkbenchError::Registry(format!(
                "Registry unavailable for {}: {}",
                operation, error_text
            )),
            _ => WorkbenchError::Registry(format!(
                "{} failed (status {}): {}",
                operation, status, error_text
            )),
        }
    }

    /// Handle token endpoint errors
    pub fn handle_auth_error(status: StatusCode, error_text: &str) -> WorkbenchError {
        let error_msg = match status.as_u16() {
            400 => "Invalid token request parameters".to_string(),
            401 => "Invalid credentials provided".to_string(),
            403 => "Access denied - insufficient permissions".to_string(),
            404 => "Authentication endpoint not found".to_string(),
            _ => format!("Authentication failed (status {}): {}", status, error_text),
        };

        WorkbenchError::Auth(error_msg)
    }

    /// Whether a response reports a capability gap rather than a failure
    pub fn is_unsupported_response(status: StatusCode, error_text: &str) -> bool {
        status == StatusCode::METHOD_NOT_ALLOWED || error_text.contains("\"UNSUPPORTED\"")
    }
}

/// Network error categorization and handling
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Categorize and format network errors with helpful context
    pub fn handle_network_error(error: &reqwest::Error, context: &str) -> WorkbenchError {
        if error.is_timeout() {
            WorkbenchError::Network(format!("{} timed out: {}", context, error))
        } else if error.is_connect() {
            WorkbenchError::Network(format!("Connection error during {}: {}", context, error))
        } else if error.to_string().contains("dns") {
            WorkbenchError::Network(format!("DNS resolution error for {}: {}", context, error))
        } else if error.to_string().contains("certificate") {
            WorkbenchError::Network(format!(
                "TLS certificate error during {}: {}",
                context, error
            ))
        } else {
            WorkbenchError::Network(format!("{} network error: {}", context, error))
        }
    }
}

/// Validation error utilities
pub struct ValidationErrorHandler;

impl ValidationErrorHandler {
    /// Registry base URLs must carry an explicit scheme
    pub fn validate_base_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(WorkbenchError::Validation(
                "Registry base URL cannot be empty".to_string(),
            ));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(WorkbenchError::Validation(format!(
                "Registry base URL must start with http:// or https://: {}",
                url
            )));
        }

        Ok(())
    }

    /// Standard numeric range validation
    pub fn validate_timeout(timeout: u64) -> Result<()> {
        if timeout == 0 {
            return Err(WorkbenchError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if timeout > 86400 {
            return Err(WorkbenchError::Validation(
                "Timeout cannot exceed 24 hours (86400 seconds)".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_status_mapping() {
        let err = HttpErrorHandler::handle_registry_error(StatusCode::METHOD_NOT_ALLOWED, "", "delete");
        assert!(err.is_unsupported());

        let body = r#"{"errors":[{"code":"UNSUPPORTED","message":"The operation is unsupported."}]}"#;
        let err = HttpErrorHandler::handle_registry_error(StatusCode::BAD_REQUEST, body, "delete");
        assert!(err.is_unsupported());

        let err = HttpErrorHandler::handle_registry_error(StatusCode::NOT_FOUND, "nope", "digest");
        assert!(matches!(err, WorkbenchError::NotFound(_)));

        let err = HttpErrorHandler::handle_registry_error(StatusCode::UNAUTHORIZED, "", "tags");
        assert!(matches!(err, WorkbenchError::Auth(_)));
    }

    #[test]
    fn test_validate_base_url() {
        assert!(ValidationErrorHandler::validate_base_url("https://mcr.microsoft.com/v2").is_ok());
        assert!(ValidationErrorHandler::validate_base_url("mcr.microsoft.com").is_err());
        assert!(ValidationErrorHandler::validate_base_url("").is_err());
    }

    #[test]
    fn test_validate_timeout() {
        assert!(ValidationErrorHandler::validate_timeout(30).is_ok());
        assert!(ValidationErrorHandler::validate_timeout(0).is_err());
        assert!(ValidationErrorHandler::validate_timeout(86401).is_err());
    }
}
