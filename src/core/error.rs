// Centralized error handling for the client

use thiserror::Error;

/// Errors produced by requests against the remote torrent API
#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected locally before any request was sent
    #[error("{0}")]
    Validation(String),

    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Malformed API payload: {0}")]
    Parse(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Message shown to the user for this error
    pub fn display_message(&self) -> String {
        match self {
            ClientError::Validation(message) => message.clone(),
            ClientError::Api { message, .. } => format_api_message(message),
            ClientError::Connection(_) => "Connection error! API offline?".to_string(),
            ClientError::Parse(_) => "Unexpected response from API!".to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, ClientError::Connection(_))
    }
}

/// Capitalizes the first character of a server error message and appends `!`.
pub fn format_api_message(message: &str) -> String {
    let trimmed = message.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => format!("{}{}!", first.to_uppercase(), chars.as_str()),
        None => "Unknown error!".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_api_message() {
        assert_eq!(format_api_message("peer invalid"), "Peer invalid!");
        assert_eq!(format_api_message("Already capitalized"), "Already capitalized!");
        assert_eq!(format_api_message("  torrent must be running to cancel it "), "Torrent must be running to cancel it!");
    }

    #[test]
    fn test_format_api_message_empty() {
        assert_eq!(format_api_message(""), "Unknown error!");
        assert_eq!(format_api_message("   "), "Unknown error!");
    }

    #[test]
    fn test_format_api_message_non_ascii() {
        assert_eq!(format_api_message("ärger"), "Ärger!");
    }

    #[test]
    fn test_display_message_per_variant() {
        let api = ClientError::Api { status: 400, message: "peer invalid".to_string() };
        assert_eq!(api.display_message(), "Peer invalid!");

        let validation = ClientError::validation("Torrent file needs to be selected!");
        assert_eq!(validation.display_message(), "Torrent file needs to be selected!");
        assert!(validation.is_validation());

        let connection = ClientError::Connection("tcp connect error".to_string());
        assert_eq!(connection.display_message(), "Connection error! API offline?");
        assert!(connection.is_connection());

        let parse = ClientError::parse("expected value at line 1");
        assert_eq!(parse.display_message(), "Unexpected response from API!");
    }
}
