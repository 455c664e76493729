//! Error types for the API client.

/// Errors that can occur when configuring the client or making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The connection configuration is incomplete or invalid.
    #[error("connection invalid: {0}")]
    InvalidConnection(String),
    /// The requested node name is not one of the known DIA deployments.
    #[error("unsupported node `{0}`")]
    UnsupportedNode(String),
    /// No table name was supplied for a request that requires one.
    #[error("no table specified for request")]
    MissingTable,
    /// An update was attempted without any recognized record identifier.
    #[error("update requires `key`, `{table}_KEY`, or (for supporter) `Email`")]
    MissingIdentifier {
        /// The table the update was aimed at.
        table: String,
    },
    /// The service rejected the supplied credentials.
    #[error("remote service rejected the login credentials")]
    InvalidLogin,
    /// An HTTP request failed (network error, timeout, or unreadable body).
    #[error("request failed")]
    RequestFailed,
    /// The service returned a non-success status with a body snippet.
    #[error("request failed with status {status}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated to a short snippet.
        body: String,
    },
    /// The raw request API was aimed at an endpoint the URL set lacks.
    #[error("endpoint `{0}` is not configured for this connection")]
    UnknownEndpoint(&'static str),
    /// The response body was not the XML shape this call expects.
    #[error("malformed response: {0}")]
    Parse(String),
}
