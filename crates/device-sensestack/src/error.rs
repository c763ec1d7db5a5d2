use thiserror::Error;

/// Errors surfaced by the discovery and status pipeline.
///
/// Parse failures on individual datagrams are absorbed during a discovery
/// run; the hard variants only propagate from targeted calls where the
/// caller already trusts the address.
#[derive(Debug, Error)]
pub enum Error {
    /// A discovery datagram could not be parsed as an HTTP-style response
    /// carrying the required headers.
    #[error("malformed discovery response: {0}")]
    MalformedResponse(&'static str),

    /// The status payload of a confirmed node failed to decode.
    #[error("invalid node status payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    /// A targeted status fetch answered with an unexpected HTTP status.
    #[error("unexpected HTTP status {0} from node")]
    Status(reqwest::StatusCode),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
