//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
///
/// When you see a `ProtocolError`, the problem is in (de)serialization,
/// not in networking or session bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: malformed JSON, a missing `type` tag, or a `move`
    /// request without its `move` field.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
