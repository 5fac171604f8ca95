//! Payload and envelope codec.
//!
//! Every payload and the envelope itself pass through a [`Codec`]. Decode
//! failures are values — they never propagate as panics or thrown errors
//! across the dispatcher boundary, which substitutes a synthesized envelope
//! instead.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Turns typed values into wire strings and back.
pub trait Codec {
    /// Encodes a value to its wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] when the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, CodecError>;

    /// Decodes a wire string into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] when the text is not a well-formed
    /// representation of the requested type.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError>;
}

/// Errors raised by a [`Codec`].
///
/// Carries the underlying message rather than a codec-specific error type so
/// alternative codecs share one error surface.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value could not be encoded.
    #[error("failed to encode payload: {0}")]
    Encode(String),
    /// The text could not be decoded into the requested type.
    #[error("failed to decode payload: {0}")]
    Decode(String),
}

/// JSON codec used by the production wire format.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|error| CodecError::Encode(error.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError> {
        serde_json::from_str(text).map_err(|error| CodecError::Decode(error.to_string()))
    }
}
