//! MessagePack framing for requests and responses.
//!
//! The transport moves opaque byte frames; these helpers are the only place
//! that knows how a [`Request`] or [`Response`] becomes bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::command::Request;
use crate::error::Error;
use crate::output::Response;

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    rmp_serde::to_vec(value).map_err(|e| Error::Serialization {
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::Serialization {
        reason: e.to_string(),
    })
}

/// Encode a request frame.
pub fn encode_request(request: &Request) -> Result<Vec<u8>, Error> {
    encode(request)
}

/// Decode a request frame.
pub fn decode_request(bytes: &[u8]) -> Result<Request, Error> {
    decode(bytes)
}

/// Encode a response frame.
pub fn encode_response(response: &Response) -> Result<Vec<u8>, Error> {
    encode(response)
}

/// Decode a response frame.
pub fn decode_response(bytes: &[u8]) -> Result<Response, Error> {
    decode(bytes)
}
