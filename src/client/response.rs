//! Response decoding and error translation.

use serde::de::DeserializeOwned;
use std::io::Read;

use crate::errors::{BridgeError, BridgeResult};
use crate::transport::{HttpResponse, ResponseBody, TransportError};
use crate::types::results::ErrorCarrier;

/// Decodes a response body as JSON, or as MessagePack when `binary` is set.
pub fn decode<T: DeserializeOwned>(reader: impl Read, binary: bool) -> BridgeResult<T> {
    if binary {
        Ok(rmp_serde::from_read(reader)?)
    } else {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Resolves a raw response by status code.
///
/// A 200 hands the body back unread. Anything else drains and closes the
/// body and becomes [`BridgeError::RequestFailed`]; `T` is the payload type
/// expected on success and is used to look for an embedded error message.
pub fn translate<T>(response: HttpResponse, binary: bool) -> BridgeResult<ResponseBody>
where
    T: DeserializeOwned + ErrorCarrier,
{
    if response.is_success() {
        return Ok(response.body);
    }

    let HttpResponse {
        status,
        status_line,
        body,
        ..
    } = response;
    let bytes = body.drain().map_err(|e| TransportError::InvalidResponse {
        message: e.to_string(),
    })?;

    Err(error_status::<T>(status, status_line, &bytes, binary))
}

/// Builds the error for a non-200 response from its drained body.
pub fn error_status<T>(status: u16, status_line: String, bytes: &[u8], binary: bool) -> BridgeError
where
    T: DeserializeOwned + ErrorCarrier,
{
    let embedded = match decode::<T>(bytes, binary) {
        Ok(decoded) => decoded
            .errors()
            .filter(|errors| !errors.trim().is_empty())
            .map(|errors| format!(", {errors}")),
        Err(err) => {
            tracing::warn!(status, error = %err, "Unable to parse error from response");
            None
        }
    };

    let detail = embedded
        .unwrap_or_else(|| format!("\nbody:\n{}", String::from_utf8_lossy(bytes)));

    BridgeError::RequestFailed {
        status,
        status_line,
        detail,
    }
}
