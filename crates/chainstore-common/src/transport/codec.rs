use bytes::Bytes;
use serde_json::Value;

use crate::protocol::error::{GatewayError, Result};
use crate::protocol::jsonrpc::{JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use crate::protocol::{RequestId, RpcOutcome, RpcRequest, RpcResponse};

/// JSON-RPC 2.0 codec.
///
/// Encoding is pure: the same `(method, params, id)` always produces the
/// same bytes. `serde_json` orders object keys inside params
/// deterministically and the envelope fields are emitted in declaration
/// order.
///
/// # Example
///
/// ```
/// use chainstore_common::transport::RpcCodec;
///
/// let bytes = RpcCodec::encode("eth_blockNumber", &[], 1).unwrap();
/// assert_eq!(
///     &bytes[..],
///     br#"{"jsonrpc":"2.0","method":"eth_blockNumber","params":[],"id":1}"#
/// );
///
/// let response = RpcCodec::decode(br#"{"jsonrpc":"2.0","result":"0x10","id":1}"#).unwrap();
/// assert_eq!(response.id, 1);
/// ```
pub struct RpcCodec;

impl RpcCodec {
    /// Encodes one request envelope.
    pub fn encode(method: &str, params: &[Value], id: RequestId) -> Result<Bytes> {
        let envelope = JsonRpcRequest::new(method, params, id);
        serde_json::to_vec(&envelope)
            .map(Bytes::from)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))
    }

    /// Encodes several requests as one JSON-RPC batch array.
    pub fn encode_batch(requests: &[RpcRequest]) -> Result<Bytes> {
        let envelopes: Vec<_> = requests
            .iter()
            .map(|r| JsonRpcRequest::new(&r.method, &r.params, r.id))
            .collect();
        serde_json::to_vec(&envelopes)
            .map(Bytes::from)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))
    }

    /// Decodes and validates one response envelope.
    ///
    /// # Errors
    ///
    /// - `MalformedResponse` if the bytes are not JSON, the version is not
    ///   `"2.0"`, the id is missing or not an integer, or the envelope has
    ///   both or neither of `result` and `error`.
    /// - `Protocol` if the server answered with an error object it could not
    ///   attach to any id (it failed to parse the request).
    pub fn decode(data: &[u8]) -> Result<RpcResponse> {
        let raw: JsonRpcResponse = serde_json::from_slice(data)?;
        Self::validate(raw)
    }

    /// Decodes a batch answer.
    ///
    /// Entries that fail validation cannot be correlated; they are logged
    /// and skipped. A single error object in place of the array means the
    /// server rejected the whole batch.
    pub fn decode_batch(data: &[u8]) -> Result<Vec<RpcResponse>> {
        let value: Value = serde_json::from_slice(data)?;
        let entries = match value {
            Value::Array(entries) => entries,
            Value::Object(_) => {
                let raw: JsonRpcResponse = serde_json::from_value(value)?;
                return match Self::validate(raw)? {
                    RpcResponse {
                        outcome: RpcOutcome::Error(err),
                        ..
                    } => Err(GatewayError::Protocol {
                        code: err.code,
                        message: err.message,
                    }),
                    RpcResponse { id, .. } => Err(GatewayError::MalformedResponse(format!(
                        "expected batch array, got single response for id {id}"
                    ))),
                };
            }
            other => {
                return Err(GatewayError::MalformedResponse(format!(
                    "expected batch array, got {other}"
                )))
            }
        };

        let mut responses = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<JsonRpcResponse>(entry)
                .map_err(GatewayError::from)
                .and_then(Self::validate)
            {
                Ok(response) => responses.push(response),
                Err(e) => tracing::warn!(error = %e, "Discarding invalid batch entry"),
            }
        }
        Ok(responses)
    }

    fn validate(raw: JsonRpcResponse) -> Result<RpcResponse> {
        if raw.jsonrpc != JSONRPC_VERSION {
            return Err(GatewayError::MalformedResponse(format!(
                "unsupported jsonrpc version {:?}",
                raw.jsonrpc
            )));
        }

        let outcome = match (raw.result, raw.error) {
            (Some(result), None) => RpcOutcome::Result(result),
            (None, Some(error)) => RpcOutcome::Error(error),
            (Some(_), Some(_)) => {
                return Err(GatewayError::MalformedResponse(
                    "response carries both result and error".into(),
                ))
            }
            (None, None) => {
                return Err(GatewayError::MalformedResponse(
                    "response carries neither result nor error".into(),
                ))
            }
        };

        match (raw.id.as_u64(), outcome) {
            (Some(id), outcome) => Ok(RpcResponse::new(id, outcome)),
            (None, RpcOutcome::Error(err)) if raw.id.is_null() => Err(GatewayError::Protocol {
                code: err.code,
                message: err.message,
            }),
            (None, _) => Err(GatewayError::MalformedResponse(format!(
                "missing or non-integer id: {}",
                raw.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::JsonRpcError;
    use serde_json::json;

    #[test]
    fn test_encode_is_deterministic() {
        let params = vec![
            json!({"to": "0xabc", "data": "0x00", "from": "0xdef"}),
            json!("latest"),
        ];
        let a = RpcCodec::encode("eth_call", &params, 42).unwrap();
        let b = RpcCodec::encode("eth_call", &params, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_sorts_param_object_keys() {
        let a = RpcCodec::encode("m", &[json!({"b": 1, "a": 2})], 1).unwrap();
        let b = RpcCodec::encode("m", &[json!({"a": 2, "b": 1})], 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_batch_shape() {
        let requests = vec![
            RpcRequest::new(1, "eth_blockNumber", vec![]),
            RpcRequest::new(2, "eth_gasPrice", vec![]),
        ];
        let bytes = RpcCodec::encode_batch(&requests).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            json!([
                {"jsonrpc": "2.0", "method": "eth_blockNumber", "params": [], "id": 1},
                {"jsonrpc": "2.0", "method": "eth_gasPrice", "params": [], "id": 2},
            ])
        );
    }

    #[test]
    fn test_decode_success() {
        let response = RpcCodec::decode(br#"{"jsonrpc":"2.0","result":"0x10","id":5}"#).unwrap();
        assert_eq!(response, RpcResponse::new(5, RpcOutcome::Result(json!("0x10"))));
    }

    #[test]
    fn test_decode_error_object() {
        let response = RpcCodec::decode(
            br#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":5}"#,
        )
        .unwrap();
        assert_eq!(response.id, 5);
        assert_eq!(
            response.into_result().unwrap_err(),
            GatewayError::Protocol {
                code: -32601,
                message: "Method not found".into()
            }
        );
    }

    #[test]
    fn test_decode_uncorrelated_error_is_protocol_error() {
        let err = RpcCodec::decode(
            br#"{"jsonrpc":"2.0","error":{"code":-32700,"message":"Parse error"},"id":null}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            GatewayError::Protocol {
                code: -32700,
                message: "Parse error".into()
            }
        );
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let cases: &[&[u8]] = &[
            b"",
            b"not json",
            b"[]",
            br#"{"jsonrpc":"1.0","result":1,"id":1}"#,
            br#"{"jsonrpc":"2.0","id":1}"#,
            br#"{"jsonrpc":"2.0","result":1,"error":{"code":1,"message":"x"},"id":1}"#,
            br#"{"jsonrpc":"2.0","result":1}"#,
            br#"{"jsonrpc":"2.0","result":1,"id":"abc"}"#,
            br#"{"jsonrpc":"2.0","result":1,"id":-3}"#,
        ];
        for case in cases {
            let err = RpcCodec::decode(case).unwrap_err();
            assert!(
                matches!(err, GatewayError::MalformedResponse(_)),
                "{:?} gave {err:?}",
                String::from_utf8_lossy(case)
            );
        }
    }

    #[test]
    fn test_decode_batch_skips_invalid_entries() {
        let body = json!([
            {"jsonrpc": "2.0", "result": "0x3b9aca00", "id": 2},
            {"jsonrpc": "2.0", "id": 7},
            {"jsonrpc": "2.0", "result": "0x10", "id": 1},
        ]);
        let responses = RpcCodec::decode_batch(&serde_json::to_vec(&body).unwrap()).unwrap();
        let ids: Vec<_> = responses.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_decode_batch_whole_batch_rejected() {
        let body = JsonRpcResponse::error(Value::Null, JsonRpcError::invalid_request());
        let err = RpcCodec::decode_batch(&serde_json::to_vec(&body).unwrap()).unwrap_err();
        assert!(matches!(err, GatewayError::Protocol { code: -32600, .. }));
    }

    #[test]
    fn test_decode_batch_rejects_scalar() {
        let err = RpcCodec::decode_batch(b"42").unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse(_)));
    }
}
