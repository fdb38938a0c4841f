//! JSON-RPC 2.0 envelope.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{BarryError, Result};

#[derive(Serialize)]
pub(crate) struct Request<'a> {
    id: u32,
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a [Value],
}

impl<'a> Request<'a> {
    pub const fn new(method: &'a str, params: &'a [Value]) -> Self {
        Self { id: 0, jsonrpc: "2.0", method, params }
    }
}

#[derive(Deserialize)]
pub(crate) struct Response {
    /// `None` when the key is absent, `Some(Value::Null)` for an explicit `null`.
    #[serde(default, deserialize_with = "Response::deserialize_present")]
    result: Option<Value>,
    error: Option<Value>,
}

impl Response {
    fn deserialize_present<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Value>, D::Error> {
        Value::deserialize(deserializer).map(Some)
    }

    /// Server-provided message of an error envelope.
    fn error_message(error: &Value) -> String {
        ["/data/message", "/message"]
            .into_iter()
            .find_map(|pointer| error.pointer(pointer).and_then(Value::as_str))
            .map_or_else(|| error.to_string(), str::to_owned)
    }
}

impl From<Response> for Result<Value> {
    fn from(response: Response) -> Self {
        match (response.error, response.result) {
            (Some(error), _) => Err(BarryError::Rpc(Response::error_message(&error))),
            (None, Some(result)) => Ok(result),
            (None, None) => {
                Err(BarryError::UnsupportedResponse("neither result nor error present".to_owned()))
            }
        }
    }
}
