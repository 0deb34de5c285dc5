//! Payload marshaling for wire messages

use crate::{CrtkError, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Payload encoding used on every topic of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    Json,
    Cbor,
}

impl Codec {
    pub fn encode<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>> {
        match self {
            Codec::Json => serde_json::to_vec(msg).map_err(|e| CrtkError::Encode(e.to_string())),
            Codec::Cbor => serde_cbor::to_vec(msg).map_err(|e| CrtkError::Encode(e.to_string())),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T> {
        match self {
            Codec::Json => {
                serde_json::from_slice(payload).map_err(|e| CrtkError::Decode(e.to_string()))
            }
            Codec::Cbor => {
                serde_cbor::from_slice(payload).map_err(|e| CrtkError::Decode(e.to_string()))
            }
        }
    }
}
