//! Typed representations of the API payloads.
//!
//! Every response body passes through [`decode`], which deserializes and then
//! checks the payload's invariants. Anything that fails either step becomes a
//! [`ClientError::Parse`].

pub mod settings;
pub mod torrent;
pub mod tracker;

use crate::core::error::{ClientError, ClientResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

pub use settings::{ServerInfo, SettingUpdate, Settings};
pub use torrent::{Torrent, TorrentFile, TorrentMetrics, TorrentState};
pub use tracker::Tracker;

/// Post-deserialization invariant check
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Entities keyed by their server-assigned id in collection responses
pub trait Identified {
    fn id(&self) -> u64;
}

impl<T: Validate + Identified> Validate for BTreeMap<u64, T> {
    fn validate(&self) -> Result<(), String> {
        for (key, item) in self {
            if *key != item.id() {
                return Err(format!("entry keyed {} carries id {}", key, item.id()));
            }
            item.validate().map_err(|e| format!("entry {}: {}", key, e))?;
        }
        Ok(())
    }
}

/// Deserialize and validate a response body
pub fn decode<T: DeserializeOwned + Validate>(bytes: &[u8]) -> ClientResult<T> {
    let value: T = serde_json::from_slice(bytes).map_err(|e| ClientError::parse(e.to_string()))?;
    value.validate().map_err(ClientError::Parse)?;
    Ok(value)
}

/// The server encodes empty slices as `null`
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
