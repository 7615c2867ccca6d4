use crate::models::{Identified, Validate};
use serde::{Deserialize, Serialize};

/// Peer-discovery tracker registered with the server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: u64,
    pub url: String,
}

impl Identified for Tracker {
    fn id(&self) -> u64 {
        self.id
    }
}

impl Validate for Tracker {
    fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err(format!("tracker {} has an empty url", self.id));
        }
        Ok(())
    }
}
