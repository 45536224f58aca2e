//! Wire types for the admin server's config endpoints.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{SyncError, SyncResult};
use crate::model::{ConfigGroup, ConfigSnapshot};

/// Envelope code the admin server uses for success.
pub const CODE_SUCCESS: i64 = 200;

/// Response envelope shared by both config endpoints.
#[derive(Debug, Deserialize)]
pub struct AdminResponse<T> {
    pub code: i64,

    #[serde(default)]
    pub message: String,

    pub data: Option<T>,
}

impl<T> AdminResponse<T> {
    /// Unwrap the payload, turning a non-success code into a protocol error.
    pub fn into_data(self) -> SyncResult<T> {
        if self.code != CODE_SUCCESS {
            return Err(SyncError::Protocol {
                code: self.code,
                message: self.message,
            });
        }
        self.data.ok_or_else(|| SyncError::malformed("missing data field"))
    }
}

/// One group's entry in a fetch response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigData {
    pub md5: String,

    pub last_modify_time: i64,

    /// Opaque configuration records. Absent means an empty data set.
    #[serde(default)]
    pub data: Vec<Value>,
}

impl ConfigData {
    /// Convert a wire entry into an immutable snapshot for `group`.
    pub fn into_snapshot(self, group: ConfigGroup) -> ConfigSnapshot {
        ConfigSnapshot {
            group,
            items: self.data,
            last_modify_time: self.last_modify_time,
            digest: self.md5,
        }
    }
}
