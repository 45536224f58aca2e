//! One-shot full fetch of configuration groups.

use std::collections::HashMap;

use crate::error::{SyncError, SyncResult};
use crate::http::types::{AdminResponse, ConfigData};
use crate::model::{ConfigGroup, ConfigSnapshot};

/// Fetches the full data set for a set of groups from the admin server.
///
/// Pure read: carries no state beyond the shared HTTP client, and never
/// touches the digest cache. Groups absent from the response mean "no
/// change" and are simply not present in the returned map.
#[derive(Clone)]
pub struct ConfigFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl ConfigFetcher {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Fetch full snapshots for `groups`.
    ///
    /// Fails with `Transport` on connection or timeout failure, `Protocol`
    /// on a malformed or error-coded response body. The shared client's
    /// connect and request timeouts bound the call; a server that accepts
    /// the connection and then stalls cannot hang the caller.
    pub async fn fetch(
        &self,
        groups: &[ConfigGroup],
    ) -> SyncResult<HashMap<ConfigGroup, ConfigSnapshot>> {
        let url = super::endpoint(&self.base_url, "/configs/fetch");
        let query: Vec<(&str, &str)> = groups
            .iter()
            .map(|group| ("groupKeys", group.wire_name()))
            .collect();

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(SyncError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Protocol {
                code: status.as_u16() as i64,
                message: format!("fetch returned HTTP {}", status),
            });
        }

        let envelope: AdminResponse<HashMap<String, ConfigData>> =
            response.json().await.map_err(SyncError::malformed)?;
        let data = envelope.into_data()?;

        let mut snapshots = HashMap::with_capacity(data.len());
        for (name, entry) in data {
            match ConfigGroup::from_wire(&name) {
                Some(group) => {
                    snapshots.insert(group, entry.into_snapshot(group));
                }
                None => {
                    tracing::warn!(group = %name, "fetch response contains unknown group, skipping");
                }
            }
        }
        Ok(snapshots)
    }
}
