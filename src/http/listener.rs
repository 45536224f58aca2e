//! Long-poll change detection against the admin server.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::error::{SyncError, SyncResult};
use crate::http::types::AdminResponse;
use crate::model::{ConfigGroup, GroupDigest};

/// Client-side grace on top of the server's long-poll window, so the server,
/// not the client, normally ends the poll.
const LISTEN_GRACE: Duration = Duration::from_secs(10);

/// Performs one blocking long-poll call reporting which groups changed.
#[derive(Clone)]
pub struct ChangeListener {
    client: reqwest::Client,
    base_url: String,
}

impl ChangeListener {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Block until a tracked group's content differs from the supplied
    /// digests or `timeout` elapses on the server side.
    ///
    /// An empty result is the normal "no change yet" outcome, not an error.
    /// Fails with `Transport` only if the connection itself breaks.
    pub async fn listen(
        &self,
        digests: &HashMap<ConfigGroup, GroupDigest>,
        timeout: Duration,
    ) -> SyncResult<HashSet<ConfigGroup>> {
        let url = super::endpoint(&self.base_url, "/configs/listener");
        let body: HashMap<&str, &GroupDigest> = digests
            .iter()
            .map(|(group, digest)| (group.wire_name(), digest))
            .collect();

        let response = self
            .client
            .post(&url)
            .timeout(timeout + LISTEN_GRACE)
            .json(&body)
            .send()
            .await
            .map_err(SyncError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Protocol {
                code: status.as_u16() as i64,
                message: format!("listener returned HTTP {}", status),
            });
        }

        let envelope: AdminResponse<Vec<String>> =
            response.json().await.map_err(SyncError::malformed)?;
        let names = envelope.into_data()?;

        let mut changed = HashSet::with_capacity(names.len());
        for name in names {
            match ConfigGroup::from_wire(&name) {
                Some(group) => {
                    changed.insert(group);
                }
                None => {
                    tracing::warn!(group = %name, "listener reported unknown group, skipping");
                }
            }
        }
        Ok(changed)
    }
}
