use std::time::Duration;

use ocmtf_core::models::{Cluster, ClusterState};
use ocmtf_core::paths;
use tokio::time::Instant;

use crate::client::OcmClient;
use crate::error::OcmError;

/// Polls a cluster until it reaches a state dependent operations can use.
#[derive(Debug, Clone)]
pub struct ClusterWait {
    client: OcmClient,
    poll_interval: Duration,
}

impl ClusterWait {
    pub fn new(client: OcmClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Wait until the cluster reports `ready`.
    ///
    /// Fails immediately when the cluster does not exist or is in `error` /
    /// `uninstalling`; fails with [`OcmError::Timeout`] once `timeout` has
    /// elapsed. The cluster is always fetched at least once.
    pub async fn wait_for_ready(
        &self,
        cluster_id: &str,
        timeout: Duration,
    ) -> Result<Cluster, OcmError> {
        let started = Instant::now();
        loop {
            let cluster: Cluster = self.client.get(&paths::cluster(cluster_id)).await?;
            match &cluster.state {
                Some(ClusterState::Ready) => {
                    tracing::debug!(cluster = %cluster_id, "cluster is ready");
                    return Ok(cluster);
                }
                Some(state @ (ClusterState::Error | ClusterState::Uninstalling)) => {
                    return Err(OcmError::ClusterState {
                        cluster_id: cluster_id.to_string(),
                        state: state.clone(),
                    });
                }
                state => {
                    tracing::debug!(
                        cluster = %cluster_id,
                        state = ?state,
                        "cluster not ready yet"
                    );
                }
            }

            if started.elapsed() + self.poll_interval > timeout {
                return Err(OcmError::Timeout {
                    cluster_id: cluster_id.to_string(),
                    target: "ready",
                    waited: started.elapsed(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Wait until fetching the cluster returns 404.
    pub async fn wait_for_deletion(
        &self,
        cluster_id: &str,
        timeout: Duration,
    ) -> Result<(), OcmError> {
        let started = Instant::now();
        loop {
            match self.client.get::<Cluster>(&paths::cluster(cluster_id)).await {
                Err(e) if e.is_not_found() => {
                    tracing::debug!(cluster = %cluster_id, "cluster is gone");
                    return Ok(());
                }
                Err(e) => return Err(e),
                Ok(cluster) => {
                    tracing::debug!(
                        cluster = %cluster_id,
                        state = ?cluster.state,
                        "cluster still present"
                    );
                }
            }

            if started.elapsed() + self.poll_interval > timeout {
                return Err(OcmError::Timeout {
                    cluster_id: cluster_id.to_string(),
                    target: "deleted",
                    waited: started.elapsed(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
