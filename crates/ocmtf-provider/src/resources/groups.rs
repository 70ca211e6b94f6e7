//! Access groups of a cluster. Read only: there is nothing to create,
//! update or delete, so this is not a [`crate::ResourceKind`].

use ocmtf_core::models::Group;
use ocmtf_core::{paths, Attr};
use serde::{Deserialize, Serialize};

use super::check_cluster_id;
use crate::diag::{Diagnostics, Response};
use crate::error::ProviderError;
use crate::resource::OcmContext;

pub const TYPE_NAME: &str = "groups";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupsState {
    #[serde(default)]
    pub cluster: Attr<String>,
    #[serde(default)]
    pub items: Attr<Vec<GroupItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupItem {
    pub id: String,
    pub name: String,
}

pub struct Groups {
    ctx: OcmContext,
}

impl Groups {
    pub fn new(ctx: OcmContext) -> Self {
        Self { ctx }
    }

    /// List the groups of `query.cluster` into `query.items`.
    pub async fn read(&self, query: GroupsState) -> Response<GroupsState> {
        let mut diags = Diagnostics::new();
        if let Err(v) = check_cluster_id(&query.cluster) {
            diags.add_error(v.summary, format!("Attribute cluster {}", v.detail));
            return Response::failed(diags);
        }
        match self.list(&query.cluster).await {
            Ok(items) => Response::set(
                GroupsState {
                    items: Attr::Known(items),
                    ..query
                },
                diags,
            ),
            Err(e) => {
                diags.add_provider_error("Failed to list groups", &e);
                Response::failed(diags)
            }
        }
    }

    async fn list(&self, cluster: &Attr<String>) -> Result<Vec<GroupItem>, ProviderError> {
        let cluster = cluster.require("cluster")?;
        let groups: Vec<Group> = self
            .ctx
            .client
            .list_all(&paths::groups(cluster))
            .await
            .map_err(|e| {
                ProviderError::ReadFailed(format!("Can't list groups of cluster '{cluster}': {e}"))
            })?;
        tracing::debug!(cluster = %cluster, count = groups.len(), "listed groups");
        // Groups have no display name of their own; the id doubles as one.
        Ok(groups
            .into_iter()
            .filter_map(|g| g.id)
            .map(|id| GroupItem {
                name: id.clone(),
                id,
            })
            .collect())
    }
}
