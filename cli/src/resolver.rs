use std::collections::HashSet;
use tracing::{debug, info};

use crate::api_types::{Cluster, ClusterId, Domain, PageOf};
use crate::error::{LookupKind, Result, StretchError};
use crate::http_client::RemoteApi;

pub const DOMAINS_PATH: &str = "/v1/domains";
pub const CLUSTERS_PATH: &str = "/v1/clusters";

/// Resolve a cluster id from its workload domain name and cluster name.
///
/// The API has no direct name lookup, so this joins the domain's cluster refs
/// against the global cluster list. Cluster names may repeat across domains;
/// only ids owned by the named domain are considered and the first match wins.
pub async fn resolve_cluster(
    api: &dyn RemoteApi,
    domain_name: &str,
    cluster_name: &str,
) -> Result<ClusterId> {
    let domains: PageOf<Domain> = decode(DOMAINS_PATH, api.get(DOMAINS_PATH).await?)?;
    let domain = domains
        .elements
        .into_iter()
        .find(|d| d.name == domain_name)
        .ok_or_else(|| StretchError::NotFound {
            kind: LookupKind::Domain,
            name: domain_name.to_string(),
            scope: None,
        })?;
    let owned: HashSet<String> = domain.clusters.into_iter().map(|c| c.id).collect();
    debug!(domain = domain_name, clusters = owned.len(), "domain found");

    let clusters: PageOf<Cluster> = decode(CLUSTERS_PATH, api.get(CLUSTERS_PATH).await?)?;
    let cluster = clusters
        .elements
        .into_iter()
        .find(|c| c.name == cluster_name && owned.contains(&c.id))
        .ok_or_else(|| StretchError::NotFound {
            kind: LookupKind::Cluster,
            name: cluster_name.to_string(),
            scope: Some(domain_name.to_string()),
        })?;

    info!(domain = domain_name, cluster = cluster_name, id = %cluster.id, "cluster resolved");
    Ok(ClusterId::new(cluster.id))
}

fn decode<T: serde::de::DeserializeOwned>(path: &str, v: serde_json::Value) -> Result<T> {
    serde_json::from_value(v).map_err(|e| StretchError::UnexpectedResponse {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedApi;
    use serde_json::json;

    fn domains() -> serde_json::Value {
        json!({"elements": [
            {"id": "d-0", "name": "mgmt", "clusters": [{"id": "C"}]},
            {"id": "d-1", "name": "D1", "clusters": [{"id": "A"}, {"id": "B"}]}
        ]})
    }

    #[tokio::test]
    async fn picks_the_cluster_owned_by_the_domain() {
        let api = ScriptedApi::new()
            .respond("GET", DOMAINS_PATH, domains())
            .respond(
                "GET",
                CLUSTERS_PATH,
                json!({"elements": [
                    {"id": "C", "name": "C1"},
                    {"id": "A", "name": "C1"}
                ]}),
            );

        let id = resolve_cluster(&api, "D1", "C1").await.expect("resolve");
        assert_eq!(id, ClusterId::new("A"));
    }

    #[tokio::test]
    async fn unknown_domain_fails_before_listing_clusters() {
        let api = ScriptedApi::new().respond("GET", DOMAINS_PATH, domains());

        let err = resolve_cluster(&api, "nope", "C1")
            .await
            .expect_err("unknown domain");
        assert!(matches!(
            err,
            StretchError::NotFound {
                kind: LookupKind::Domain,
                ..
            }
        ));
        assert_eq!(api.calls(), vec![("GET".to_string(), DOMAINS_PATH.to_string())]);
    }

    #[tokio::test]
    async fn cluster_in_another_domain_is_not_found() {
        let api = ScriptedApi::new()
            .respond("GET", DOMAINS_PATH, domains())
            .respond(
                "GET",
                CLUSTERS_PATH,
                json!({"elements": [{"id": "C", "name": "C1"}]}),
            );

        let err = resolve_cluster(&api, "D1", "C1")
            .await
            .expect_err("cluster outside domain");
        assert_eq!(err.to_string(), "cluster 'C1' not found in domain 'D1'");
    }

    #[tokio::test]
    async fn malformed_listing_is_reported() {
        let api = ScriptedApi::new().respond("GET", DOMAINS_PATH, json!({"elements": [{"id": 7}]}));

        let err = resolve_cluster(&api, "D1", "C1")
            .await
            .expect_err("bad payload");
        assert!(matches!(err, StretchError::UnexpectedResponse { .. }));
    }
}
