//! DigitalOcean API client
//!
//! Talks to the v2 REST API with Bearer token authentication, and to the
//! droplet metadata service for the local region.

use crate::error::{DigitalOceanError, Result};
use async_trait::async_trait;
use doflex_cloud::{
    ActionKind, ActionStatus, ComputeNode, RemoteAction, RemoteVolume, VolumeService,
};
use doflex_config::DriverSettings;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the host exposes attached DigitalOcean volumes
pub const DEVICE_PREFIX: &str = "/dev/disk/by-id/scsi-0DO_Volume_";

const DROPLETS_PER_PAGE: u32 = 200;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API token; only verbs that reach the API need one
    pub token: Option<String>,
    pub api_url: String,
    pub metadata_url: String,
    pub http_timeout: Duration,
}

impl ClientConfig {
    pub fn from_settings(token: Option<String>, settings: &DriverSettings) -> Self {
        Self {
            token,
            api_url: settings.api_url.clone(),
            metadata_url: settings.metadata_url.clone(),
            http_timeout: settings.http_timeout,
        }
    }
}

/// DigitalOcean volumes and droplets client
pub struct DigitalOceanClient {
    client: reqwest::Client,
    token: Option<String>,
    api_url: String,
    metadata_url: String,
}

impl DigitalOceanClient {
    /// Build the client; no request is made until an operation is called
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            client,
            token: config.token,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            metadata_url: config.metadata_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let token = self
            .token
            .as_deref()
            .ok_or(DigitalOceanError::MissingToken)?;
        let response = request.bearer_auth(token).send().await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    async fn fetch_volume(&self, volume_id: &str) -> Result<RemoteVolume> {
        let url = format!("{}/v2/volumes/{}", self.api_url, volume_id);
        tracing::debug!("Fetching volume {}", volume_id);

        let body: VolumeResponse = self.get_json(self.client.get(&url)).await?;
        Ok(body.volume.into())
    }

    async fn fetch_volumes_by_name(&self, name: &str, region: &str) -> Result<Vec<RemoteVolume>> {
        let url = format!("{}/v2/volumes", self.api_url);
        tracing::debug!("Looking up volume {} in region {}", name, region);

        let request = self
            .client
            .get(&url)
            .query(&[("name", name), ("region", region)]);
        let body: VolumesResponse = self.get_json(request).await?;
        Ok(body.volumes.into_iter().map(RemoteVolume::from).collect())
    }

    async fn fetch_droplet(&self, droplet_id: &str) -> Result<ComputeNode> {
        let url = format!("{}/v2/droplets/{}", self.api_url, droplet_id);
        tracing::debug!("Fetching droplet {}", droplet_id);

        let body: DropletResponse = self.get_json(self.client.get(&url)).await?;
        Ok(body.droplet.into())
    }

    async fn fetch_all_droplets(&self) -> Result<Vec<ComputeNode>> {
        let first_page = format!("{}/v2/droplets", self.api_url);
        let mut request = self.client.get(&first_page).query(&[
            ("page", "1".to_string()),
            ("per_page", DROPLETS_PER_PAGE.to_string()),
        ]);

        let mut droplets = Vec::new();
        let mut page = 1;
        loop {
            tracing::debug!("Listing droplets, page {}", page);
            let body: DropletsResponse = self.get_json(request).await?;
            droplets.extend(body.droplets.into_iter().map(ComputeNode::from));

            match body.links.pages.and_then(|p| p.next) {
                Some(next) => {
                    request = self.client.get(&next);
                    page += 1;
                }
                None => break,
            }
        }

        Ok(droplets)
    }

    async fn post_volume_action(
        &self,
        kind: ActionKind,
        volume_id: &str,
        droplet_id: &str,
    ) -> Result<RemoteAction> {
        let droplet_id: u64 = droplet_id
            .parse()
            .map_err(|_| DigitalOceanError::InvalidDropletId(droplet_id.to_string()))?;
        let url = format!("{}/v2/volumes/{}/actions", self.api_url, volume_id);
        tracing::info!("Requesting {} of volume {} on droplet {}", kind, volume_id, droplet_id);

        let request_body = VolumeActionRequest {
            r#type: kind.to_string(),
            droplet_id,
        };
        let body: ActionResponse = self
            .get_json(self.client.post(&url).json(&request_body))
            .await?;
        body.action.into_remote(volume_id)
    }

    async fn fetch_action(&self, volume_id: &str, action_id: &str) -> Result<RemoteAction> {
        let url = format!(
            "{}/v2/volumes/{}/actions/{}",
            self.api_url, volume_id, action_id
        );
        tracing::debug!("Fetching action {} of volume {}", action_id, volume_id);

        let body: ActionResponse = self.get_json(self.client.get(&url)).await?;
        body.action.into_remote(volume_id)
    }

    async fn fetch_region(&self) -> Result<String> {
        let url = format!("{}/region", self.metadata_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DigitalOceanError::Metadata(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DigitalOceanError::Metadata(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        let region = response.text().await?.trim().to_string();
        if region.is_empty() {
            return Err(DigitalOceanError::Metadata(format!(
                "GET {} returned an empty region",
                url
            )));
        }
        Ok(region)
    }
}

#[async_trait]
impl VolumeService for DigitalOceanClient {
    fn device_prefix(&self) -> &str {
        DEVICE_PREFIX
    }

    async fn get_volume(&self, volume_id: &str) -> doflex_cloud::Result<RemoteVolume> {
        Ok(self.fetch_volume(volume_id).await?)
    }

    async fn get_volume_by_name(
        &self,
        name: &str,
        region: &str,
    ) -> doflex_cloud::Result<RemoteVolume> {
        let mut volumes = self.fetch_volumes_by_name(name, region).await?;
        if volumes.len() != 1 {
            return Err(doflex_cloud::CloudError::AmbiguousVolume {
                name: name.to_string(),
                region: region.to_string(),
                found: volumes.len(),
            });
        }
        Ok(volumes.remove(0))
    }

    async fn get_compute_node(&self, node_id: &str) -> doflex_cloud::Result<ComputeNode> {
        Ok(self.fetch_droplet(node_id).await?)
    }

    async fn list_compute_nodes(&self) -> doflex_cloud::Result<Vec<ComputeNode>> {
        Ok(self.fetch_all_droplets().await?)
    }

    async fn request_attach(
        &self,
        volume_id: &str,
        node_id: &str,
    ) -> doflex_cloud::Result<RemoteAction> {
        Ok(self
            .post_volume_action(ActionKind::Attach, volume_id, node_id)
            .await?)
    }

    async fn request_detach(
        &self,
        volume_id: &str,
        node_id: &str,
    ) -> doflex_cloud::Result<RemoteAction> {
        Ok(self
            .post_volume_action(ActionKind::Detach, volume_id, node_id)
            .await?)
    }

    async fn get_action(
        &self,
        volume_id: &str,
        action_id: &str,
    ) -> doflex_cloud::Result<RemoteAction> {
        Ok(self.fetch_action(volume_id, action_id).await?)
    }

    async fn current_region(&self) -> doflex_cloud::Result<String> {
        Ok(self.fetch_region().await?)
    }
}

/// Turn a non-2xx response into an error carrying the API's id/message
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let api_error = serde_json::from_str::<ApiErrorBody>(&body).unwrap_or_else(|_| ApiErrorBody {
        id: String::new(),
        message: body.trim().to_string(),
    });
    let message = if api_error.message.is_empty() {
        format!("{} {}", status, url.path())
    } else {
        api_error.message
    };

    Err(match status.as_u16() {
        404 => DigitalOceanError::NotFound(message),
        401 | 403 => DigitalOceanError::Unauthorized(message),
        code => DigitalOceanError::Api {
            status: code,
            id: api_error.id,
            message,
        },
    })
}

// API request/response types

#[derive(Debug, Serialize)]
struct VolumeActionRequest {
    r#type: String,
    droplet_id: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    id: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct DropletsResponse {
    droplets: Vec<ApiDroplet>,
    #[serde(default)]
    links: ApiLinks,
}

#[derive(Debug, Default, Deserialize)]
struct ApiLinks {
    #[serde(default)]
    pages: Option<ApiPages>,
}

#[derive(Debug, Deserialize)]
struct ApiPages {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DropletResponse {
    droplet: ApiDroplet,
}

#[derive(Debug, Deserialize)]
struct ApiDroplet {
    id: u64,
    name: String,
    #[serde(default)]
    volume_ids: Vec<String>,
    #[serde(default)]
    networks: ApiNetworks,
}

#[derive(Debug, Default, Deserialize)]
struct ApiNetworks {
    #[serde(default)]
    v4: Vec<ApiNetworkV4>,
}

#[derive(Debug, Deserialize)]
struct ApiNetworkV4 {
    ip_address: String,
    r#type: String,
}

impl ApiDroplet {
    fn address(&self, kind: &str) -> Option<String> {
        self.networks
            .v4
            .iter()
            .find(|n| n.r#type == kind)
            .map(|n| n.ip_address.clone())
    }
}

impl From<ApiDroplet> for ComputeNode {
    fn from(droplet: ApiDroplet) -> Self {
        let private_ipv4 = droplet.address("private");
        let public_ipv4 = droplet.address("public");
        ComputeNode {
            id: droplet.id.to_string(),
            name: droplet.name,
            attached_volume_ids: droplet.volume_ids,
            private_ipv4,
            public_ipv4,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VolumeResponse {
    volume: ApiVolume,
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    volumes: Vec<ApiVolume>,
}

#[derive(Debug, Deserialize)]
struct ApiVolume {
    id: String,
    name: String,
    region: ApiRegion,
    #[serde(default)]
    droplet_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiRegion {
    slug: String,
}

impl From<ApiVolume> for RemoteVolume {
    fn from(volume: ApiVolume) -> Self {
        RemoteVolume {
            id: volume.id,
            name: volume.name,
            region: volume.region.slug,
            attached_node_ids: volume.droplet_ids.iter().map(u64::to_string).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActionResponse {
    action: ApiAction,
}

#[derive(Debug, Deserialize)]
struct ApiAction {
    id: u64,
    r#type: String,
    status: String,
    #[serde(default)]
    region_slug: Option<String>,
}

impl ApiAction {
    fn into_remote(self, volume_id: &str) -> Result<RemoteAction> {
        let kind = match self.r#type.as_str() {
            "attach" | "attach_volume" => ActionKind::Attach,
            "detach" | "detach_volume" => ActionKind::Detach,
            _ => return Err(DigitalOceanError::UnexpectedActionType(self.r#type)),
        };

        let mut description = format!("{} action {} on volume {}", kind, self.id, volume_id);
        if let Some(region) = self.region_slug {
            description.push_str(&format!(" in {}", region));
        }
        description.push_str(&format!(" is {}", self.status));

        Ok(RemoteAction {
            id: self.id.to_string(),
            kind,
            status: ActionStatus::from(self.status),
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doflex_cloud::CloudError;
    use mockito::Matcher;

    const TOKEN: &str = "test-token";

    fn client(server: &mockito::Server) -> DigitalOceanClient {
        DigitalOceanClient::new(ClientConfig {
            token: Some(TOKEN.to_string()),
            api_url: server.url(),
            metadata_url: format!("{}/metadata/v1", server.url()),
            http_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn droplet_json(id: u64, name: &str, private: &str, public: &str) -> String {
        format!(
            r#"{{"id":{id},"name":"{name}","volume_ids":[],"networks":{{"v4":[
                {{"ip_address":"{private}","type":"private"}},
                {{"ip_address":"{public}","type":"public"}}]}}}}"#
        )
    }

    #[tokio::test]
    async fn test_list_droplets_follows_pagination() {
        let mut server = mockito::Server::new_async().await;
        let next = format!("{}/v2/droplets?page=2&per_page=200", server.url());

        let page1 = server
            .mock("GET", "/v2/droplets")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("per_page".into(), "200".into()),
            ]))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"droplets":[{}],"links":{{"pages":{{"next":"{}"}}}}}}"#,
                droplet_json(1, "node-a", "10.0.0.1", "203.0.113.1"),
                next
            ))
            .create_async()
            .await;

        let page2 = server
            .mock("GET", "/v2/droplets")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"droplets":[{}],"links":{{}}}}"#,
                droplet_json(2, "node-b", "10.0.0.2", "203.0.113.2")
            ))
            .create_async()
            .await;

        let nodes = client(&server).list_compute_nodes().await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, "1");
        assert_eq!(nodes[0].private_ipv4.as_deref(), Some("10.0.0.1"));
        assert_eq!(nodes[1].name, "node-b");
        assert_eq!(nodes[1].public_ipv4.as_deref(), Some("203.0.113.2"));
    }

    #[tokio::test]
    async fn test_failed_page_aborts_listing() {
        let mut server = mockito::Server::new_async().await;
        let next = format!("{}/v2/droplets?page=2&per_page=200", server.url());

        server
            .mock("GET", "/v2/droplets")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_body(format!(
                r#"{{"droplets":[{}],"links":{{"pages":{{"next":"{}"}}}}}}"#,
                droplet_json(1, "node-a", "10.0.0.1", "203.0.113.1"),
                next
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/v2/droplets")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(500)
            .with_body(
                r#"{"id":"server_error","message":"Server was unable to give you a response."}"#,
            )
            .create_async()
            .await;

        let err = client(&server).list_compute_nodes().await.unwrap_err();
        assert!(matches!(err, CloudError::ApiError(ref m) if m.contains("server_error")));
    }

    #[tokio::test]
    async fn test_get_droplet_maps_volumes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/droplets/42")
            .with_status(200)
            .with_body(
                r#"{"droplet":{"id":42,"name":"node-a","volume_ids":["v1","v2"],"networks":{"v4":[]}}}"#,
            )
            .create_async()
            .await;

        let node = client(&server).get_compute_node("42").await.unwrap();
        assert_eq!(node.id, "42");
        assert!(node.has_volume("v2"));
        assert_eq!(node.private_ipv4, None);
    }

    #[tokio::test]
    async fn test_get_volume_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/volumes/missing")
            .with_status(404)
            .with_body(
                r#"{"id":"not_found","message":"The resource you were accessing could not be found."}"#,
            )
            .create_async()
            .await;

        let err = client(&server).get_volume("missing").await.unwrap_err();
        assert!(matches!(err, CloudError::ResourceNotFound(_)), "{err}");
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/volumes/v1")
            .with_status(401)
            .with_body(r#"{"id":"unauthorized","message":"Unable to authenticate you."}"#)
            .create_async()
            .await;

        let err = client(&server).get_volume("v1").await.unwrap_err();
        assert!(matches!(
            err,
            CloudError::AuthenticationFailed(ref m) if m == "Unable to authenticate you."
        ));
    }

    #[tokio::test]
    async fn test_get_volume_by_name() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/volumes")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".into(), "pvc-data".into()),
                Matcher::UrlEncoded("region".into(), "nyc1".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"volumes":[{"id":"7a1c","name":"pvc-data","region":{"slug":"nyc1"},"droplet_ids":[42]}]}"#,
            )
            .create_async()
            .await;

        let volume = client(&server)
            .get_volume_by_name("pvc-data", "nyc1")
            .await
            .unwrap();
        assert_eq!(volume.id, "7a1c");
        assert_eq!(volume.region, "nyc1");
        assert!(volume.is_attached_to("42"));
    }

    #[tokio::test]
    async fn test_get_volume_by_name_requires_exactly_one_match() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/volumes")
            .match_query(Matcher::UrlEncoded("name".into(), "pvc-data".into()))
            .with_status(200)
            .with_body(r#"{"volumes":[]}"#)
            .create_async()
            .await;

        let err = client(&server)
            .get_volume_by_name("pvc-data", "nyc1")
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::AmbiguousVolume { found: 0, .. }));
    }

    #[tokio::test]
    async fn test_get_volume_by_name_rejects_duplicates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/volumes")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".into(), "pvc-data".into()),
                Matcher::UrlEncoded("region".into(), "nyc1".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"volumes":[
                    {"id":"7a1c","name":"pvc-data","region":{"slug":"nyc1"},"droplet_ids":[42]},
                    {"id":"9f00","name":"pvc-data","region":{"slug":"nyc1"},"droplet_ids":[]}]}"#,
            )
            .create_async()
            .await;

        let err = client(&server)
            .get_volume_by_name("pvc-data", "nyc1")
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                CloudError::AmbiguousVolume { found: 2, ref name, .. } if name == "pvc-data"
            ),
            "{err}"
        );
    }

    #[tokio::test]
    async fn test_requests_without_token_fail_before_sending() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/volumes/v1")
            .expect(0)
            .create_async()
            .await;
        let client = DigitalOceanClient::new(ClientConfig {
            token: None,
            api_url: server.url(),
            metadata_url: format!("{}/metadata/v1", server.url()),
            http_timeout: Duration::from_secs(5),
        })
        .unwrap();

        let err = client.get_volume("v1").await.unwrap_err();
        assert!(matches!(err, CloudError::AuthenticationFailed(_)), "{err}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_attach_posts_action() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/volumes/v1/actions")
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::Json(serde_json::json!({
                "type": "attach",
                "droplet_id": 42
            })))
            .with_status(202)
            .with_body(
                r#"{"action":{"id":36805022,"status":"in-progress","type":"attach_volume","region_slug":"nyc1"}}"#,
            )
            .create_async()
            .await;

        let action = client(&server).request_attach("v1", "42").await.unwrap();

        mock.assert_async().await;
        assert_eq!(action.id, "36805022");
        assert_eq!(action.kind, ActionKind::Attach);
        assert_eq!(action.status, ActionStatus::InProgress);
    }

    #[tokio::test]
    async fn test_request_detach_rejects_non_numeric_droplet() {
        let server = mockito::Server::new_async().await;
        let err = client(&server)
            .request_detach("v1", "node-a")
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_action_keeps_unknown_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/volumes/v1/actions/7")
            .with_status(200)
            .with_body(r#"{"action":{"id":7,"status":"paused","type":"detach_volume"}}"#)
            .create_async()
            .await;

        let action = client(&server).get_action("v1", "7").await.unwrap();
        assert_eq!(action.kind, ActionKind::Detach);
        assert_eq!(action.status, ActionStatus::Unknown("paused".to_string()));
    }

    #[tokio::test]
    async fn test_get_action_rejects_foreign_action_type() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/volumes/v1/actions/8")
            .with_status(200)
            .with_body(r#"{"action":{"id":8,"status":"completed","type":"resize"}}"#)
            .create_async()
            .await;

        let err = client(&server).get_action("v1", "8").await.unwrap_err();
        assert!(matches!(err, CloudError::Decode(ref m) if m.contains("resize")), "{err}");
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_current_region_is_trimmed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/metadata/v1/region")
            .with_status(200)
            .with_body("fra1\n")
            .create_async()
            .await;

        let region = client(&server).current_region().await.unwrap();
        assert_eq!(region, "fra1");
    }

    #[tokio::test]
    async fn test_current_region_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/metadata/v1/region")
            .with_status(503)
            .create_async()
            .await;

        let err = client(&server).current_region().await.unwrap_err();
        assert!(matches!(err, CloudError::ApiError(ref m) if m.contains("metadata")));
    }
}
