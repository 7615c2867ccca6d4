use crate::api::endpoints::{Endpoints, FileRef};
use crate::core::error::{ClientError, ClientResult};
use crate::models::{decode, ServerInfo, Settings, Torrent, TorrentState, Tracker, Validate};
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Typed HTTP client for the torrent API
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    endpoints: Endpoints,
}

/// Body of every non-success response
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let endpoints = Endpoints::new(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Connection(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn server_info(&self) -> ClientResult<ServerInfo> {
        self.get_json(self.endpoints.info(), &[]).await
    }

    /// Fetch the torrent collection, optionally restricted to some states
    pub async fn list_torrents(&self, wanted: &[TorrentState]) -> ClientResult<BTreeMap<u64, Torrent>> {
        let query = if wanted.is_empty() {
            Vec::new()
        } else {
            vec![("wantedStates", TorrentState::join(wanted))]
        };
        self.get_json(self.endpoints.torrents(), &query).await
    }

    pub async fn get_torrent(&self, id: u64) -> ClientResult<Torrent> {
        self.get_json(self.endpoints.torrent(id), &[]).await
    }

    pub async fn list_trackers(&self) -> ClientResult<BTreeMap<u64, Tracker>> {
        self.get_json(self.endpoints.trackers(), &[]).await
    }

    pub async fn get_tracker(&self, id: u64) -> ClientResult<Tracker> {
        self.get_json(self.endpoints.tracker(id), &[]).await
    }

    pub async fn get_settings(&self) -> ClientResult<Settings> {
        self.get_json(self.endpoints.settings(), &[]).await
    }

    /// Raw bytes of a payload file or of the `.torrent` metainfo
    pub async fn download_file(&self, torrent_id: u64, file: FileRef) -> ClientResult<Vec<u8>> {
        let response = self
            .execute(self.client.get(self.endpoints.file(torrent_id, file)))
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Connection(format!("failed to read file body: {}", e)))?;
        Ok(bytes.to_vec())
    }

    pub async fn get_json<T>(&self, url: Url, query: &[(&str, String)]) -> ClientResult<T>
    where
        T: DeserializeOwned + Validate,
    {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = self.execute(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Connection(format!("failed to read response body: {}", e)))?;
        decode(&bytes)
    }

    /// Multipart POST; the success body is not inspected
    pub async fn post_form(&self, url: Url, form: Form) -> ClientResult<()> {
        self.execute(self.client.post(url).multipart(form)).await?;
        Ok(())
    }

    pub async fn delete(&self, url: Url, query: &[(&str, String)]) -> ClientResult<()> {
        let mut request = self.client.delete(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        self.execute(request).await?;
        Ok(())
    }

    async fn execute(&self, request: RequestBuilder) -> ClientResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        debug!(
            url = %response.url(),
            status = response.status().as_u16(),
            "API response received"
        );

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(api_error(response).await)
        }
    }
}

/// Turn a non-success response into `ClientError::Api`
async fn api_error(response: Response) -> ClientError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();

    let message = match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(body) => body.error,
        Err(_) => {
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            if text.is_empty() {
                format!("request failed with status {}", status.as_u16())
            } else {
                text
            }
        }
    };

    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.base_url(), Duration::from_secs(5)).expect("client")
    }

    #[test]
    fn test_api_client_creation() {
        let client = ApiClient::new("http://localhost:8000", Duration::from_secs(30));
        assert!(client.is_ok());
        assert!(ApiClient::new("::", Duration::from_secs(30)).is_err());
    }

    #[tokio::test]
    async fn test_list_torrents_with_filter() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/torrent")
                .query_param("wantedStates", "running,seeding");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "2": {"id": 2, "name": "b", "state": "seeding", "seedAddr": "1-ff00:0:110,[127.0.0.1]:44000"}
                }));
        });

        let client = client_for(&server);
        let torrents = client
            .list_torrents(&[TorrentState::Running, TorrentState::Seeding])
            .await
            .expect("list should succeed");

        mock.assert();
        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[&2].state, TorrentState::Seeding);
    }

    #[tokio::test]
    async fn test_error_body_becomes_api_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/torrent/9");
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({"error": "torrent with given ID not found"}));
        });

        let err = client_for(&server).get_torrent(9).await.expect_err("should fail");
        match &err {
            ClientError::Api { status, message } => {
                assert_eq!(*status, 404);
                assert_eq!(message, "torrent with given ID not found");
            }
            other => panic!("expected api error, got {:?}", other),
        }
        assert_eq!(err.display_message(), "Torrent with given ID not found!");
    }

    #[tokio::test]
    async fn test_unstructured_error_body() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/settings");
            then.status(502);
        });

        let err = client_for(&server).get_settings().await.expect_err("should fail");
        assert!(matches!(err, ClientError::Api { status: 502, ref message } if message.contains("502")));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_parse_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/tracker");
            then.status(200).body("[1, 2, 3]");
        });

        let err = client_for(&server).list_trackers().await.expect_err("should fail");
        assert!(matches!(err, ClientError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.server_info().await.expect_err("should fail");
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn test_download_torrent_file() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/torrent/3/file/torrent");
            then.status(200).body("d8:announce0:e");
        });

        let bytes = client_for(&server)
            .download_file(3, FileRef::TorrentFile)
            .await
            .expect("download should succeed");
        mock.assert();
        assert_eq!(bytes, b"d8:announce0:e".to_vec());
    }
}
