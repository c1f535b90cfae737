use std::time::Duration;

use onos_sync_core::{ControllerService, rest_sub_path};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::GatewayError;

pub const APPLICATIONS_PATH: &str = "onos/v1/applications";
pub const COMPONENT_CONFIG_PATH: &str = "onos/v1/configuration";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Per-request timeout, applied by the transport.
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

/// Where and as whom to talk to one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub credentials: Option<Credentials>,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            credentials: None,
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password,
        });
        self
    }

    pub fn for_service(service: &ControllerService) -> Self {
        let endpoint = Self::new(service.rest_base_url());
        match &service.rest_username {
            Some(username) => endpoint.with_basic_auth(username, service.rest_password.clone()),
            None => endpoint,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// Application descriptor as returned by `GET /onos/v1/applications/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApplicationInfo {
    #[serde(default)]
    pub name: Option<String>,
    pub version: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OnosClient {
    http: reqwest::Client,
}

impl OnosClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Setup(e.to_string()))?;
        Ok(Self { http })
    }

    fn request(&self, method: Method, endpoint: &Endpoint, url: &str) -> reqwest::RequestBuilder {
        let req = self.http.request(method, url);
        match &endpoint.credentials {
            Some(Credentials { username, password }) => req.basic_auth(username, password.as_ref()),
            None => req,
        }
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &Endpoint,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(StatusCode, String, String), GatewayError> {
        let url = endpoint.url(path);
        let mut req = self.request(method.clone(), endpoint, &url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| GatewayError::transport(&method, &url, e))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GatewayError::transport(&method, &url, e))?;
        debug!(method = %method, url = %url, status = status.as_u16(), "ONOS call");
        Ok((status, text, url))
    }

    /// Looks an application up; `None` when the controller answers 404.
    pub async fn get_application(
        &self,
        endpoint: &Endpoint,
        app_id: &str,
    ) -> Result<Option<ApplicationInfo>, GatewayError> {
        let path = format!("{APPLICATIONS_PATH}/{app_id}");
        let (status, body, url) = self.send(Method::GET, endpoint, &path, None).await?;
        match status {
            StatusCode::OK => decode_application(&url, &body).map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            other => Err(GatewayError::unexpected_status(
                &Method::GET,
                url,
                other.as_u16(),
                body,
            )),
        }
    }

    /// Installs and activates from `source_url`. A 409 means already installed.
    pub async fn install_application(
        &self,
        endpoint: &Endpoint,
        source_url: &str,
    ) -> Result<(), GatewayError> {
        let payload = json!({ "activate": true, "url": source_url });
        let (status, body, url) = self
            .send(Method::POST, endpoint, APPLICATIONS_PATH, Some(&payload))
            .await?;
        match status {
            StatusCode::OK | StatusCode::CONFLICT => Ok(()),
            other => Err(GatewayError::unexpected_status(
                &Method::POST,
                url,
                other.as_u16(),
                body,
            )),
        }
    }

    /// Activates a bundled application and returns the version read back.
    pub async fn activate_application(
        &self,
        endpoint: &Endpoint,
        app_id: &str,
    ) -> Result<String, GatewayError> {
        let path = format!("{APPLICATIONS_PATH}/{app_id}/active");
        let (status, body, url) = self.send(Method::POST, endpoint, &path, None).await?;
        if status != StatusCode::OK {
            return Err(GatewayError::unexpected_status(
                &Method::POST,
                url,
                status.as_u16(),
                body,
            ));
        }

        Ok(self.read_application(endpoint, app_id).await?.version)
    }

    /// Like [`OnosClient::get_application`] but anything other than 200 is an error.
    pub async fn read_application(
        &self,
        endpoint: &Endpoint,
        app_id: &str,
    ) -> Result<ApplicationInfo, GatewayError> {
        let path = format!("{APPLICATIONS_PATH}/{app_id}");
        let (status, body, url) = self.send(Method::GET, endpoint, &path, None).await?;
        if status != StatusCode::OK {
            return Err(GatewayError::unexpected_status(
                &Method::GET,
                url,
                status.as_u16(),
                body,
            ));
        }
        decode_application(&url, &body)
    }

    pub async fn deactivate_application(
        &self,
        endpoint: &Endpoint,
        app_id: &str,
    ) -> Result<(), GatewayError> {
        let path = format!("{APPLICATIONS_PATH}/{app_id}/active");
        self.delete_expecting_no_content(endpoint, &path).await
    }

    pub async fn uninstall_application(
        &self,
        endpoint: &Endpoint,
        app_id: &str,
    ) -> Result<(), GatewayError> {
        let path = format!("{APPLICATIONS_PATH}/{app_id}");
        self.delete_expecting_no_content(endpoint, &path).await
    }

    /// POSTs `value` to an arbitrary REST sub-path; one leading slash is dropped.
    pub async fn push_config(
        &self,
        endpoint: &Endpoint,
        path: &str,
        value: &Value,
    ) -> Result<(), GatewayError> {
        let path = rest_sub_path(path);
        let (status, body, url) = self.send(Method::POST, endpoint, path, Some(value)).await?;
        if status != StatusCode::OK {
            return Err(GatewayError::unexpected_status(
                &Method::POST,
                url,
                status.as_u16(),
                body,
            ));
        }
        Ok(())
    }

    pub async fn delete_config(&self, endpoint: &Endpoint, path: &str) -> Result<(), GatewayError> {
        self.delete_expecting_no_content(endpoint, rest_sub_path(path))
            .await
    }

    /// Sets `settings` on one ONOS component.
    pub async fn push_component_config(
        &self,
        endpoint: &Endpoint,
        component: &str,
        settings: &Value,
    ) -> Result<(), GatewayError> {
        let path = format!("{COMPONENT_CONFIG_PATH}/{component}");
        self.push_config(endpoint, &path, settings).await
    }

    /// Resets one ONOS component's configuration to defaults.
    pub async fn delete_component_config(
        &self,
        endpoint: &Endpoint,
        component: &str,
    ) -> Result<(), GatewayError> {
        let path = format!("{COMPONENT_CONFIG_PATH}/{component}");
        self.delete_config(endpoint, &path).await
    }

    async fn delete_expecting_no_content(
        &self,
        endpoint: &Endpoint,
        path: &str,
    ) -> Result<(), GatewayError> {
        let (status, body, url) = self.send(Method::DELETE, endpoint, path, None).await?;
        if status != StatusCode::NO_CONTENT {
            return Err(GatewayError::unexpected_status(
                &Method::DELETE,
                url,
                status.as_u16(),
                body,
            ));
        }
        Ok(())
    }
}

fn decode_application(url: &str, body: &str) -> Result<ApplicationInfo, GatewayError> {
    serde_json::from_str(body).map_err(|e| GatewayError::decode(url, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> OnosClient {
        OnosClient::new(&GatewayConfig::default()).unwrap()
    }

    fn endpoint(server: &MockServer) -> Endpoint {
        Endpoint::new(server.uri()).with_basic_auth("karaf", Some("karaf".to_string()))
    }

    #[test]
    fn test_endpoint_for_service() {
        let svc = ControllerService::new("onos", "onos-url").with_credentials("karaf", "karaf");
        let endpoint = Endpoint::for_service(&svc);
        assert_eq!(endpoint.base_url, "http://onos-url:8181");
        assert_eq!(endpoint.credentials.unwrap().username, "karaf");

        let anonymous = Endpoint::for_service(&ControllerService::new("onos", "onos-url"));
        assert!(anonymous.credentials.is_none());
    }

    #[tokio::test]
    async fn test_get_application_found_and_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onos/v1/applications/org.onosproject.vrouter"))
            .and(basic_auth("karaf", "karaf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "org.onosproject.vrouter",
                "version": "1.13.1",
                "state": "ACTIVE"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/onos/v1/applications/org.opencord.olt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client();
        let info = client
            .get_application(&endpoint(&server), "org.onosproject.vrouter")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.version, "1.13.1");

        let missing = client
            .get_application(&endpoint(&server), "org.opencord.olt")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_get_application_other_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client()
            .get_application(&endpoint(&server), "org.onosproject.vrouter")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_truncated_body_is_transport_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n{\"vers")
                .await
                .unwrap();
        });

        let err = client()
            .get_application(&Endpoint::new(format!("http://{addr}")), "org.onosproject.vrouter")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport { .. }), "{err}");
        assert!(err.status().is_none());
    }

    #[tokio::test]
    async fn test_install_tolerates_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/onos/v1/applications"))
            .and(body_json(json!({
                "activate": true,
                "url": "http://onf.org/maven/vrouter.oar"
            })))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        client()
            .install_application(&endpoint(&server), "http://onf.org/maven/vrouter.oar")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_install_failure_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/onos/v1/applications"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad oar"))
            .mount(&server)
            .await;

        let err = client()
            .install_application(&endpoint(&server), "http://onf.org/maven/vrouter.oar")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("bad oar"));
    }

    #[tokio::test]
    async fn test_activate_reads_version_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/onos/v1/applications/org.onosproject.openflow/active"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/onos/v1/applications/org.onosproject.openflow"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "1.13.1"})))
            .mount(&server)
            .await;

        let version = client()
            .activate_application(&endpoint(&server), "org.onosproject.openflow")
            .await
            .unwrap();
        assert_eq!(version, "1.13.1");

        let requests = server.received_requests().await.unwrap();
        let calls: Vec<_> = requests
            .iter()
            .map(|r| (r.method.as_str().to_string(), r.url.path().to_string()))
            .collect();
        assert_eq!(
            calls,
            vec![
                (
                    "POST".to_string(),
                    "/onos/v1/applications/org.onosproject.openflow/active".to_string()
                ),
                (
                    "GET".to_string(),
                    "/onos/v1/applications/org.onosproject.openflow".to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_deletes_expect_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/onos/v1/applications/org.onosproject.openflow/active"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/onos/v1/applications/org.onosproject.vrouter"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client();
        client
            .deactivate_application(&endpoint(&server), "org.onosproject.openflow")
            .await
            .unwrap();
        let err = client
            .uninstall_application(&endpoint(&server), "org.onosproject.vrouter")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(200));
    }

    #[tokio::test]
    async fn test_push_config_strips_one_slash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/onos/v1/network/configuration/apps/org.opencord.olt"))
            .and(body_json(json!({"kafka": {"bootstrapServers": "cord-kafka:9092"}})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client()
            .push_config(
                &endpoint(&server),
                "/onos/v1/network/configuration/apps/org.opencord.olt",
                &json!({"kafka": {"bootstrapServers": "cord-kafka:9092"}}),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_component_config_paths() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/onos/v1/configuration/org.opencord.olt.impl.Olt"))
            .and(body_json(json!({"defaultVlan": "65"})))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/onos/v1/configuration/org.opencord.olt.impl.Olt"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client();
        client
            .push_component_config(
                &endpoint(&server),
                "org.opencord.olt.impl.Olt",
                &json!({"defaultVlan": "65"}),
            )
            .await
            .unwrap();
        client
            .delete_component_config(&endpoint(&server), "org.opencord.olt.impl.Olt")
            .await
            .unwrap();
    }
}
