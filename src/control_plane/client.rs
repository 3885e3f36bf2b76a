// src/control_plane/client.rs
//
// CenturyLink Cloud v2 REST client.
//
use super::{ControlPlane, RemoteResult};
use crate::config::ControlPlaneConfig;
use crate::error::RemoteError;
use crate::model::{Datacenter, Group, LoadBalancer, NewLoadBalancer, NewPool, Node, Pool, Server};
use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone)]
struct Session {
    alias: String,
    token: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    account_alias: String,
    bearer_token: String,
}

pub struct ClcClient {
    http: Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
    alias_override: Option<String>,
    session: RwLock<Option<Session>>,
}

impl ClcClient {
    pub fn new(config: &ControlPlaneConfig) -> anyhow::Result<Self> {
        if config.base_url.cannot_be_a_base() {
            bail!("control plane base url {} is not a base url", config.base_url);
        }

        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            alias_override: config.account_alias.clone(),
            session: RwLock::new(None),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn session(&self) -> RemoteResult<Session> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(session.clone());
        }

        let mut slot = self.session.write().await;
        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }
        let session = self.login().await?;
        *slot = Some(session.clone());
        Ok(session)
    }

    async fn login(&self) -> RemoteResult<Session> {
        let (Some(username), Some(password)) = (self.username.as_deref(), self.password.as_deref())
        else {
            return Err(RemoteError::Auth(
                "CLC_USERNAME and CLC_PASSWORD must be set".to_string(),
            ));
        };

        let request = self
            .http
            .post(self.url(&["v2", "authentication", "login"]))
            .json(&LoginRequest { username, password });
        let body = match send("login", request).await {
            Ok(body) => body,
            Err(RemoteError::Status { status, body, .. }) => {
                return Err(RemoteError::Auth(format!("HTTP {status}: {body}")));
            }
            Err(err) => return Err(err),
        };
        let login: LoginResponse = decode("login", &body)?;

        let alias = self.alias_override.clone().unwrap_or(login.account_alias);
        info!(username, alias = %alias, "Authenticated against control plane");
        Ok(Session {
            alias,
            token: login.bearer_token,
        })
    }

    /// Build an authenticated request. `path` receives the account alias.
    async fn request(
        &self,
        method: Method,
        path: impl FnOnce(&str) -> Vec<String>,
    ) -> RemoteResult<RequestBuilder> {
        let session = self.session().await?;
        let segments = path(&session.alias);
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        Ok(self
            .http
            .request(method, self.url(&segments))
            .bearer_auth(&session.token))
    }

    /// Send an authenticated request. A 401 drops the cached session so the
    /// next call logs in again; the failed call itself is not retried.
    async fn send_authenticated(&self, operation: &'static str, request: RequestBuilder) -> RemoteResult<String> {
        let result = send(operation, request).await;
        if result.as_ref().is_err_and(RemoteError::is_unauthorized) {
            warn!(operation, "Control plane rejected bearer token, session cleared");
            *self.session.write().await = None;
        }
        result
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> RemoteResult<T> {
        let body = self.send_authenticated(operation, request).await?;
        decode(operation, &body)
    }
}

async fn send(operation: &'static str, request: RequestBuilder) -> RemoteResult<String> {
    let response = request
        .send()
        .await
        .map_err(|source| RemoteError::Transport { operation, source })?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| RemoteError::Transport { operation, source })?;

    if !status.is_success() {
        return Err(RemoteError::status(operation, status.as_u16(), body));
    }
    debug!(operation, status = status.as_u16(), "Control plane call succeeded");
    Ok(body)
}

fn decode<T: DeserializeOwned>(operation: &'static str, body: &str) -> RemoteResult<T> {
    serde_json::from_str(body).map_err(|source| RemoteError::Decode { operation, source })
}

fn lb_path(alias: &str, dc: &str, rest: &[&str]) -> Vec<String> {
    let mut path = vec![
        "v2".to_string(),
        "sharedLoadBalancers".to_string(),
        alias.to_string(),
        dc.to_string(),
    ];
    path.extend(rest.iter().map(|s| s.to_string()));
    path
}

#[async_trait]
impl ControlPlane for ClcClient {
    async fn get_datacenter(&self, dc: &str) -> RemoteResult<Datacenter> {
        let request = self
            .request(Method::GET, |alias| {
                vec!["v2".into(), "datacenters".into(), alias.into(), dc.into()]
            })
            .await?
            .query(&[("groupLinks", "true")]);
        self.call("get_datacenter", request).await
    }

    async fn get_group(&self, id: &str) -> RemoteResult<Group> {
        let request = self
            .request(Method::GET, |alias| {
                vec!["v2".into(), "groups".into(), alias.into(), id.into()]
            })
            .await?;
        self.call("get_group", request).await
    }

    async fn get_server(&self, name: &str) -> RemoteResult<Server> {
        let request = self
            .request(Method::GET, |alias| {
                vec!["v2".into(), "servers".into(), alias.into(), name.into()]
            })
            .await?;
        self.call("get_server", request).await
    }

    async fn list_load_balancers(&self, dc: &str) -> RemoteResult<Vec<LoadBalancer>> {
        let request = self
            .request(Method::GET, |alias| lb_path(alias, dc, &[]))
            .await?;
        self.call("list_load_balancers", request).await
    }

    async fn get_load_balancer(&self, dc: &str, id: &str) -> RemoteResult<LoadBalancer> {
        let request = self
            .request(Method::GET, |alias| lb_path(alias, dc, &[id]))
            .await?;
        self.call("get_load_balancer", request).await
    }

    async fn create_load_balancer(&self, dc: &str, lb: &NewLoadBalancer) -> RemoteResult<LoadBalancer> {
        let request = self
            .request(Method::POST, |alias| lb_path(alias, dc, &[]))
            .await?
            .json(lb);
        self.call("create_load_balancer", request).await
    }

    async fn delete_load_balancer(&self, dc: &str, id: &str) -> RemoteResult<()> {
        let request = self
            .request(Method::DELETE, |alias| lb_path(alias, dc, &[id]))
            .await?;
        self.send_authenticated("delete_load_balancer", request).await.map(|_| ())
    }

    async fn create_pool(&self, dc: &str, lb_id: &str, pool: &NewPool) -> RemoteResult<Pool> {
        let request = self
            .request(Method::POST, |alias| lb_path(alias, dc, &[lb_id, "pools"]))
            .await?
            .json(pool);
        self.call("create_pool", request).await
    }

    async fn delete_pool(&self, dc: &str, lb_id: &str, pool_id: &str) -> RemoteResult<()> {
        let request = self
            .request(Method::DELETE, |alias| {
                lb_path(alias, dc, &[lb_id, "pools", pool_id])
            })
            .await?;
        self.send_authenticated("delete_pool", request).await.map(|_| ())
    }

    async fn update_nodes(&self, dc: &str, lb_id: &str, pool_id: &str, nodes: &[Node]) -> RemoteResult<()> {
        let request = self
            .request(Method::PUT, |alias| {
                lb_path(alias, dc, &[lb_id, "pools", pool_id, "nodes"])
            })
            .await?
            .json(nodes);
        self.send_authenticated("update_nodes", request).await.map(|_| ())
    }
}
