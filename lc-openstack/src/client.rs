use reqwest::{
    RequestBuilder,
    Response,
    StatusCode,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::*;
use url::Url;

use crate::errors::*;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

// Password credentials for a project-scoped keystone token.  `auth_url` is the identity v3
// endpoint, e.g. `http://keystone-internal.openstack.svc:5000/v3`.
#[derive(Clone, Debug, Default)]
pub struct AuthOpts {
    pub auth_url: String,
    pub username: String,
    pub password: String,
    pub tenant_name: String,
    pub domain_name: String,
    pub region: String,
}

// An authenticated identity v3 client.  The token is not refreshed, so clients are expected to be
// built fresh for each reconcile.
#[derive(Clone, Debug)]
pub struct OpenStack {
    http: reqwest::Client,
    identity_url: Url,
    token: String,
    region: String,
}

// Url::join drops the last path segment unless it ends with a slash
fn identity_url(auth_url: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(auth_url)?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

impl OpenStack {
    pub async fn authenticate(opts: &AuthOpts) -> anyhow::Result<OpenStack> {
        let identity_url = identity_url(&opts.auth_url)?;
        let http = reqwest::Client::new();

        let body = json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": opts.username,
                            "domain": {"name": opts.domain_name},
                            "password": opts.password,
                        },
                    },
                },
                "scope": {
                    "project": {
                        "name": opts.tenant_name,
                        "domain": {"name": opts.domain_name},
                    },
                },
            },
        });

        info!("authenticating {} against {}", opts.username, opts.auth_url);
        let resp = http
            .post(identity_url.join("auth/tokens")?)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let Some(token) = resp.headers().get(SUBJECT_TOKEN_HEADER).and_then(|v| v.to_str().ok()) else {
            bail!(OpenStackError::missing_token(&opts.auth_url));
        };

        Ok(OpenStack {
            http,
            identity_url,
            token: token.into(),
            region: opts.region.clone(),
        })
    }

    // For callers that already hold a valid token
    pub fn with_token(auth_url: &str, token: &str, region: &str) -> anyhow::Result<OpenStack> {
        Ok(OpenStack {
            http: reqwest::Client::new(),
            identity_url: identity_url(auth_url)?,
            token: token.into(),
            region: region.into(),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(AUTH_TOKEN_HEADER, &self.token)
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        Ok(self.identity_url.join(path)?)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> anyhow::Result<T> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let resp = self.request(self.http.get(url)).send().await?;
        Ok(resp.error_for_status()?.json().await?)
    }

    pub(crate) async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> anyhow::Result<T> {
        let resp = self.request(self.http.post(self.url(path)?).json(body)).send().await?;
        Ok(resp.error_for_status()?.json().await?)
    }

    pub(crate) async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> anyhow::Result<T> {
        let resp = self.request(self.http.patch(self.url(path)?).json(body)).send().await?;
        Ok(resp.error_for_status()?.json().await?)
    }

    pub(crate) async fn put(&self, path: &str) -> EmptyResult {
        self.request(self.http.put(self.url(path)?)).send().await?.error_for_status()?;
        Ok(())
    }

    // Deleting something that's already gone is fine
    pub(crate) async fn delete(&self, path: &str) -> EmptyResult {
        let resp: Response = self.request(self.http.delete(self.url(path)?)).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!("{path} already deleted");
            return Ok(());
        }
        resp.error_for_status()?;
        Ok(())
    }
}
