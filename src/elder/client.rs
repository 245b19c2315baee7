use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::Config;

use super::api_types::{
  AuditExportRequest, BackupRunResponse, Health, ListResponse, LogsResponse, NewDependency,
  RestoreRequest,
};
use super::error::ApiError;
use super::keys::ListParams;
use super::types::{Dependency, Listable, Profile, Resource};

/// Elder API client.
///
/// Every call decodes into a typed model at this boundary; anything that
/// fails to decode is reported as [`ApiError::Decode`].
#[derive(Clone)]
pub struct ElderClient {
  http: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl std::fmt::Debug for ElderClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ElderClient")
      .field("base", &self.base.as_str())
      .field("authenticated", &self.token.is_some())
      .finish()
  }
}

impl ElderClient {
  pub fn new(config: &Config) -> Result<Self, ApiError> {
    Self::with_base(&config.api.url, Config::get_api_token(), config.timeout())
  }

  pub fn with_base(base: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
    let mut base = Url::parse(base.trim())?;
    // Url::join drops the last segment unless the path ends with '/'
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(ApiError::Transport)?;

    Ok(Self { http, base, token })
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
    Ok(self.base.join(&format!("api/v1/{}", path))?)
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    let builder = self.http.request(method, url);
    match &self.token {
      Some(token) => builder.bearer_auth(token),
      None => builder,
    }
  }

  async fn send(&self, builder: RequestBuilder) -> Result<Vec<u8>, ApiError> {
    let response = builder.send().await.map_err(ApiError::Transport)?;
    let status = response.status();
    let body = response.bytes().await.map_err(ApiError::Transport)?;

    if !status.is_success() {
      debug!(status = status.as_u16(), "Elder API returned an error");
      return Err(ApiError::from_response(status.as_u16(), &body));
    }
    Ok(body.to_vec())
  }

  async fn execute<T: DeserializeOwned>(
    &self,
    method: Method,
    url: Url,
    body: Option<&impl Serialize>,
  ) -> Result<T, ApiError> {
    let endpoint = url.path().to_string();
    let mut builder = self.request(method, url);
    if let Some(body) = body {
      builder = builder.json(body);
    }
    let bytes = self.send(builder).await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
      endpoint,
      reason: e.to_string(),
    })
  }

  async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
    self.execute(Method::GET, url, None::<&()>).await
  }

  /// Service health (`GET /healthz`). Does not need a token.
  pub async fn health(&self) -> Result<Health, ApiError> {
    let url = self.base.join("healthz")?;
    self.get(url).await
  }

  /// Current user profile.
  pub async fn profile(&self) -> Result<Profile, ApiError> {
    self.get(self.endpoint("profile")?).await
  }

  /// One page of a resource listing.
  pub async fn list<T: Listable>(&self, params: &ListParams) -> Result<ListResponse<T>, ApiError> {
    let mut url = self.endpoint(T::RESOURCE.path())?;
    url.query_pairs_mut().extend_pairs(params.query_pairs());
    self.get(url).await
  }

  /// Search a resource. Resources without a search endpoint take `q` on
  /// their listing.
  pub async fn search<T: Listable>(
    &self,
    term: &str,
    params: &ListParams,
  ) -> Result<ListResponse<T>, ApiError> {
    let path = T::RESOURCE
      .search_path()
      .unwrap_or_else(|| T::RESOURCE.path());
    let mut url = self.endpoint(path)?;
    url
      .query_pairs_mut()
      .append_pair("q", term)
      .extend_pairs(params.query_pairs());
    self.get(url).await
  }

  /// Delete one row. The response body, if any, is ignored.
  pub async fn delete(&self, resource: Resource, id: i64) -> Result<(), ApiError> {
    let url = self.endpoint(&format!("{}/{}", resource.path(), id))?;
    self.send(self.request(Method::DELETE, url)).await?;
    Ok(())
  }

  pub async fn create_dependency(&self, new: &NewDependency) -> Result<Dependency, ApiError> {
    let url = self.endpoint(Resource::Dependencies.path())?;
    self.execute(Method::POST, url, Some(new)).await
  }

  /// Tail of the server log.
  pub async fn logs(&self, lines: u32) -> Result<LogsResponse, ApiError> {
    let mut url = self.endpoint("logs")?;
    url
      .query_pairs_mut()
      .append_pair("lines", &lines.to_string());
    self.get(url).await
  }

  pub async fn search_logs(&self, query: &str, lines: u32) -> Result<LogsResponse, ApiError> {
    let mut url = self.endpoint("logs/search")?;
    url
      .query_pairs_mut()
      .append_pair("q", query)
      .append_pair("lines", &lines.to_string());
    self.get(url).await
  }

  /// Exported audit document, returned as-is for writing to disk.
  pub async fn export_audit_logs(&self, request: &AuditExportRequest) -> Result<Value, ApiError> {
    let url = self.endpoint("audit/export")?;
    self.execute(Method::POST, url, Some(request)).await
  }

  pub async fn run_backup_job(&self, job_id: i64) -> Result<BackupRunResponse, ApiError> {
    let url = self.endpoint(&format!("backup/jobs/{}/run", job_id))?;
    self.execute(Method::POST, url, None::<&()>).await
  }

  pub async fn restore_backup(
    &self,
    backup_id: i64,
    dry_run: bool,
  ) -> Result<BackupRunResponse, ApiError> {
    let url = self.endpoint(&format!("backup/{}/restore", backup_id))?;
    self
      .execute(Method::POST, url, Some(&RestoreRequest { dry_run }))
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base: &str) -> ElderClient {
    ElderClient::with_base(base, None, Duration::from_secs(1)).unwrap()
  }

  #[test]
  fn test_base_path_is_kept() {
    let c = client("https://elder.example.com/portal");
    assert_eq!(
      c.endpoint("labels").unwrap().as_str(),
      "https://elder.example.com/portal/api/v1/labels"
    );
    let c = client("https://elder.example.com");
    assert_eq!(
      c.endpoint("backup/jobs/3/run").unwrap().as_str(),
      "https://elder.example.com/api/v1/backup/jobs/3/run"
    );
  }

  #[test]
  fn test_invalid_base_url() {
    let err = ElderClient::with_base("not a url", None, Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, ApiError::InvalidUrl(_)));
  }

  #[test]
  fn test_debug_hides_token() {
    let c = ElderClient::with_base(
      "http://localhost:5000",
      Some("secret".into()),
      Duration::from_secs(1),
    )
    .unwrap();
    let debug = format!("{:?}", c);
    assert!(!debug.contains("secret"));
    assert!(debug.contains("authenticated: true"));
  }
}
