use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::ApplicationGateway;
use crate::application::{Application, ApplicationDraft, ApplicationPatch};
use crate::config::Config;
use crate::error::{BoardError, BoardResult};

/// Gateway over the hosted store's PostgREST endpoint
/// (`{url}/rest/v1/{table}`). Every write asks for the stored
/// representation back so the board can adopt server-side values.
#[derive(Clone)]
pub struct RestGateway {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
}

impl RestGateway {
    pub fn new(base_url: &str, api_key: String, table: &str, timeout: Duration) -> BoardResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> BoardResult<Self> {
        Self::new(
            &config.supabase_url,
            config.supabase_anon_key.clone(),
            &config.table,
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=representation")
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> BoardResult<T> {
        let response = self.authorized(request).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

fn list_query(owner: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", "*".to_string()),
        ("order", "created_at.desc".to_string()),
    ];
    if let Some(owner) = owner {
        query.push(("user_id", format!("eq.{owner}")));
    }
    query
}

fn id_filter(id: &str) -> Vec<(&'static str, String)> {
    vec![("id", format!("eq.{id}"))]
}

/// Maps a non-success HTTP status onto the board's error taxonomy.
fn classify(status: StatusCode, body: &str) -> BoardError {
    let message = serde_json::from_str::<PostgrestError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string());
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => BoardError::Validation(message),
        _ => BoardError::Transport(format!("store returned {status}: {message}")),
    }
}

async fn check_status(response: Response) -> BoardResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!("store request failed with {status}: {body}");
    Err(classify(status, &body))
}

/// Writes answer with an array; an empty one means no row matched the id.
fn single_row(rows: Vec<Application>, id: &str) -> BoardResult<Application> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BoardError::NotFound(id.to_string()))
}

#[async_trait]
impl ApplicationGateway for RestGateway {
    async fn list_all(&self, owner: Option<&str>) -> BoardResult<Vec<Application>> {
        let rows: Vec<Application> = self
            .send(self.client.get(&self.endpoint).query(&list_query(owner)))
            .await?;
        debug!("listed {} applications", rows.len());
        Ok(rows)
    }

    async fn create(&self, draft: &ApplicationDraft) -> BoardResult<Application> {
        let rows: Vec<Application> = self
            .send(self.client.post(&self.endpoint).json(&[draft]))
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BoardError::Transport("store returned no row for insert".to_string()))
    }

    async fn update(&self, id: &str, patch: &ApplicationPatch) -> BoardResult<Application> {
        let rows: Vec<Application> = self
            .send(
                self.client
                    .patch(&self.endpoint)
                    .query(&id_filter(id))
                    .json(patch),
            )
            .await?;
        single_row(rows, id)
    }

    async fn delete(&self, id: &str) -> BoardResult<()> {
        let rows: Vec<Application> = self
            .send(self.client.delete(&self.endpoint).query(&id_filter(id)))
            .await?;
        single_row(rows, id).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_table_path() {
        let gateway = RestGateway::new(
            "https://demo.supabase.co/",
            "anon".into(),
            "job_applications",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            gateway.endpoint(),
            "https://demo.supabase.co/rest/v1/job_applications"
        );
    }

    #[test]
    fn test_list_query_orders_newest_first() {
        let query = list_query(None);
        assert!(query.contains(&("order", "created_at.desc".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "user_id"));

        let owned = list_query(Some("u-1"));
        assert!(owned.contains(&("user_id", "eq.u-1".to_string())));
    }

    #[test]
    fn test_classify_bad_request_as_validation() {
        let body = r#"{"code":"23502","message":"null value in column \"company_name\""}"#;
        let err = classify(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, BoardError::Validation(msg) if msg.contains("company_name")));
    }

    #[test]
    fn test_classify_auth_and_server_failures_as_transport() {
        assert!(matches!(
            classify(StatusCode::UNAUTHORIZED, "Invalid API key"),
            BoardError::Transport(msg) if msg.contains("Invalid API key")
        ));
        assert!(matches!(
            classify(StatusCode::SERVICE_UNAVAILABLE, ""),
            BoardError::Transport(_)
        ));
    }

    #[test]
    fn test_empty_representation_is_not_found() {
        let err = single_row(Vec::new(), "a1").unwrap_err();
        assert!(matches!(err, BoardError::NotFound(id) if id == "a1"));
    }
}
