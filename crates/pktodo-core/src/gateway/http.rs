use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use pktodo_shared::{NewTodo, TodoPatch, TodoRecord};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use tracing::{debug, info, instrument, warn};

use super::{ListQuery, RemoteStore};
use crate::config::StoreConfig;

/// PostgREST client for one table, authenticated with the project's
/// access key.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    table_url: Url,
}

impl HttpStore {
    pub fn new(cfg: &StoreConfig) -> anyhow::Result<Self> {
        let (endpoint, access_key) = cfg.connection()?;
        let table_url = table_url(endpoint, &cfg.table)?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(access_key).context("access key is not a valid header value")?;
        let bearer = HeaderValue::from_str(&format!("Bearer {access_key}"))
            .context("access key is not a valid header value")?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed building HTTP client for the remote store")?;

        info!(table = %table_url, "remote store client ready");
        Ok(Self { client, table_url })
    }

    fn list_url(&self, query: &ListQuery) -> Url {
        let mut url = self.table_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            pairs.append_pair("order", "id.desc");
            if let Some(category) = query.category.as_ref() {
                pairs.append_pair("type", &format!("eq.{}", category.as_wire()));
            }
        }
        url
    }

    fn row_url(&self, id: i64) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        url
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        prefer: &str,
    ) -> anyhow::Result<String> {
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header("Prefer", prefer);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("failed requesting {method} {url}"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("failed reading response body for {method} {url}"))?;

        let text = check_status(&method, status, text)?;
        debug!(%method, %status, bytes = text.len(), "remote store responded");
        Ok(text)
    }
}

impl RemoteStore for HttpStore {
    #[instrument(skip(self))]
    async fn list(&self, query: &ListQuery) -> anyhow::Result<Vec<TodoRecord>> {
        let body = self
            .send(Method::GET, self.list_url(query), None, "count=none")
            .await?;
        let rows = decode_rows(&body)?;
        debug!(count = rows.len(), "fetched rows");
        Ok(rows)
    }

    #[instrument(skip(self, new), fields(task_len = new.task.len()))]
    async fn insert(&self, new: &NewTodo) -> anyhow::Result<TodoRecord> {
        let payload = serde_json::to_vec(&[new]).context("failed encoding new todo")?;
        let body = self
            .send(
                Method::POST,
                self.table_url.clone(),
                Some(payload),
                "return=representation",
            )
            .await?;
        decode_inserted(&body)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: i64, patch: &TodoPatch) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(patch).context("failed encoding patch")?;
        self.send(Method::PATCH, self.row_url(id), Some(payload), "return=minimal")
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> anyhow::Result<()> {
        self.send(Method::DELETE, self.row_url(id), None, "return=minimal")
            .await?;
        Ok(())
    }
}

/// Non-2xx answers carry PostgREST's error JSON; keep it in the message.
fn check_status(method: &Method, status: StatusCode, body: String) -> anyhow::Result<String> {
    if status.is_success() {
        return Ok(body);
    }
    warn!(%method, %status, body = %body, "remote store rejected request");
    bail!("remote store returned {status} for {method}: {body}")
}

fn decode_rows(body: &str) -> anyhow::Result<Vec<TodoRecord>> {
    serde_json::from_str(body).context("failed decoding todo rows")
}

/// `return=representation` echoes the inserted rows; an empty echo means
/// nothing was stored.
fn decode_inserted(body: &str) -> anyhow::Result<TodoRecord> {
    let mut rows: Vec<TodoRecord> =
        serde_json::from_str(body).context("failed decoding inserted row")?;
    if rows.is_empty() {
        return Err(anyhow!("remote store returned no row for insert"));
    }
    Ok(rows.swap_remove(0))
}

fn table_url(endpoint: &str, table: &str) -> anyhow::Result<Url> {
    let base = endpoint.trim().trim_end_matches('/');
    let table = table.trim();
    if table.is_empty() {
        bail!("store table name cannot be empty");
    }
    Url::parse(&format!("{base}/rest/v1/{table}"))
        .with_context(|| format!("invalid store endpoint: {endpoint}"))
}
