//! Elasticsearch `_bulk` sink.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::config::TargetConfig;
use crate::core::{BulkSink, DispatchHandle, ReshapedBatch};
use crate::error::{LoadError, Result};
use crate::queue::ResultQueue;

use super::listener::{BulkListener, BulkResponse};

/// Bulk sink posting NDJSON to `{url}/_bulk`.
pub struct ElasticSink {
    client: Client,
    bulk_url: Url,
    index: String,
    username: Option<String>,
    password: Option<String>,
    queue: ResultQueue,
}

impl ElasticSink {
    /// Create a sink for `config`, recording outcomes into `queue`.
    pub fn new(config: &TargetConfig, queue: ResultQueue) -> Result<Self> {
        let bulk_url = Url::parse(&format!("{}/_bulk", config.url.trim_end_matches('/')))
            .map_err(|e| {
                LoadError::Config(format!("target.url '{}' is not a valid URL: {}", config.url, e))
            })?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            bulk_url,
            index: config.index.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            queue,
        })
    }

    /// Endpoint receiving bulk requests.
    pub fn bulk_url(&self) -> &Url {
        &self.bulk_url
    }

    /// Serialize a batch as a `_bulk` NDJSON body.
    ///
    /// With an index type set, each document is nested under that type.
    pub fn bulk_body(&self, batch: &ReshapedBatch) -> Result<String> {
        let action = serde_json::to_string(&json!({ "index": { "_index": self.index } }))?;
        let mut body = String::new();
        for doc in &batch.documents {
            body.push_str(&action);
            body.push('\n');
            let line = match &batch.index_type {
                Some(index_type) => {
                    let mut wrapped = BTreeMap::new();
                    wrapped.insert(index_type.as_str(), doc);
                    serde_json::to_string(&wrapped)?
                }
                None => serde_json::to_string(doc)?,
            };
            body.push_str(&line);
            body.push('\n');
        }
        Ok(body)
    }

    fn request(&self, body: String) -> RequestBuilder {
        let request = self
            .client
            .post(self.bulk_url.clone())
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_ref()),
            None => request,
        }
    }
}

async fn execute(request: RequestBuilder) -> Result<BulkResponse> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(LoadError::Sink(format!(
            "bulk request returned {}: {}",
            status, text
        )));
    }
    Ok(response.json::<BulkResponse>().await?)
}

#[async_trait]
impl BulkSink for ElasticSink {
    async fn dispatch(
        &self,
        correlation_id: &str,
        batch: Arc<ReshapedBatch>,
    ) -> Result<DispatchHandle> {
        if batch.is_empty() {
            return Ok(DispatchHandle::completed(correlation_id, true));
        }

        let body = self.bulk_body(&batch)?;
        let request = self.request(body);
        let request_id = Uuid::new_v4().to_string();
        debug!(
            "Dispatching bulk {} ({} documents, request {})",
            correlation_id,
            batch.len(),
            request_id
        );

        let listener = BulkListener::new(
            correlation_id,
            request_id,
            self.index.clone(),
            self.queue.clone(),
        );
        Ok(DispatchHandle::spawn(correlation_id, async move {
            let outcome = execute(request).await;
            listener.complete(outcome).await
        }))
    }
}
