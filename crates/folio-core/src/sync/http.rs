//! HTTP transport against the Folio sync API.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::SyncEndpoint;
use crate::models::{SyncRecord, SyncableRecord};
use crate::util::compact_text;

use super::transport::{RequestContext, SyncTransport, TransportError};

/// Header carrying the writer's device id
pub const DEVICE_ID_HEADER: &str = "X-Device-Id";

/// reqwest-backed `SyncTransport`.
///
/// - `GET  {base}/v1/sync/{collection}` returns `{"records": [...]}`
/// - `POST {base}/v1/sync/{collection}/batch` takes `{"records": [...]}`
/// - `PUT  {base}/v1/sync/{collection}/{id}` takes one record
#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "R: SyncRecord"))]
struct RecordsPayload<R> {
    records: Vec<SyncableRecord<R>>,
}

#[derive(Debug, Serialize)]
#[serde(bound(serialize = "R: SyncRecord"))]
struct RecordsBody<'a, R> {
    records: &'a [SyncableRecord<R>],
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HttpTransport {
    pub fn new(endpoint: &SyncEndpoint) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(endpoint.request_timeout)
            .build()
            .map_err(|error| TransportError::Network(error.to_string()))?;
        Ok(Self {
            base_url: endpoint.api_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/v1/sync/{}",
            self.base_url,
            urlencoding::encode(collection)
        )
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(collection),
            urlencoding::encode(id)
        )
    }

    fn authorized(request: RequestBuilder, context: &RequestContext) -> RequestBuilder {
        request
            .bearer_auth(&context.bearer_token)
            .header(DEVICE_ID_HEADER, &context.device_id)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_api_error(status, &body);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(TransportError::Unauthorized(message))
        } else {
            Err(TransportError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }
}

impl SyncTransport for HttpTransport {
    async fn pull<R: SyncRecord>(
        &self,
        collection: &str,
        context: &RequestContext,
    ) -> Result<Vec<SyncableRecord<R>>, TransportError> {
        let request = Self::authorized(self.client.get(self.collection_url(collection)), context);
        let response = Self::send(request).await?;
        let payload = response
            .json::<RecordsPayload<R>>()
            .await
            .map_err(|error| TransportError::InvalidPayload(error.to_string()))?;
        tracing::debug!(
            "Pulled {} record(s) from {}",
            payload.records.len(),
            collection
        );
        Ok(payload.records)
    }

    async fn push_batch<R: SyncRecord>(
        &self,
        collection: &str,
        context: &RequestContext,
        records: &[SyncableRecord<R>],
    ) -> Result<(), TransportError> {
        let url = format!("{}/batch", self.collection_url(collection));
        let request = Self::authorized(self.client.post(url), context).json(&RecordsBody { records });
        Self::send(request).await?;
        tracing::debug!("Pushed {} record(s) to {}", records.len(), collection);
        Ok(())
    }

    async fn push_one<R: SyncRecord>(
        &self,
        collection: &str,
        context: &RequestContext,
        record: &SyncableRecord<R>,
    ) -> Result<(), TransportError> {
        let url = self.record_url(collection, record.id());
        let request = Self::authorized(self.client.put(url), context).json(record);
        Self::send(request).await?;
        Ok(())
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(error.to_string())
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
