use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;

use crate::error::{Error, Result};

mod parse;
pub mod types;

pub use types::{Entry, FeedDocument};

/// Retrieves and normalizes one feed. Implementations must honour the
/// deadline and never hand back a document without entries.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str, deadline: Duration) -> Result<FeedDocument>;
}

#[derive(Clone)]
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self { client })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        let net = |source| Error::Network { url: url.to_string(), source };
        let resp = self.client.get(url).send().await.map_err(net)?;
        let resp = resp.error_for_status().map_err(net)?;
        resp.bytes().await.map_err(net)
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str, deadline: Duration) -> Result<FeedDocument> {
        // dropping the request future on expiry aborts the connection
        let body = tokio::time::timeout(deadline, self.fetch_bytes(url))
            .await
            .map_err(|_| Error::Timeout { url: url.to_string(), after: deadline })??;

        let doc = parse::parse_document(&body)
            .map_err(|reason| Error::Parse { url: url.to_string(), reason })?;
        if doc.entries.is_empty() {
            return Err(Error::Parse { url: url.to_string(), reason: "feed has no entries".into() });
        }
        Ok(doc)
    }
}
