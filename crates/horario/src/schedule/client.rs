//! HTTP client for the remote course feed.
//!
//! The feed is a single JSON document:
//! `{ data: { allSalasUdps: { edges: [ { node: RawCourse }, ... ] } } }`

use super::error::ScheduleError;
use crate::config::AppConfig;
use rand::Rng;
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// JSON pointer of the edge array inside the feed document.
const EDGES_POINTER: &str = "/data/allSalasUdps/edges";

/// Something that yields the raw course nodes of one fetch.
pub trait CourseFeed {
    /// Fetches the feed and returns every edge's `node`, untouched.
    fn fetch_nodes(&self) -> impl Future<Output = Result<Vec<Value>, ScheduleError>> + Send;
}

/// Client for the course feed.
pub struct FeedClient {
    client: Client,
    feed_url: String,
}

impl FeedClient {
    /// Creates a client for the feed configured in `config`.
    pub fn new(config: &AppConfig) -> Result<Self, ScheduleError> {
        Self::with_url(&config.feed_url, Duration::from_secs(config.request_timeout_secs))
    }

    /// Creates a client for an explicit feed URL.
    pub fn with_url(feed_url: &str, timeout: Duration) -> Result<Self, ScheduleError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .map_err(|e| ScheduleError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            feed_url: feed_url.to_string(),
        })
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    async fn fetch(&self) -> Result<Vec<Value>, ScheduleError> {
        let start = Instant::now();
        info!(url = %self.feed_url, "Fetching course feed");

        let response = self.client.get(&self.feed_url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(url = %self.feed_url, status = %status, "Course feed returned an error status");
            return Err(ScheduleError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        let nodes = extract_nodes(body)?;

        info!(
            nodes = nodes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Course feed received"
        );
        Ok(nodes)
    }
}

impl CourseFeed for FeedClient {
    fn fetch_nodes(&self) -> impl Future<Output = Result<Vec<Value>, ScheduleError>> + Send {
        self.fetch()
    }
}

/// Pulls the `node` of every edge out of the feed document.
///
/// Fails with [`ScheduleError::MissingEdges`] if the edge array is missing or
/// is not an array. Edges without a `node` are skipped.
pub fn extract_nodes(mut body: Value) -> Result<Vec<Value>, ScheduleError> {
    let edges = match body.pointer_mut(EDGES_POINTER).map(Value::take) {
        Some(Value::Array(edges)) => edges,
        _ => return Err(ScheduleError::MissingEdges),
    };

    let total = edges.len();
    let nodes: Vec<Value> = edges
        .into_iter()
        .filter_map(|mut edge| edge.get_mut("node").map(Value::take))
        .filter(|node| !node.is_null())
        .collect();

    if nodes.len() < total {
        debug!(skipped = total - nodes.len(), "Skipped edges without a node");
    }
    Ok(nodes)
}

/// Generates a short id attached to every log line of one fetch cycle.
pub fn generate_cycle_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
