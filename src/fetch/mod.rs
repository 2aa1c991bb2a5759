// src/fetch/mod.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::table::{parse_csv, Table};

/// Anything that can produce a [`Table`] for a source URL.
///
/// The refresh cache is generic over this so it can be driven without a network.
#[async_trait]
pub trait TableSource: Send + Sync + 'static {
    async fn fetch_table(&self, url: &str) -> Result<Table>;
}

/// Fetches CSV over HTTP(S). No retries: the first failure is returned.
#[derive(Clone, Debug, Default)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TableSource for HttpSource {
    #[instrument(level = "info", skip(self))]
    async fn fetch_table(&self, url: &str) -> Result<Table> {
        let url = Url::parse(url).with_context(|| format!("invalid source URL {}", url))?;
        let body = get_bytes(&self.client, &url).await?;
        debug!(%url, bytes = body.len(), "downloaded CSV");
        parse_csv(&body).with_context(|| format!("parsing CSV from {}", url))
    }
}

async fn get_bytes(client: &Client, url: &Url) -> Result<Vec<u8>> {
    Ok(client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status from {}", url))?
        .bytes()
        .await
        .with_context(|| format!("Reading body from {}", url))?
        .to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::init_test_logging;
    use std::net::SocketAddr;
    use warp::{http::StatusCode, Filter};

    /// Serve `/ok.csv` and a 403 at `/private.csv` on an ephemeral port.
    fn spawn_csv_server() -> SocketAddr {
        let ok = warp::path("ok.csv").map(|| "item_name,sessions\nA,10\nA,5\nB,7\n");
        let private = warp::path("private.csv")
            .map(|| warp::reply::with_status("forbidden", StatusCode::FORBIDDEN));
        let broken = warp::path("broken.csv").map(|| "a,b\n1,2,3\n");
        let (addr, server) =
            warp::serve(ok.or(private).or(broken)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    #[tokio::test]
    async fn fetches_and_parses_csv() -> Result<()> {
        init_test_logging();
        let addr = spawn_csv_server();
        let table = HttpSource::default()
            .fetch_table(&format!("http://{}/ok.csv", addr))
            .await?;
        assert_eq!(table.columns, vec!["item_name", "sessions"]);
        assert_eq!(table.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn http_error_status_is_a_fetch_error() {
        init_test_logging();
        let addr = spawn_csv_server();
        let err = HttpSource::default()
            .fetch_table(&format!("http://{}/private.csv", addr))
            .await
            .unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("403"), "{msg}");
    }

    #[tokio::test]
    async fn malformed_csv_is_a_fetch_error() {
        init_test_logging();
        let addr = spawn_csv_server();
        let err = HttpSource::default()
            .fetch_table(&format!("http://{}/broken.csv", addr))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("parsing CSV"));
    }

    #[tokio::test]
    async fn invalid_url_fails_before_request() {
        init_test_logging();
        let err = HttpSource::default()
            .fetch_table("not a url")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid source URL"));
    }
}
