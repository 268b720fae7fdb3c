use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::models::{SearchResponse, StoryItem};

pub const API_ENDPOINT: &str = "https://hn.algolia.com/api/v1/search?query=";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("malformed search response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("search worker panicked")]
    Panicked,
}

// Port the fetch coordinator talks to, so tests can swap the network out
pub trait SearchApi: Send + Sync {
    fn search(&self, term: &str) -> Result<Vec<StoryItem>, FetchError>;
}

#[derive(Clone)]
pub struct HackerNewsClient {
    client: Client,
    endpoint: String,
}

impl HackerNewsClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hacker_stories/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SearchApi for HackerNewsClient {
    fn search(&self, term: &str) -> Result<Vec<StoryItem>, FetchError> {
        let url = search_url(&self.endpoint, term);
        debug!(%url, "searching stories");

        let response = self.client.get(&url).send().map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        let body = response.text().map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;

        let stories = parse_hits(&body)?;
        info!(term, count = stories.len(), "loaded stories");
        Ok(stories)
    }
}

// The endpoint already ends in `query=`, the term is appended percent-encoded
pub fn search_url(endpoint: &str, term: &str) -> String {
    format!("{}{}", endpoint, urlencoding::encode(term))
}

// Only a body without a `hits` array fails as a whole. A hit that has no
// usable objectID has no identity to list or remove by and is skipped.
pub fn parse_hits(body: &str) -> Result<Vec<StoryItem>, FetchError> {
    let response: SearchResponse = serde_json::from_str(body)?;

    let mut stories = Vec::with_capacity(response.hits.len());
    for hit in &response.hits {
        match StoryItem::deserialize(hit) {
            Ok(story) => stories.push(story),
            Err(e) => warn!(error = %e, "skipping hit without a usable objectID"),
        }
    }
    Ok(stories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    // Answers exactly one HTTP request and hands back the request line
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();

            let request = String::from_utf8_lossy(&request).to_string();
            request.lines().next().unwrap_or_default().to_string()
        });

        (format!("http://{}/api/v1/search?query=", addr), handle)
    }

    // Local test server, so proxy settings from the environment must not apply
    fn local_client(endpoint: String) -> HackerNewsClient {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .no_proxy()
            .build()
            .unwrap();
        HackerNewsClient { client, endpoint }
    }

    #[test]
    fn new_keeps_endpoint() {
        let client = HackerNewsClient::new(API_ENDPOINT, Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint(), API_ENDPOINT);
    }

    #[test]
    fn search_url_percent_encodes_term() {
        assert_eq!(search_url(API_ENDPOINT, "react"), "https://hn.algolia.com/api/v1/search?query=react");
        assert_eq!(
            search_url(API_ENDPOINT, "c++ & rust?"),
            "https://hn.algolia.com/api/v1/search?query=c%2B%2B%20%26%20rust%3F"
        );
    }

    #[test]
    fn parse_hits_reads_only_hits() {
        let stories = parse_hits(r#"{"hits":[{"objectID":1,"title":"React","url":"","author":"a","points":3}],"page":0}"#).unwrap();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].title, "React");
    }

    #[test]
    fn parse_hits_keeps_hits_with_odd_fields() {
        let stories = parse_hits(
            r#"{"hits":[{"objectID":1,"title":"React","points":5},{"objectID":2,"title":"Bad","points":"12","num_comments":-1}]}"#,
        )
        .unwrap();

        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].points, 5);
        assert_eq!(stories[1].title, "Bad");
        assert_eq!(stories[1].points, 0);
        assert_eq!(stories[1].num_comments, None);
    }

    #[test]
    fn parse_hits_skips_hits_without_object_id() {
        let stories = parse_hits(r#"{"hits":[{"title":"orphan"},{"objectID":"7","title":"kept"},42]}"#).unwrap();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].title, "kept");
    }

    #[test]
    fn parse_hits_rejects_malformed_bodies() {
        assert!(matches!(parse_hits("<html>"), Err(FetchError::Decode(_))));
        assert!(matches!(parse_hits(r#"{"nbHits": 0}"#), Err(FetchError::Decode(_))));
        assert!(matches!(parse_hits(r#"{"hits": {"objectID": 1}}"#), Err(FetchError::Decode(_))));
    }

    #[test]
    fn client_fetches_and_decodes_hits() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"hits":[{"objectID":"1","title":"React","url":"https://react.dev","author":"dan","num_comments":5,"points":80}]}"#,
        );
        let client = local_client(endpoint);

        let stories = client.search("react hooks").unwrap();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].author, "dan");

        let request_line = server.join().unwrap();
        assert!(request_line.starts_with("GET /api/v1/search?query=react%20hooks "), "{}", request_line);
    }

    #[test]
    fn client_reports_transport_failure() {
        // Grab a free port, then close it so the connection is refused
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = local_client(format!("http://{}/api/v1/search?query=", addr));
        let err = client.search("react").unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }), "{:?}", err);
    }

    #[test]
    fn client_reports_error_status() {
        let (endpoint, server) = serve_once("HTTP/1.1 500 Internal Server Error", "{}");
        let client = local_client(endpoint);

        let err = client.search("react").unwrap_err();
        assert!(matches!(err, FetchError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR));
        server.join().unwrap();
    }
}
