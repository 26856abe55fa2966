//! GraphQL client for the cup index service.
//!
//! The index keeps a view of every cup in the Tub, ordered by outstanding
//! debt (`art`) descending, with soft-deleted cups filtered out. The keeper
//! uses it in indexed mode to grab the top-K cups worth biting without
//! walking the whole ledger id space.
//!
//! The ordering is trusted as-is: the index is assumed to reflect debt state
//! as of the triggering block. The keeper does not re-verify it.

use alloy::primitives::U256;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Query template; the placeholder is replaced with the configured top-K.
const CUPS_QUERY: &str = r#"
{
  allCups(condition: {deleted: false}, orderBy: ART_DESC, first: TOP_K) {
    totalCount
    nodes {
      id
      art
    }
  }
}
"#;

/// A cup as reported by the index: id plus its raw debt amount (Wad).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedCup {
    pub id: u64,
    pub art: U256,
}

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "allCups")]
    all_cups: AllCups,
}

#[derive(Debug, Deserialize)]
struct AllCups {
    #[serde(rename = "totalCount")]
    total_count: u64,
    nodes: Vec<CupNode>,
}

#[derive(Debug, Deserialize)]
struct CupNode {
    id: u64,
    /// Debt amount as a decimal string (Wad-scaled integer).
    art: String,
}

/// Cup index API client.
#[derive(Debug, Clone)]
pub struct CupIndexClient {
    client: reqwest::Client,
    url: String,
}

impl CupIndexClient {
    /// Create a client against the given GraphQL endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, std::time::Duration::from_secs(10))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            url: url.into(),
        }
    }

    /// Endpoint this client queries.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch up to `top` cups with the largest debt, deleted cups excluded.
    ///
    /// A malformed node is skipped with a warning; an unreachable or
    /// error-bearing endpoint is a hard error for the caller to handle.
    #[instrument(skip(self))]
    pub async fn fetch_top_cups(&self, top: usize) -> Result<Vec<IndexedCup>> {
        let query = CUPS_QUERY.replace("TOP_K", &top.to_string());
        debug!(url = %self.url, top, "Querying cup index");

        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .context("cup index request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("cup index returned {}: {}", status, body));
        }

        let body = response.text().await.context("cup index body read failed")?;
        let cups = parse_cups_response(&body)?;
        info!(count = cups.len(), "Cup index returned candidates");
        Ok(cups)
    }
}

/// Decode a GraphQL response body into the candidate list.
///
/// Split out from the HTTP path so decoding is testable offline.
pub fn parse_cups_response(body: &str) -> Result<Vec<IndexedCup>> {
    let response: GraphQlResponse =
        serde_json::from_str(body).context("malformed cup index response")?;

    if let Some(errors) = response.errors {
        let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
        return Err(anyhow!("cup index query failed: {}", messages.join("; ")));
    }

    let all_cups = response
        .data
        .ok_or_else(|| anyhow!("cup index response missing data"))?
        .all_cups;

    debug!(total = all_cups.total_count, "Decoding cup index nodes");

    let mut cups = Vec::with_capacity(all_cups.nodes.len());
    for node in all_cups.nodes {
        match node.art.parse::<U256>() {
            Ok(art) => cups.push(IndexedCup { id: node.id, art }),
            Err(e) => {
                warn!(cup = node.id, art = %node.art, error = %e, "Skipping cup with undecodable art");
            }
        }
    }
    Ok(cups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(nodes: &str, total: usize) -> String {
        format!(
            r#"{{"data":{{"allCups":{{"totalCount":{},"nodes":[{}]}}}}}}"#,
            total, nodes
        )
    }

    #[test]
    fn test_parse_cups_sorted_by_art() {
        let body = body(
            r#"{"id":3,"art":"5000000000000000000000"},{"id":17,"art":"1000000000000000000"}"#,
            2,
        );
        let cups = parse_cups_response(&body).unwrap();
        assert_eq!(cups.len(), 2);
        assert_eq!(cups[0].id, 3);
        assert_eq!(
            cups[0].art,
            U256::from(5000u64) * U256::from(10u64).pow(U256::from(18))
        );
        assert_eq!(cups[1].id, 17);
    }

    #[test]
    fn test_parse_skips_malformed_art() {
        let body = body(
            r#"{"id":1,"art":"not-a-number"},{"id":2,"art":"42"}"#,
            2,
        );
        let cups = parse_cups_response(&body).unwrap();
        assert_eq!(cups.len(), 1);
        assert_eq!(cups[0].id, 2);
        assert_eq!(cups[0].art, U256::from(42));
    }

    #[test]
    fn test_parse_empty_result() {
        let cups = parse_cups_response(&body("", 0)).unwrap();
        assert!(cups.is_empty());
    }

    #[test]
    fn test_parse_graphql_errors_are_hard_errors() {
        let body = r#"{"data":null,"errors":[{"message":"field allCups not found"}]}"#;
        let err = parse_cups_response(body).unwrap_err();
        assert!(err.to_string().contains("allCups"));
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(parse_cups_response("<html>502</html>").is_err());
    }

    #[test]
    fn test_query_embeds_top() {
        let query = CUPS_QUERY.replace("TOP_K", "500");
        assert!(query.contains("first: 500"));
        assert!(query.contains("deleted: false"));
        assert!(query.contains("ART_DESC"));
    }
}
