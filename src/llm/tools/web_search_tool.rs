//! `search` capability backed by the Qianfan AI search endpoint.

use crate::config::Endpoint;
use crate::error::Result;
use crate::llm::tools::tool::{string_arg, LlmTool, ToolArguments, ToolDescriptor, ToolOutput};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Top-level fields that may carry the search result, most specific first.
///
/// The upstream response shape has drifted between versions; the first field
/// present wins.
pub const SEARCH_RESULT_FIELDS: [&str; 6] =
    ["references", "results", "data", "content", "answer", "response"];

/// Tool for searching the web through an AI search endpoint
///
/// # Examples
///
/// ```ignore
/// use tool_dispatch::config::AppConfig;
/// use tool_dispatch::llm::tools::web_search_tool::WebSearchTool;
///
/// let config = AppConfig::from_env()?;
/// let tool = WebSearchTool::new(&config.search, config.request_timeout)?;
/// let output = tool.search("北京的旅游景区有哪些?").await;
/// ```
#[derive(Clone)]
pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl WebSearchTool {
    pub fn new(endpoint: &Endpoint, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.clone(),
        })
    }

    /// Run a search; every failure is reported as an error payload.
    pub async fn search(&self, query: &str) -> ToolOutput {
        if !self.endpoint.has_api_key() {
            return ToolOutput::error("search is not configured: QIANFAN_API_KEY is not set");
        }

        info!(query = %query, "Searching");
        let payload = json!({
            "messages": [{"role": "user", "content": query}],
            "stream": false
        });

        let response = match self
            .client
            .post(&self.endpoint.base_url)
            .bearer_auth(&self.endpoint.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Search request failed");
                return ToolOutput::error(format!("search request failed: {}", e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Search endpoint returned an error status");
            return ToolOutput::error(format!("search failed: HTTP {}", status.as_u16()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return ToolOutput::error(format!("search request failed: {}", e)),
        };

        match extract_content(&body) {
            Ok(content) => ToolOutput::Value(json!({ "content": content })),
            Err(message) => ToolOutput::Error(message),
        }
    }
}

/// Pull the useful text out of a raw search response body.
///
/// Strings are returned verbatim and any other JSON value compactly
/// serialized. A document with none of [`SEARCH_RESULT_FIELDS`] is returned
/// whole.
pub fn extract_content(body: &str) -> std::result::Result<String, String> {
    if body.trim().is_empty() {
        return Err("empty search response".to_string());
    }

    let document: Value = serde_json::from_str(body)
        .map_err(|e| format!("search response is not valid JSON: {}", e))?;

    let selected = document.as_object().and_then(|object| {
        SEARCH_RESULT_FIELDS
            .iter()
            .find_map(|field| object.get(*field).map(|value| (*field, value)))
    });

    let value = match selected {
        Some((field, value)) => {
            debug!(field = field, "Using search result field");
            value
        }
        None => {
            debug!("No known result field, returning whole response");
            &document
        }
    };

    Ok(render(value))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl LlmTool for WebSearchTool {
    async fn run(&self, args: &ToolArguments) -> Result<ToolOutput> {
        match string_arg(args, "query") {
            Some(query) => Ok(self.search(query).await),
            None => Ok(ToolOutput::error("query is required")),
        }
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function(
            "search",
            "Search the internet for up-to-date information. Use it for news, facts, places \
             and anything that may have changed recently.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query, in natural language"
                    }
                },
                "required": ["query"]
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tools::schema::validate_descriptor;
    use mockito::Matcher;

    fn tool(url: &str, api_key: &str) -> WebSearchTool {
        WebSearchTool::new(&Endpoint::new(api_key, url), Duration::from_secs(5)).unwrap()
    }

    fn query(text: &str) -> ToolArguments {
        json!({ "query": text }).as_object().cloned().unwrap()
    }

    #[test]
    fn test_descriptor() {
        let tool = tool("http://localhost", "key");
        let descriptor = tool.descriptor();

        assert_eq!(descriptor.name(), "search");
        assert_eq!(descriptor.function.parameters["required"][0], "query");
        assert!(validate_descriptor(&descriptor).is_ok());
    }

    #[test]
    fn test_extract_prefers_earlier_fields() {
        let body = r#"{"answer": "later", "references": [{"title": "Forbidden City"}]}"#;
        assert_eq!(extract_content(body).unwrap(), r#"[{"title":"Forbidden City"}]"#);
    }

    #[test]
    fn test_extract_string_field_verbatim() {
        let body = r#"{"request_id": "r1", "content": "故宫、长城、颐和园"}"#;
        assert_eq!(extract_content(body).unwrap(), "故宫、长城、颐和园");
    }

    #[test]
    fn test_extract_without_known_field_returns_document() {
        let body = r#"{"request_id": "r1", "items": [1, 2]}"#;
        let content = extract_content(body).unwrap();
        let reparsed: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(reparsed, json!({"request_id": "r1", "items": [1, 2]}));
    }

    #[test]
    fn test_extract_non_object_document() {
        assert_eq!(extract_content("[1,2,3]").unwrap(), "[1,2,3]");
        assert_eq!(extract_content(r#""plain""#).unwrap(), "plain");
    }

    #[test]
    fn test_extract_errors() {
        assert_eq!(extract_content("  ").unwrap_err(), "empty search response");
        assert!(extract_content("<html>").unwrap_err().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_search_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/ai_search")
            .match_header("authorization", "Bearer qianfan-key")
            .match_body(Matcher::PartialJson(json!({
                "messages": [{"role": "user", "content": "北京的旅游景区有哪些?"}],
                "stream": false
            })))
            .with_status(200)
            .with_body(r#"{"references": [{"title": "故宫"}], "answer": "ignored"}"#)
            .create_async()
            .await;

        let tool = tool(&format!("{}/v2/ai_search", server.url()), "qianfan-key");
        let output = tool.run(&query("北京的旅游景区有哪些?")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(output, ToolOutput::Value(json!({"content": r#"[{"title":"故宫"}]"#})));
    }

    #[tokio::test]
    async fn test_search_http_error_is_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let output = tool(&server.url(), "key").search("rust").await;

        mock.assert_async().await;
        assert_eq!(output, ToolOutput::error("search failed: HTTP 403"));
    }

    #[tokio::test]
    async fn test_search_empty_body_is_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/").with_status(200).with_body("").create_async().await;

        let output = tool(&server.url(), "key").search("rust").await;

        mock.assert_async().await;
        assert_eq!(output, ToolOutput::error("empty search response"));
    }

    #[tokio::test]
    async fn test_search_malformed_json_is_payload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let output = tool(&server.url(), "key").search("rust").await;
        assert!(output.is_error());
    }

    #[tokio::test]
    async fn test_search_connection_failure_is_payload() {
        let output = tool("http://127.0.0.1:1", "key").search("rust").await;
        match output {
            ToolOutput::Error(message) => assert!(message.starts_with("search request failed")),
            other => panic!("Expected error payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/").expect(0).create_async().await;

        let output = tool(&server.url(), "").search("rust").await;

        mock.assert_async().await;
        assert!(matches!(output, ToolOutput::Error(m) if m.contains("QIANFAN_API_KEY")));
    }

    #[tokio::test]
    async fn test_missing_query_is_payload() {
        let output = tool("http://localhost", "key").run(&ToolArguments::new()).await.unwrap();
        assert_eq!(output, ToolOutput::error("query is required"));
    }
}
