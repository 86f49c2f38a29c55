//! RMB exchange-rate quotes from the Juhe finance API.
//!
//! Not part of the assistant's default tool set; it is used directly by the
//! `exchange_rate` demo and can be registered explicitly.

use crate::config::Endpoint;
use crate::error::Result;
use crate::llm::tools::tool::{string_arg, LlmTool, ToolArguments, ToolDescriptor, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    result: Value,
}

#[derive(Clone)]
pub struct ExchangeRateTool {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl ExchangeRateTool {
    pub fn new(endpoint: &Endpoint, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.clone(),
        })
    }

    /// Fetch the quote table. `rate_type` and `bank` are passed through as-is;
    /// empty values ask for the upstream defaults.
    pub async fn quote(&self, rate_type: &str, bank: &str) -> ToolOutput {
        if !self.endpoint.has_api_key() {
            return ToolOutput::error("exchange rates are not configured: JUHE_API_KEY is not set");
        }

        info!(rate_type = %rate_type, bank = %bank, "Requesting exchange rates");
        let url = format!(
            "{}?key={}&type={}&bank={}",
            self.endpoint.base_url,
            urlencoding::encode(&self.endpoint.api_key),
            urlencoding::encode(rate_type),
            urlencoding::encode(bank)
        );

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return ToolOutput::error(format!("exchange rate request failed: {}", e)),
        };
        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "Exchange rate request failed");
            return ToolOutput::error(format!(
                "exchange rate request failed: HTTP {}",
                response.status().as_u16()
            ));
        }

        match response.json::<QuoteResponse>().await {
            Ok(quote) if quote.error_code == 0 => ToolOutput::Value(quote.result),
            Ok(quote) => {
                warn!(error_code = quote.error_code, reason = %quote.reason, "Exchange rate API error");
                ToolOutput::error(format!("exchange rate API error {}: {}", quote.error_code, quote.reason))
            }
            Err(e) => ToolOutput::error(format!("unreadable exchange rate response: {}", e)),
        }
    }
}

#[async_trait]
impl LlmTool for ExchangeRateTool {
    async fn run(&self, args: &ToolArguments) -> Result<ToolOutput> {
        let rate_type = string_arg(args, "type").unwrap_or_default();
        let bank = string_arg(args, "bank").unwrap_or_default();
        Ok(self.quote(rate_type, bank).await)
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function(
            "exchange_rate",
            "Look up current RMB exchange rates published by Chinese banks",
            json!({
                "type": "object",
                "properties": {
                    "type": {
                        "type": "string",
                        "description": "Quote type code; leave empty for the default table"
                    },
                    "bank": {
                        "type": "string",
                        "description": "Bank code; leave empty for the default bank"
                    }
                },
                "required": []
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tools::schema::validate_descriptor;
    use mockito::Matcher;

    fn tool(url: &str, key: &str) -> ExchangeRateTool {
        ExchangeRateTool::new(&Endpoint::new(key, url), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_descriptor() {
        let descriptor = tool("http://localhost", "key").descriptor();
        assert_eq!(descriptor.name(), "exchange_rate");
        assert!(validate_descriptor(&descriptor).is_ok());
    }

    #[tokio::test]
    async fn test_quote_returns_result_table() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/finance/exchange/rmbquot")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("key".into(), "juhe-key".into()),
                Matcher::UrlEncoded("type".into(), "".into()),
                Matcher::UrlEncoded("bank".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"resultcode":"200","reason":"SUCCESSED!","error_code":0,
                   "result":[{"data1":{"name":"美元","bankConversionPri":"710.52"}}]}"#,
            )
            .create_async()
            .await;

        let tool = tool(&format!("{}/finance/exchange/rmbquot", server.url()), "juhe-key");
        let args = json!({"bank": "1"}).as_object().cloned().unwrap();
        let output = tool.run(&args).await.unwrap();

        mock.assert_async().await;
        assert_eq!(output.into_value()[0]["data1"]["name"], "美元");
    }

    #[tokio::test]
    async fn test_api_error_code_is_payload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"reason":"KEY ERROR!","error_code":10001,"result":null}"#)
            .create_async()
            .await;

        let output = tool(&server.url(), "bad-key").quote("", "").await;
        assert_eq!(output, ToolOutput::error("exchange rate API error 10001: KEY ERROR!"));
    }

    #[tokio::test]
    async fn test_http_error_is_payload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let output = tool(&server.url(), "key").quote("", "").await;
        assert_eq!(output, ToolOutput::error("exchange rate request failed: HTTP 502"));
    }

    #[tokio::test]
    async fn test_missing_key_is_payload() {
        let output = tool("http://127.0.0.1:1", "").quote("", "").await;
        assert!(matches!(output, ToolOutput::Error(m) if m.contains("JUHE_API_KEY")));
    }
}
