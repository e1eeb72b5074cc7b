//! Web search via the DuckDuckGo Instant Answer API.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use switchboard_config::WebSearchConfig;
use tracing::debug;

use crate::BoxFuture;
use crate::registry::{ProviderError, ToolDescriptor, ToolInvoker, ToolParams};

pub const TOOL_NAME: &str = "web_search";

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(TOOL_NAME, "Search the web for current information using DuckDuckGo")
        .with_parameter("query", "The search query")
}

/// One formatted search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub body: String,
    pub url: String,
}

/// Searches the web for the `query` parameter and returns numbered results as text.
pub struct WebSearchTool {
    client: Client,
    endpoint: String,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(config: &WebSearchConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            max_results: config.max_results,
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        debug!(query, endpoint = %self.endpoint, "web search");
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Upstream(format!("DuckDuckGo search error: {e}")))?;

        if !resp.status().is_success() {
            return Err(ProviderError::Upstream(format!(
                "DuckDuckGo search error: HTTP {}",
                resp.status()
            )));
        }

        let body: InstantAnswer = resp
            .json()
            .await
            .map_err(|e| ProviderError::Upstream(format!("DuckDuckGo search error: {e}")))?;
        Ok(collect_hits(body, self.max_results))
    }
}

impl ToolInvoker for WebSearchTool {
    fn invoke(&self, params: ToolParams) -> BoxFuture<'_, Result<Value, ProviderError>> {
        Box::pin(async move {
            let query = params
                .get("query")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .ok_or_else(|| ProviderError::MissingParameter("query".to_string()))?;

            let hits = self.search(query).await?;
            Ok(Value::String(format_hits(query, &hits)))
        })
    }
}

/// Render hits as numbered blocks separated by blank lines.
pub fn format_hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for: {query}");
    }
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "{}. {}\n   {}\n   URL: {}",
                i + 1,
                hit.title,
                hit.body,
                hit.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn collect_hits(answer: InstantAnswer, limit: usize) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    if !answer.abstract_text.is_empty() {
        hits.push(SearchHit {
            title: if answer.heading.is_empty() {
                "No title".to_string()
            } else {
                answer.heading
            },
            body: answer.abstract_text,
            url: or_placeholder(answer.abstract_url, "No URL"),
        });
    }
    flatten_topics(answer.related_topics, &mut hits);
    hits.truncate(limit);
    hits
}

fn flatten_topics(topics: Vec<Topic>, hits: &mut Vec<SearchHit>) {
    for topic in topics {
        match topic {
            Topic::Group { topics } => flatten_topics(topics, hits),
            Topic::Entry { text, first_url } if !text.is_empty() => {
                // Entries read "Title - description".
                let (title, body) = match text.split_once(" - ") {
                    Some((title, body)) => (title.to_string(), body.to_string()),
                    None => (text.clone(), "No description".to_string()),
                };
                hits.push(SearchHit {
                    title,
                    body,
                    url: or_placeholder(first_url, "No URL"),
                });
            }
            Topic::Entry { .. } => {}
        }
    }
}

fn or_placeholder(value: String, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value
    }
}

#[derive(Debug, Default, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Topic {
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<Topic>,
    },
    Entry {
        #[serde(rename = "Text", default)]
        text: String,
        #[serde(rename = "FirstURL", default)]
        first_url: String,
    },
}
