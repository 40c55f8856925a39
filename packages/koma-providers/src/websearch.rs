use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Runs one web search and returns the result snippets in rank order.
pub async fn search(cfg: &koma_config::SearchProviderConfig, query: &str) -> Result<Vec<String>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"query": query,
		"max_results": cfg.max_results,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_search_response(json)
}

fn parse_search_response(json: Value) -> Result<Vec<String>> {
	let results = json
		.get("results")
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Search response is missing results array."))?;

	Ok(results
		.iter()
		.filter_map(|item| item.get("content"))
		.filter_map(|content| content.as_str())
		.map(str::to_string)
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn collects_snippets_in_rank_order() {
		let json = serde_json::json!({
			"results": [
				{ "content": "first snippet", "url": "https://a" },
				{ "title": "no content field" },
				{ "content": "second snippet" }
			]
		});
		let snippets = parse_search_response(json).expect("parse failed");
		assert_eq!(snippets, vec!["first snippet".to_string(), "second snippet".to_string()]);
	}
}
