use futures::future;

use crate::{Engine, prompt, workflow::WorkflowState};

/// Joins the leading snippets into one summary, truncating each to
/// `max_chars` characters. Snippets past `keep` are dropped.
pub fn summarize_snippets(snippets: &[String], keep: usize, max_chars: usize) -> String {
	snippets
		.iter()
		.take(keep)
		.map(|snippet| snippet.chars().take(max_chars).collect::<String>())
		.collect::<Vec<_>>()
		.join(" ")
}

impl Engine {
	/// Enrichment step. Attaches a web summary to the leading favorites and
	/// candidates, within the configured caps. Items past the caps and items
	/// whose search turns up nothing keep an empty summary; search failures
	/// never fail the step.
	pub async fn enrich(&self, mut state: WorkflowState) -> WorkflowState {
		let enrichment = &self.cfg.enrichment;
		let favorite_count = state.favorites.len().min(enrichment.max_favorites as usize);
		let candidate_count = state.candidates.len().min(enrichment.max_candidates as usize);
		let queries = state.favorites[..favorite_count]
			.iter()
			.map(|item| prompt::web_query(item.display_title()))
			.chain(
				state.candidates[..candidate_count]
					.iter()
					.map(|candidate| prompt::web_query(candidate.item.display_title())),
			)
			.collect::<Vec<_>>();
		let summaries =
			future::join_all(queries.iter().map(|query| self.fetch_summary(query))).await;
		let mut summaries = summaries.into_iter();

		for favorite in state.favorites.iter_mut().take(favorite_count) {
			favorite.web_summary = summaries.next().flatten();
		}
		for candidate in state.candidates.iter_mut().take(candidate_count) {
			candidate.item.web_summary = summaries.next().flatten();
		}

		tracing::info!(
			run_id = %state.run_id,
			favorites = favorite_count,
			candidates = candidate_count,
			"Enriched items with web summaries."
		);

		state
	}

	async fn fetch_summary(&self, query: &str) -> Option<String> {
		let enrichment = &self.cfg.enrichment;
		let snippets =
			match self.providers.websearch.search(&self.cfg.providers.websearch, query).await {
				Ok(snippets) => snippets,
				Err(e) => {
					tracing::warn!(query, "Web search failed: {e}");

					return None;
				},
			};
		let summary = summarize_snippets(
			&snippets,
			enrichment.snippets_per_item as usize,
			enrichment.snippet_chars as usize,
		);

		if summary.is_empty() { None } else { Some(summary) }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn summaries_truncate_each_snippet() {
		let snippets = vec!["abcdef".to_string(), "ghijkl".to_string()];

		assert_eq!(summarize_snippets(&snippets, 2, 4), "abcd ghij");
	}

	#[test]
	fn summaries_drop_snippets_past_the_cap() {
		let snippets =
			vec!["one".to_string(), "two".to_string(), "three".to_string()];

		assert_eq!(summarize_snippets(&snippets, 2, 100), "one two");
	}

	#[test]
	fn empty_snippet_sets_summarize_to_nothing() {
		assert_eq!(summarize_snippets(&[], 2, 100), "");
	}
}
