use std::collections::HashSet;

use serde::Deserialize;

use crate::{
	Engine, prompt,
	workflow::{Recommendation, WorkflowState},
};

/// Number of picks a finished run must carry whenever the candidate set
/// allows it.
pub const RECOMMENDED_COUNT: usize = 3;

/// Reason attached to backfilled picks.
const FALLBACK_REASON: &str = "Close match to the reader's favorites by catalog similarity.";

/// One entry of the model's ranking reply.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RankedPick {
	#[serde(default)]
	pub index: i64,
	#[serde(default)]
	pub reason: String,
}

/// Outcome of reading a ranking reply. `Unparseable` marks a reply with no
/// readable JSON block and is what later triggers a retry, so it stays
/// distinct from an empty but well-formed ranking.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedRanking {
	Ranked(Vec<RankedPick>),
	Unparseable,
}

#[derive(Debug, Default, Deserialize)]
struct RankingPayload {
	#[serde(default)]
	recommendations: Vec<RankedPick>,
}

/// First balanced `{...}` block of `text`. Brace counting skips string
/// literals, so braces inside reason texts never truncate the block.
pub fn extract_json_block(text: &str) -> Option<&str> {
	let start = text.find('{')?;
	let mut depth = 0_u32;
	let mut in_string = false;
	let mut escaped = false;

	for (offset, c) in text[start..].char_indices() {
		if in_string {
			match c {
				_ if escaped => escaped = false,
				'\\' => escaped = true,
				'"' => in_string = false,
				_ => (),
			}

			continue;
		}

		match c {
			'"' => in_string = true,
			'{' => depth += 1,
			'}' => {
				depth -= 1;

				if depth == 0 {
					return Some(&text[start..=start + offset]);
				}
			},
			_ => (),
		}
	}

	None
}

pub fn parse_ranking(reply: &str) -> ParsedRanking {
	let Some(block) = extract_json_block(reply) else {
		return ParsedRanking::Unparseable;
	};

	match serde_json::from_str::<RankingPayload>(block) {
		Ok(payload) => ParsedRanking::Ranked(payload.recommendations),
		Err(_) => ParsedRanking::Unparseable,
	}
}

/// Normalizes raw picks into at most [`RECOMMENDED_COUNT`] recommendations.
/// Out-of-range and duplicate indices are dropped, blank reasons replaced,
/// and the remainder backfilled with the first unused indices in order, so
/// the result is deterministic for a given reply.
pub fn repair(picks: Vec<RankedPick>, candidate_count: usize) -> Vec<Recommendation> {
	let mut used = HashSet::new();
	let mut recommendations = Vec::new();

	for pick in picks {
		let Ok(index) = usize::try_from(pick.index) else {
			continue;
		};

		if index < 1 || index > candidate_count || !used.insert(index) {
			continue;
		}

		let reason = if pick.reason.trim().is_empty() {
			FALLBACK_REASON.to_string()
		} else {
			pick.reason
		};

		recommendations.push(Recommendation { index, reason });

		if recommendations.len() == RECOMMENDED_COUNT {
			break;
		}
	}

	for index in 1..=candidate_count {
		if recommendations.len() >= RECOMMENDED_COUNT {
			break;
		}
		if used.insert(index) {
			recommendations.push(Recommendation { index, reason: FALLBACK_REASON.to_string() });
		}
	}

	recommendations
}

impl Engine {
	/// Generation step. Asks the model to rank the candidates, then repairs
	/// the reply into exactly three picks where possible. An unreadable
	/// reply leaves the recommendations empty, which the validator turns
	/// into a retry.
	pub async fn generate(&self, mut state: WorkflowState) -> WorkflowState {
		if state.candidates.is_empty() {
			tracing::info!(run_id = %state.run_id, "No candidates to rank; skipping generation.");

			state.recommendations = Vec::new();

			return state;
		}

		let prompt =
			prompt::ranking_prompt(&state, self.cfg.recommendation.prompt_candidate_cap as usize);
		let parsed = match self
			.providers
			.generation
			.complete(&self.cfg.providers.generation, &prompt)
			.await
		{
			Ok(reply) => parse_ranking(&reply),
			Err(e) => {
				tracing::warn!(run_id = %state.run_id, "Ranking completion failed: {e}");

				ParsedRanking::Unparseable
			},
		};

		state.recommendations = match parsed {
			ParsedRanking::Ranked(picks) => repair(picks, state.candidates.len()),
			ParsedRanking::Unparseable => {
				tracing::warn!(
					run_id = %state.run_id,
					"Ranking reply unusable; leaving recommendations empty."
				);

				Vec::new()
			},
		};

		tracing::info!(
			run_id = %state.run_id,
			recommendations = state.recommendations.len(),
			"Generated recommendations."
		);

		state
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pick(index: i64, reason: &str) -> RankedPick {
		RankedPick { index, reason: reason.to_string() }
	}

	#[test]
	fn block_extraction_balances_nested_braces() {
		let text = "sure, here you go: {\"a\": {\"b\": 1}} trailing";

		assert_eq!(extract_json_block(text), Some("{\"a\": {\"b\": 1}}"));
	}

	#[test]
	fn block_extraction_ignores_braces_inside_strings() {
		let text = "{\"reason\": \"loves {dark} arcs\"}";

		assert_eq!(extract_json_block(text), Some(text));
	}

	#[test]
	fn unbalanced_text_has_no_block() {
		assert_eq!(extract_json_block("no json here"), None);
		assert_eq!(extract_json_block("{\"open\": ["), None);
	}

	#[test]
	fn missing_recommendations_key_is_an_empty_ranking() {
		assert_eq!(parse_ranking("{\"other\": 1}"), ParsedRanking::Ranked(Vec::new()));
	}

	#[test]
	fn garbage_replies_are_unparseable() {
		assert_eq!(parse_ranking("I would pick the first three."), ParsedRanking::Unparseable);
		assert_eq!(parse_ranking("{\"recommendations\": \"three\"}"), ParsedRanking::Unparseable);
	}

	#[test]
	fn repair_drops_out_of_range_and_duplicate_indices() {
		let picks = vec![pick(2, "good"), pick(2, "again"), pick(99, "out"), pick(0, "zero")];
		let recommendations = repair(picks, 5);

		assert_eq!(recommendations.len(), RECOMMENDED_COUNT);
		assert_eq!(recommendations[0].index, 2);
		assert_eq!(recommendations[0].reason, "good");
		// Backfill takes the first unused indices in order.
		assert_eq!(recommendations[1].index, 1);
		assert_eq!(recommendations[2].index, 3);
	}

	#[test]
	fn repair_replaces_blank_reasons() {
		let recommendations = repair(vec![pick(1, "  ")], 3);

		assert_eq!(recommendations[0].index, 1);
		assert!(!recommendations[0].reason.trim().is_empty());
	}

	#[test]
	fn repair_caps_at_three_picks() {
		let picks = vec![pick(1, "a"), pick(2, "b"), pick(3, "c"), pick(4, "d")];

		assert_eq!(repair(picks, 5).len(), RECOMMENDED_COUNT);
	}

	#[test]
	fn small_candidate_sets_stay_short() {
		let recommendations = repair(Vec::new(), 2);

		assert_eq!(
			recommendations.iter().map(|rec| rec.index).collect::<Vec<_>>(),
			vec![1, 2]
		);
	}
}
