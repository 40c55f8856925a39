use serde::Deserialize;

use crate::{Engine, generate, prompt, workflow::WorkflowState};

/// Outcome of the validation step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Verdict {
	pub quality: f32,
	pub needs_retry: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Grade {
	score: i64,
	pass: bool,
}

/// Reads a grade out of the judge's reply. A reply with no readable JSON
/// block fails open to a passing verdict; a readable block with missing
/// keys grades as zero and not passing.
fn grade_from_reply(reply: &str) -> Verdict {
	let Some(block) = generate::extract_json_block(reply) else {
		return Verdict { quality: 0.8, needs_retry: false };
	};
	let Ok(grade) = serde_json::from_str::<Grade>(block) else {
		return Verdict { quality: 0.8, needs_retry: false };
	};

	Verdict { quality: grade.score.clamp(0, 100) as f32 / 100., needs_retry: !grade.pass }
}

impl Engine {
	/// Validation step. Applies the verdict to the state; the decision table
	/// itself lives in `judge`.
	pub async fn validate(&self, mut state: WorkflowState) -> WorkflowState {
		let verdict = self.judge(&state).await;

		state.quality = verdict.quality;
		state.needs_retry = verdict.needs_retry;

		tracing::info!(
			run_id = %state.run_id,
			quality = state.quality,
			needs_retry = state.needs_retry,
			"Validated recommendations."
		);

		state
	}

	/// Decision table, evaluated strictly in order. The attempt cap comes
	/// first so a capped run terminates even when it carries fewer than
	/// three picks.
	async fn judge(&self, state: &WorkflowState) -> Verdict {
		if state.attempt >= self.cfg.workflow.max_attempts {
			return Verdict { quality: 0.8, needs_retry: false };
		}
		if state.recommendations.len() < generate::RECOMMENDED_COUNT {
			return Verdict { quality: 0.6, needs_retry: true };
		}

		let prompt = prompt::grading_prompt(state);

		match self.providers.generation.complete(&self.cfg.providers.generation, &prompt).await {
			Ok(reply) => grade_from_reply(&reply),
			Err(e) => {
				tracing::warn!(run_id = %state.run_id, "Grading completion failed: {e}");

				Verdict { quality: 0.8, needs_retry: false }
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn grades_map_score_to_quality_and_pass_to_retry() {
		let verdict = grade_from_reply("{\"score\": 88, \"pass\": true}");

		assert_eq!(verdict, Verdict { quality: 0.88, needs_retry: false });

		let verdict = grade_from_reply("{\"score\": 40, \"pass\": false}");

		assert_eq!(verdict, Verdict { quality: 0.4, needs_retry: true });
	}

	#[test]
	fn out_of_range_scores_are_clamped() {
		assert_eq!(grade_from_reply("{\"score\": 250, \"pass\": true}").quality, 1.);
		assert_eq!(grade_from_reply("{\"score\": -10, \"pass\": false}").quality, 0.);
	}

	#[test]
	fn missing_keys_grade_as_a_failing_zero() {
		let verdict = grade_from_reply("{\"comment\": \"looks fine\"}");

		assert_eq!(verdict, Verdict { quality: 0., needs_retry: true });
	}

	#[test]
	fn unreadable_replies_fail_open() {
		let verdict = grade_from_reply("the picks look great to me");

		assert_eq!(verdict, Verdict { quality: 0.8, needs_retry: false });
	}
}
