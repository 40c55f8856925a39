use koma_domain::{
	audience::Audience, candidate::Candidate, item::CatalogItem, profile::UserProfile,
};
use uuid::Uuid;

use crate::Engine;

/// A ranked pick referencing the candidate set by 1-based position.
#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
	pub index: usize,
	pub reason: String,
}

#[derive(Clone, Debug)]
pub struct WorkflowState {
	pub run_id: Uuid,
	pub profile: UserProfile,
	pub audience: Audience,
	pub favorites: Vec<CatalogItem>,
	pub candidates: Vec<Candidate>,
	/// Number of retrieval passes executed so far.
	pub attempt: u32,
	pub recommendations: Vec<Recommendation>,
	pub quality: f32,
	pub needs_retry: bool,
}
impl WorkflowState {
	/// Resolves each recommendation back to its candidate. Entries whose
	/// index no longer lands in the candidate set are silently dropped.
	pub fn recommended_items(&self) -> Vec<(&Candidate, &Recommendation)> {
		self.recommendations
			.iter()
			.filter_map(|rec| {
				let candidate = rec.index.checked_sub(1).and_then(|at| self.candidates.get(at))?;

				Some((candidate, rec))
			})
			.collect()
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
	Retrieve,
	Enrich,
	Generate,
	Validate,
	Done,
}

/// Pure transition table. The validator is the only gate that can send the
/// run back to retrieval, and it stops asking once the attempt cap is
/// reached, so the loop always terminates.
pub fn next_step(step: Step, state: &WorkflowState) -> Step {
	match step {
		Step::Retrieve => Step::Enrich,
		Step::Enrich => Step::Generate,
		Step::Generate => Step::Validate,
		Step::Validate if state.needs_retry => Step::Retrieve,
		Step::Validate | Step::Done => Step::Done,
	}
}

impl Engine {
	pub async fn resolve_profile(&self, profile: UserProfile) -> WorkflowState {
		let audience = Audience::for_profile(profile.age_bracket, profile.gender);
		let favorites = match self.resolve_favorite(&profile.favorite_title).await {
			Some(item) => vec![item],
			None => Vec::new(),
		};
		let state = WorkflowState {
			run_id: Uuid::new_v4(),
			profile,
			audience,
			favorites,
			candidates: Vec::new(),
			attempt: 0,
			recommendations: Vec::new(),
			quality: 0.0,
			needs_retry: false,
		};

		tracing::info!(
			run_id = %state.run_id,
			audience = state.audience.as_str(),
			favorites = state.favorites.len(),
			"Resolved profile."
		);

		state
	}

	/// Drives the workflow to a terminal state. Backend failures degrade
	/// inside the individual steps; this function never fails.
	pub async fn recommend(&self, profile: UserProfile) -> WorkflowState {
		let mut state = self.resolve_profile(profile).await;
		let mut step = Step::Retrieve;

		for _ in 0..self.cfg.workflow.max_steps {
			if step == Step::Done {
				break;
			}

			state = self.run_step(step, state).await;
			step = next_step(step, &state);
		}

		if step != Step::Done {
			tracing::warn!(
				run_id = %state.run_id,
				"Step budget exhausted before reaching a terminal state."
			);
		}
		tracing::info!(
			run_id = %state.run_id,
			attempts = state.attempt,
			recommendations = state.recommendations.len(),
			quality = state.quality,
			"Workflow finished."
		);

		state
	}

	async fn run_step(&self, step: Step, state: WorkflowState) -> WorkflowState {
		match step {
			Step::Retrieve => self.retrieve(state).await,
			Step::Enrich => self.enrich(state).await,
			Step::Generate => self.generate(state).await,
			Step::Validate => self.validate(state).await,
			Step::Done => state,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn state(needs_retry: bool) -> WorkflowState {
		WorkflowState {
			run_id: Uuid::new_v4(),
			profile: UserProfile::from_tokens("male", "18~30", Vec::new(), String::new()),
			audience: Audience::Seinen,
			favorites: Vec::new(),
			candidates: Vec::new(),
			attempt: 1,
			recommendations: Vec::new(),
			quality: 0.0,
			needs_retry,
		}
	}

	#[test]
	fn forward_transitions_are_fixed() {
		let state = state(false);

		assert_eq!(next_step(Step::Retrieve, &state), Step::Enrich);
		assert_eq!(next_step(Step::Enrich, &state), Step::Generate);
		assert_eq!(next_step(Step::Generate, &state), Step::Validate);
		assert_eq!(next_step(Step::Done, &state), Step::Done);
	}

	#[test]
	fn validation_branches_on_the_retry_flag() {
		assert_eq!(next_step(Step::Validate, &state(true)), Step::Retrieve);
		assert_eq!(next_step(Step::Validate, &state(false)), Step::Done);
	}

	#[test]
	fn recommended_items_drop_dangling_indices() {
		let mut state = state(false);

		state.recommendations = vec![
			Recommendation { index: 1, reason: "ok".to_string() },
			Recommendation { index: 5, reason: "dangling".to_string() },
		];

		assert!(state.recommended_items().is_empty());
	}
}
