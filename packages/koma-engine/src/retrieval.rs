use std::collections::HashMap;

use koma_domain::candidate::{self, Candidate};
use koma_index::qdrant::CandidateFilter;

use crate::{Engine, workflow::WorkflowState};

/// How candidate vectors are derived from the favorites. The first attempt
/// blends the favorites into a single centroid query; retries query each
/// favorite separately and merge the result sets, which surfaces items a
/// blended vector averages away.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy {
	Centroid,
	IndividualMerge,
}
impl Strategy {
	pub fn for_attempt(attempt: u32) -> Self {
		if attempt == 0 { Self::Centroid } else { Self::IndividualMerge }
	}
}

struct MergeSlot {
	candidate: Candidate,
	total: f32,
	hits: u32,
}
impl MergeSlot {
	fn average(&self) -> f32 {
		self.total / self.hits as f32
	}
}

/// Mean of the given vectors scaled to unit length. `None` when there is
/// nothing to average, the dimensions disagree, or the mean is the zero
/// vector.
pub fn normalized_centroid(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
	let dim = vectors.first()?.len();

	if vectors.iter().any(|vector| vector.len() != dim) {
		return None;
	}

	let mut centroid = vec![0.; dim];

	for vector in vectors {
		for (sum, component) in centroid.iter_mut().zip(vector) {
			*sum += component;
		}
	}

	let count = vectors.len() as f32;

	centroid.iter_mut().for_each(|component| *component /= count);

	let norm = centroid.iter().map(|component| component * component).sum::<f32>().sqrt();

	if norm == 0. {
		return None;
	}

	centroid.iter_mut().for_each(|component| *component /= norm);

	Some(centroid)
}

/// Merges per-favorite result sets, averaging the scores of items returned
/// by more than one query. Order is by average score descending; ties keep
/// first-seen order.
pub fn merge_ranked(batches: Vec<Vec<Candidate>>, limit: usize) -> Vec<Candidate> {
	let mut slots = <Vec<MergeSlot>>::new();
	let mut slot_of = <HashMap<u64, usize>>::new();

	for candidate in batches.into_iter().flatten() {
		match slot_of.get(&candidate.item.id) {
			Some(&at) => {
				let slot = &mut slots[at];

				slot.total += candidate.score;
				slot.hits += 1;
			},
			None => {
				let score = candidate.score;

				slot_of.insert(candidate.item.id, slots.len());
				slots.push(MergeSlot { candidate, total: score, hits: 1 });
			},
		}
	}

	slots.sort_by(|a, b| b.average().total_cmp(&a.average()));
	slots.truncate(limit);

	slots
		.into_iter()
		.map(|slot| {
			let score = slot.average();
			let mut candidate = slot.candidate;

			candidate.score = score;

			candidate
		})
		.collect()
}

impl Engine {
	/// Retrieval step. Fills the candidate set from the favorites and counts
	/// the attempt; an empty favorite set short-circuits to an empty
	/// candidate set so the rest of the workflow can degrade in one place.
	pub async fn retrieve(&self, mut state: WorkflowState) -> WorkflowState {
		let strategy = Strategy::for_attempt(state.attempt);
		let candidates = if state.favorites.is_empty() {
			tracing::warn!(
				run_id = %state.run_id,
				"No favorites resolved; retrieval yields nothing."
			);

			Vec::new()
		} else {
			match strategy {
				Strategy::Centroid => self.retrieve_centroid(&state).await,
				Strategy::IndividualMerge => self.retrieve_merged(&state).await,
			}
		};

		state.candidates = candidate::dedup_by_id(candidates);
		state.attempt += 1;

		tracing::info!(
			run_id = %state.run_id,
			?strategy,
			attempt = state.attempt,
			candidates = state.candidates.len(),
			"Retrieved candidates."
		);

		state
	}

	async fn retrieve_centroid(&self, state: &WorkflowState) -> Vec<Candidate> {
		let Some(vectors) = self.embed_favorites(state).await else {
			return Vec::new();
		};
		let Some(centroid) = normalized_centroid(&vectors) else {
			tracing::warn!(run_id = %state.run_id, "Favorite vectors have no usable centroid.");

			return Vec::new();
		};
		let filter = self.candidate_filter(state);

		match self
			.index
			.query(&centroid, &filter, self.cfg.retrieval.centroid_limit, None)
			.await
		{
			Ok(candidates) => candidates,
			Err(e) => {
				tracing::warn!(run_id = %state.run_id, "Centroid query failed: {e}");

				Vec::new()
			},
		}
	}

	async fn retrieve_merged(&self, state: &WorkflowState) -> Vec<Candidate> {
		let Some(vectors) = self.embed_favorites(state).await else {
			return Vec::new();
		};
		let filter = self.candidate_filter(state);
		let mut batches = Vec::with_capacity(vectors.len());

		for vector in &vectors {
			match self
				.index
				.query(vector, &filter, self.cfg.retrieval.per_favorite_limit, None)
				.await
			{
				Ok(candidates) => batches.push(candidates),
				Err(e) => tracing::warn!(run_id = %state.run_id, "Per-favorite query failed: {e}"),
			}
		}

		merge_ranked(batches, self.cfg.retrieval.merged_limit as usize)
	}

	async fn embed_favorites(&self, state: &WorkflowState) -> Option<Vec<Vec<f32>>> {
		let texts = state.favorites.iter().map(|item| item.text.clone()).collect::<Vec<_>>();

		match self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await {
			Ok(vectors) => Some(vectors),
			Err(e) => {
				tracing::warn!(run_id = %state.run_id, "Favorite embedding failed: {e}");

				None
			},
		}
	}

	fn candidate_filter(&self, state: &WorkflowState) -> CandidateFilter {
		let mut filter = CandidateFilter {
			exclude_ids: state.favorites.iter().map(|item| item.id).collect(),
			..Default::default()
		};

		if self.cfg.retrieval.filter.genres {
			filter.genres = state.profile.genres.clone();
		}
		if self.cfg.retrieval.filter.audiences {
			filter.audiences = vec![state.audience.as_str().to_owned()];
		}

		filter
	}
}

#[cfg(test)]
mod tests {
	use koma_domain::item::{CatalogItem, ItemAttrs};

	use super::*;

	fn candidate(id: u64, score: f32) -> Candidate {
		Candidate {
			item: CatalogItem {
				id,
				text: String::new(),
				attrs: ItemAttrs::default(),
				web_summary: None,
			},
			score,
		}
	}

	#[test]
	fn first_attempt_uses_the_centroid() {
		assert_eq!(Strategy::for_attempt(0), Strategy::Centroid);
		assert_eq!(Strategy::for_attempt(1), Strategy::IndividualMerge);
		assert_eq!(Strategy::for_attempt(7), Strategy::IndividualMerge);
	}

	#[test]
	fn centroid_is_the_normalized_mean() {
		let centroid =
			normalized_centroid(&[vec![1., 0., 0., 0.], vec![0., 1., 0., 0.]]).unwrap();
		let expected = 1. / 2_f32.sqrt();

		assert!((centroid[0] - expected).abs() < 1e-6);
		assert!((centroid[1] - expected).abs() < 1e-6);
		assert_eq!(&centroid[2..], &[0., 0.]);

		let norm = centroid.iter().map(|x| x * x).sum::<f32>().sqrt();

		assert!((norm - 1.).abs() < 1e-6);
	}

	#[test]
	fn degenerate_vector_sets_have_no_centroid() {
		assert!(normalized_centroid(&[]).is_none());
		assert!(normalized_centroid(&[vec![1., 0.], vec![1., 0., 0.]]).is_none());
		assert!(normalized_centroid(&[vec![1., 0.], vec![-1., 0.]]).is_none());
	}

	#[test]
	fn merge_averages_repeated_items() {
		let merged = merge_ranked(
			vec![vec![candidate(1, 0.9), candidate(2, 0.5)], vec![candidate(2, 0.7)]],
			10,
		);

		assert_eq!(merged.len(), 2);
		assert_eq!(merged[0].item.id, 1);
		assert_eq!(merged[1].item.id, 2);
		assert!((merged[1].score - 0.6).abs() < 1e-6);
	}

	#[test]
	fn merge_ties_keep_first_seen_order() {
		let merged = merge_ranked(
			vec![vec![candidate(5, 0.8), candidate(3, 0.8)], vec![candidate(9, 0.8)]],
			10,
		);

		assert_eq!(merged.iter().map(|c| c.item.id).collect::<Vec<_>>(), vec![5, 3, 9]);
	}

	#[test]
	fn merge_truncates_to_the_limit() {
		let merged = merge_ranked(
			vec![vec![candidate(1, 0.9), candidate(2, 0.8), candidate(3, 0.7)]],
			2,
		);

		assert_eq!(merged.iter().map(|c| c.item.id).collect::<Vec<_>>(), vec![1, 2]);
	}
}
