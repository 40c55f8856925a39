use koma_domain::item::CatalogItem;
use koma_index::qdrant::CandidateFilter;

use crate::Engine;

/// Payload fields consulted for an exact title hit, in priority order.
pub const TITLE_FIELDS: [&str; 3] = ["title", "title_english", "title_japanese"];

impl Engine {
	/// Resolves the reader's favorite title to a catalog item. Exact matches
	/// on each title field are tried first, then a thresholded vector lookup.
	/// Lookup failures degrade to `None`; a missing favorite weakens
	/// retrieval but never aborts the run.
	pub async fn resolve_favorite(&self, title: &str) -> Option<CatalogItem> {
		let title = title.trim();

		if title.is_empty() {
			return None;
		}

		for field in TITLE_FIELDS {
			match self.index.exact_match(field, title).await {
				Ok(Some(item)) => {
					tracing::debug!(field, title, "Resolved favorite by exact match.");

					return Some(item);
				},
				Ok(None) => (),
				Err(e) => tracing::warn!(field, "Exact title lookup failed: {e}"),
			}
		}

		let texts = [title.to_owned()];
		let vectors =
			match self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await {
				Ok(vectors) => vectors,
				Err(e) => {
					tracing::warn!("Favorite title embedding failed: {e}");

					return None;
				},
			};
		let Some(vector) = vectors.first() else {
			return None;
		};

		match self
			.index
			.query(
				vector,
				&CandidateFilter::default(),
				1,
				Some(self.cfg.retrieval.title_score_threshold),
			)
			.await
		{
			Ok(hits) => hits.into_iter().next().map(|candidate| {
				tracing::debug!(
					title = candidate.item.display_title(),
					score = candidate.score,
					"Resolved favorite by vector lookup."
				);

				candidate.item
			}),
			Err(e) => {
				tracing::warn!("Favorite vector lookup failed: {e}");

				None
			},
		}
	}
}
