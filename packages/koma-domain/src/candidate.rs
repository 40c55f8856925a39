use std::collections::HashSet;

use crate::item::CatalogItem;

/// A catalog item annotated with the relevance score of the query that
/// returned it.
#[derive(Clone, Debug)]
pub struct Candidate {
	pub item: CatalogItem,
	pub score: f32,
}

/// Drops repeated identifiers, keeping the first occurrence. Candidate sets
/// must never contain the same item twice.
pub fn dedup_by_id(candidates: Vec<Candidate>) -> Vec<Candidate> {
	let mut seen = HashSet::new();

	candidates.into_iter().filter(|candidate| seen.insert(candidate.item.id)).collect()
}
