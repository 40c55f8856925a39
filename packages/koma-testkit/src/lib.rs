mod error;

pub use error::{Error, Result};

use std::{
	cmp::Ordering, collections::hash_map::DefaultHasher, env, hash::Hasher, sync::Mutex, thread,
};

use koma_domain::{
	candidate::Candidate,
	item::{CatalogItem, ItemAttrs},
};
use koma_index::qdrant::CandidateFilter;
use qdrant_client::Qdrant;
use serde_json::json;
use tokio::runtime::Builder;
use uuid::Uuid;

/// Deterministic pseudo-embedding. Token hashes are folded into fixed
/// buckets, so texts sharing words point in similar directions while
/// repeated calls stay bit-identical.
pub fn stable_vector(text: &str, dim: usize) -> Vec<f32> {
	let mut out = vec![0.0_f32; dim.max(1)];

	for token in text.split_whitespace() {
		let mut hasher = DefaultHasher::new();

		hasher.write(token.to_lowercase().as_bytes());

		let hash = hasher.finish();
		let bucket = (hash % out.len() as u64) as usize;
		let sign = if hash & 1 == 0 { 1.0 } else { -1.0 };

		out[bucket] += sign;
	}

	let norm = out.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm > 0.0 {
		for value in &mut out {
			*value /= norm;
		}
	} else {
		out[0] = 1.0;
	}

	out
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if a.len() != b.len() || a.is_empty() {
		return 0.0;
	}

	let mut dot = 0.0_f32;
	let mut norm_a = 0.0_f32;
	let mut norm_b = 0.0_f32;

	for (x, y) in a.iter().zip(b.iter()) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	let denom = norm_a.sqrt() * norm_b.sqrt();

	if denom > 0.0 { dot / denom } else { 0.0 }
}

/// Minimal catalog item for tests. The embedded text mirrors what catalog
/// ingestion produces: title line, genre line, synopsis line.
pub fn item(id: u64, title: &str, genres: &[&str], audiences: &[&str]) -> CatalogItem {
	let genres = genres.iter().map(|genre| genre.to_string()).collect::<Vec<_>>();
	let synopsis = format!("Story {id} about {}.", title.to_lowercase());
	let text = format!("{title}\n{}\n{synopsis}", genres.join(", "));

	CatalogItem {
		id,
		text,
		attrs: ItemAttrs {
			title: title.to_string(),
			genres,
			audiences: audiences.iter().map(|audience| audience.to_string()).collect(),
			synopsis: Some(synopsis),
			..Default::default()
		},
		web_summary: None,
	}
}

/// Ranking reply in the shape the generation backend is prompted for.
pub fn ranking_reply(entries: &[(u32, &str)]) -> String {
	let recommendations = entries
		.iter()
		.map(|(index, reason)| json!({ "index": index, "reason": reason }))
		.collect::<Vec<_>>();

	json!({ "recommendations": recommendations }).to_string()
}

/// Grading reply in the shape the quality check is prompted for.
pub fn grading_reply(score: u32, pass: bool) -> String {
	json!({ "score": score, "pass": pass }).to_string()
}

/// In-memory stand-in for the vector index. Brute-force cosine scoring over
/// upserted entries, with the same filter semantics as the real index.
#[derive(Default)]
pub struct MemoryIndex {
	entries: Mutex<Vec<MemoryEntry>>,
}

struct MemoryEntry {
	item: CatalogItem,
	vector: Vec<f32>,
}

impl MemoryIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn upsert(&self, item: CatalogItem, vector: Vec<f32>) {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		if let Some(entry) = entries.iter_mut().find(|entry| entry.item.id == item.id) {
			entry.item = item;
			entry.vector = vector;
		} else {
			entries.push(MemoryEntry { item, vector });
		}
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn exact_match(&self, field: &str, value: &str) -> Option<CatalogItem> {
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries
			.iter()
			.find(|entry| title_field(&entry.item, field).is_some_and(|title| title == value))
			.map(|entry| entry.item.clone())
	}

	pub fn query(
		&self,
		vector: &[f32],
		filter: &CandidateFilter,
		limit: usize,
		score_threshold: Option<f32>,
	) -> Vec<Candidate> {
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let mut scored = entries
			.iter()
			.filter(|entry| passes_filter(&entry.item, filter))
			.map(|entry| Candidate {
				item: entry.item.clone(),
				score: cosine_similarity(vector, &entry.vector),
			})
			.filter(|candidate| {
				score_threshold.is_none_or(|threshold| candidate.score >= threshold)
			})
			.collect::<Vec<_>>();

		scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
		scored.truncate(limit);

		scored
	}
}

fn title_field<'a>(item: &'a CatalogItem, field: &str) -> Option<&'a str> {
	match field {
		"title" => Some(item.attrs.title.as_str()),
		"title_english" => item.attrs.title_english.as_deref(),
		"title_japanese" => item.attrs.title_japanese.as_deref(),
		_ => None,
	}
}

fn passes_filter(item: &CatalogItem, filter: &CandidateFilter) -> bool {
	if filter.exclude_ids.contains(&item.id) {
		return false;
	}
	if !filter.genres.is_empty()
		&& !filter.genres.iter().any(|genre| item.attrs.genres.contains(genre))
	{
		return false;
	}
	if !filter.audiences.is_empty()
		&& !filter.audiences.iter().any(|audience| item.attrs.audiences.contains(audience))
	{
		return false;
	}

	true
}

pub fn env_qdrant_url() -> Option<String> {
	env::var("KOMA_QDRANT_URL").ok()
}

/// Uniquely named Qdrant collection for live tests, which opt in via
/// `KOMA_QDRANT_URL`. The drop path runs best-effort cleanup on its own
/// runtime so a panicking test still releases the collection.
pub struct TestCollection {
	url: String,
	name: String,
	cleaned: bool,
}
impl TestCollection {
	pub fn new(url: &str, prefix: &str) -> Self {
		let name = format!("{prefix}_{}", Uuid::new_v4().simple());

		Self { url: url.to_string(), name, cleaned: false }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub async fn cleanup(mut self) -> Result<()> {
		let result = delete_collection(&self.url, &self.name).await;

		self.cleaned = true;

		result
	}
}
impl Drop for TestCollection {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let url = self.url.clone();
		let name = self.name.clone();
		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test collection cleanup failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(delete_collection(&url, &name)) {
				eprintln!("Test collection cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

async fn delete_collection(url: &str, name: &str) -> Result<()> {
	let client = Qdrant::from_url(url)
		.build()
		.map_err(|err| Error::Message(format!("Failed to build Qdrant client: {err}.")))?;

	client.delete_collection(name.to_string()).await?;

	Ok(())
}
