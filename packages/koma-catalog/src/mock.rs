use koma_domain::item::ItemAttrs;

use crate::{BatchIter, CatalogRecord, CatalogSource, Result};

const GENRES: [&str; 10] = [
	"Romance",
	"Action",
	"Drama",
	"Fantasy",
	"Comedy",
	"Thriller",
	"Sports",
	"Mystery",
	"Slice of Life",
	"Horror",
];
const AUDIENCES: [&str; 5] = ["Kids", "Shounen", "Shoujo", "Seinen", "Josei"];
const STATUSES: [&str; 3] = ["Publishing", "Finished", "On Hiatus"];
const AUTHORS: [&str; 8] =
	["Aoyama", "Hoshino", "Ikeda", "Kawaguchi", "Mori", "Nakamura", "Sato", "Tanaka"];

/// Deterministic stand-in for a large production catalog. Record `n` always
/// carries the same attributes, so tests can assert on exact content.
pub struct MockCatalogSource {
	count: u64,
}
impl MockCatalogSource {
	pub fn new(count: u64) -> Self {
		Self { count }
	}

	pub fn record(id: u64) -> CatalogRecord {
		let slot = id as usize;
		let genre = GENRES[slot % GENRES.len()];
		let audience = AUDIENCES[slot % AUDIENCES.len()];
		let status = STATUSES[slot % STATUSES.len()];
		let author = AUTHORS[slot % AUTHORS.len()];

		CatalogRecord {
			id,
			attrs: ItemAttrs {
				title: format!("Mock Manga {id:06}"),
				title_english: Some(format!("Mock Manga {id:06}")),
				title_japanese: None,
				genres: vec![genre.to_string()],
				themes: Vec::new(),
				audiences: vec![audience.to_string()],
				status: Some(status.to_string()),
				authors: vec![author.to_string()],
				cover_url: Some(format!("https://example.com/manga/cover_{id:06}.jpg")),
				synopsis: Some(format!("Entry {id} of the mock catalog, a {genre} story.")),
			},
		}
	}
}
impl CatalogSource for MockCatalogSource {
	fn total_count(&mut self) -> Result<u64> {
		Ok(self.count)
	}

	fn record_batches(&mut self, batch_size: usize) -> Result<BatchIter<'_>> {
		let batch_size = batch_size.max(1) as u64;
		let count = self.count;
		let batches = (0..count).step_by(batch_size as usize).map(move |start| {
			(start + 1..=count.min(start + batch_size)).map(Self::record).collect()
		});

		Ok(Box::new(batches))
	}
}
