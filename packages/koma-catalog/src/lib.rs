pub mod database;
pub mod json;
pub mod mock;

mod error;

pub use error::{Error, Result};

use serde::Deserialize;

use koma_domain::item::{CatalogItem, ItemAttrs};

pub type BatchIter<'a> = Box<dyn Iterator<Item = Vec<CatalogRecord>> + 'a>;

/// A paged feed of raw catalog records. The engine never reads from a source
/// directly; sources exist only to seed the vector index.
pub trait CatalogSource {
	fn total_count(&mut self) -> Result<u64>;
	fn record_batches(&mut self, batch_size: usize) -> Result<BatchIter<'_>>;
}

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogRecord {
	pub id: u64,
	#[serde(flatten)]
	pub attrs: ItemAttrs,
}
impl CatalogRecord {
	/// The embedded text body is the title, the genre list, and the synopsis,
	/// one per line. Everything else stays attribute-only.
	pub fn into_item(self) -> CatalogItem {
		let mut parts = vec![self.attrs.title.clone()];

		if !self.attrs.genres.is_empty() {
			parts.push(self.attrs.genres.join(", "));
		}
		if let Some(synopsis) = self.attrs.synopsis.as_deref() {
			parts.push(synopsis.to_string());
		}

		CatalogItem { id: self.id, text: parts.join("\n"), attrs: self.attrs, web_summary: None }
	}
}
