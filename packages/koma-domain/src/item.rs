use serde::{Deserialize, Serialize};

/// A catalog entry as stored in, and returned from, the vector index. The
/// engine only ever holds read-only copies.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CatalogItem {
	pub id: u64,
	/// Text body the embedding is computed from.
	pub text: String,
	pub attrs: ItemAttrs,
	/// Auxiliary text attached during enrichment. Never indexed.
	pub web_summary: Option<String>,
}
impl CatalogItem {
	pub fn display_title(&self) -> &str {
		if !self.attrs.title.is_empty() {
			return &self.attrs.title;
		}

		self.attrs
			.title_english
			.as_deref()
			.or(self.attrs.title_japanese.as_deref())
			.unwrap_or(&self.attrs.title)
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ItemAttrs {
	pub title: String,
	pub title_english: Option<String>,
	pub title_japanese: Option<String>,
	pub genres: Vec<String>,
	pub themes: Vec<String>,
	pub audiences: Vec<String>,
	pub status: Option<String>,
	pub authors: Vec<String>,
	pub cover_url: Option<String>,
	pub synopsis: Option<String>,
}
