use crate::{BatchIter, CatalogSource, Error, Result};

/// Placeholder for the production relational catalog. Every call fails fast so
/// a misconfigured deployment surfaces before any workflow runs, instead of
/// quietly serving an empty index.
pub struct DatabaseCatalogSource;
impl DatabaseCatalogSource {
	pub fn new() -> Self {
		Self
	}
}
impl Default for DatabaseCatalogSource {
	fn default() -> Self {
		Self::new()
	}
}
impl CatalogSource for DatabaseCatalogSource {
	fn total_count(&mut self) -> Result<u64> {
		Err(Error::Unimplemented("database catalog total count".to_string()))
	}

	fn record_batches(&mut self, _batch_size: usize) -> Result<BatchIter<'_>> {
		Err(Error::Unimplemented("database catalog batch streaming".to_string()))
	}
}
