use std::{
	collections::HashSet,
	fs,
	path::{Path, PathBuf},
};

use tracing::info;

use crate::{BatchIter, CatalogRecord, CatalogSource, Error, Result};

/// Reads a JSON array of catalog records from disk. Records sharing a primary
/// title are collapsed to the first occurrence before anything is served.
pub struct JsonCatalogSource {
	path: PathBuf,
	records: Option<Vec<CatalogRecord>>,
}
impl JsonCatalogSource {
	pub fn new(path: impl AsRef<Path>) -> Self {
		Self { path: path.as_ref().to_path_buf(), records: None }
	}

	fn load(&mut self) -> Result<&[CatalogRecord]> {
		if self.records.is_none() {
			let raw = fs::read_to_string(&self.path)
				.map_err(|err| Error::ReadCatalog { path: self.path.clone(), source: err })?;
			let parsed: Vec<CatalogRecord> = serde_json::from_str(&raw)
				.map_err(|err| Error::ParseCatalog { path: self.path.clone(), source: err })?;
			let total = parsed.len();
			let mut seen = HashSet::new();
			let records: Vec<_> = parsed
				.into_iter()
				.filter(|record| seen.insert(record.attrs.title.clone()))
				.collect();

			if records.is_empty() {
				return Err(Error::EmptyCatalog { path: self.path.clone() });
			}

			info!(
				path = %self.path.display(),
				total,
				kept = records.len(),
				"Loaded catalog file."
			);

			self.records = Some(records);
		}

		Ok(self.records.as_deref().unwrap_or_default())
	}
}
impl CatalogSource for JsonCatalogSource {
	fn total_count(&mut self) -> Result<u64> {
		Ok(self.load()?.len() as u64)
	}

	fn record_batches(&mut self, batch_size: usize) -> Result<BatchIter<'_>> {
		let batch_size = batch_size.max(1);
		let records = self.load()?;

		Ok(Box::new(records.chunks(batch_size).map(<[CatalogRecord]>::to_vec)))
	}
}
