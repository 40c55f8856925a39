use koma_catalog::CatalogSource;

use crate::{Engine, EngineError, EngineResult};

impl Engine {
	/// Loads the catalog into the vector index, returning the number of
	/// ingested items. A populated index is left untouched unless `force` is
	/// set. Unlike the workflow steps this is setup, so failures surface as
	/// errors instead of degrading.
	pub async fn ensure_catalog(
		&self,
		source: &mut dyn CatalogSource,
		force: bool,
	) -> EngineResult<u64> {
		if !force {
			let empty = self
				.index
				.is_empty()
				.await
				.map_err(|e| EngineError::Index { message: e.to_string() })?;

			if !empty {
				tracing::info!("Catalog index already populated; skipping ingestion.");

				return Ok(0);
			}
		}

		let total = source.total_count()?;

		tracing::info!(total, "Ingesting catalog into the vector index.");

		let mut ingested = 0_u64;
		let batches = source.record_batches(self.cfg.catalog.batch_size as usize)?;

		for records in batches {
			let items = records.into_iter().map(|record| record.into_item()).collect::<Vec<_>>();
			let texts = items.iter().map(|item| item.text.clone()).collect::<Vec<_>>();
			let vectors =
				self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;

			if vectors.len() != items.len() {
				return Err(EngineError::Provider {
					message: format!(
						"Embedding provider returned {} vectors for {} items.",
						vectors.len(),
						items.len()
					),
				});
			}

			self.index
				.upsert(&items, &vectors)
				.await
				.map_err(|e| EngineError::Index { message: e.to_string() })?;

			ingested += items.len() as u64;

			tracing::info!(ingested, total, "Upserted a catalog batch.");
		}

		Ok(ingested)
	}
}
