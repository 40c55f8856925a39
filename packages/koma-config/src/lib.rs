mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Catalog, Config, EmbeddingProviderConfig, Enrichment, LlmProviderConfig, Providers, Qdrant,
	Recommendation, Retrieval, RetrievalFilter, SearchProviderConfig, Service, Storage, Workflow,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if !cfg.providers.generation.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be a finite number.".to_string(),
		});
	}
	if cfg.providers.generation.temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be zero or greater.".to_string(),
		});
	}
	if cfg.providers.websearch.max_results == 0 {
		return Err(Error::Validation {
			message: "providers.websearch.max_results must be greater than zero.".to_string(),
		});
	}

	let source = cfg.catalog.source.as_str();

	if !matches!(source, "json" | "mock" | "database") {
		return Err(Error::Validation {
			message: "catalog.source must be one of json, mock, or database.".to_string(),
		});
	}
	if source == "json" && cfg.catalog.path.is_none() {
		return Err(Error::Validation {
			message: "catalog.path must be set when catalog.source is json.".to_string(),
		});
	}
	if source == "mock" && cfg.catalog.mock_count == 0 {
		return Err(Error::Validation {
			message: "catalog.mock_count must be greater than zero.".to_string(),
		});
	}
	if cfg.catalog.batch_size == 0 {
		return Err(Error::Validation {
			message: "catalog.batch_size must be greater than zero.".to_string(),
		});
	}
	if !cfg.retrieval.title_score_threshold.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.title_score_threshold must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.retrieval.title_score_threshold) {
		return Err(Error::Validation {
			message: "retrieval.title_score_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.retrieval.centroid_limit == 0 {
		return Err(Error::Validation {
			message: "retrieval.centroid_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.per_favorite_limit == 0 {
		return Err(Error::Validation {
			message: "retrieval.per_favorite_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.merged_limit == 0 {
		return Err(Error::Validation {
			message: "retrieval.merged_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.recommendation.prompt_candidate_cap < 3 {
		return Err(Error::Validation {
			message: "recommendation.prompt_candidate_cap must be at least 3.".to_string(),
		});
	}
	if cfg.enrichment.snippets_per_item == 0 {
		return Err(Error::Validation {
			message: "enrichment.snippets_per_item must be greater than zero.".to_string(),
		});
	}
	if cfg.enrichment.snippet_chars == 0 {
		return Err(Error::Validation {
			message: "enrichment.snippet_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.workflow.max_attempts == 0 {
		return Err(Error::Validation {
			message: "workflow.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.workflow.max_steps == 0 {
		return Err(Error::Validation {
			message: "workflow.max_steps must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("generation", &cfg.providers.generation.api_key),
		("websearch", &cfg.providers.websearch.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.catalog.path.as_deref().map(|path| path.trim().is_empty()).unwrap_or(false) {
		cfg.catalog.path = None;
	}
}
