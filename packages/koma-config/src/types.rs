use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub catalog: Catalog,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub recommendation: Recommendation,
	#[serde(default)]
	pub enrichment: Enrichment,
	#[serde(default)]
	pub workflow: Workflow,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: LlmProviderConfig,
	pub websearch: SearchProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct SearchProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	#[serde(default = "default_search_max_results")]
	pub max_results: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Catalog {
	pub source: String,
	pub path: Option<String>,
	#[serde(default = "default_mock_count")]
	pub mock_count: u32,
	#[serde(default = "default_batch_size")]
	pub batch_size: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub title_score_threshold: f32,
	pub centroid_limit: u32,
	pub per_favorite_limit: u32,
	pub merged_limit: u32,
	pub filter: RetrievalFilter,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			title_score_threshold: 0.1,
			centroid_limit: 30,
			per_favorite_limit: 15,
			merged_limit: 30,
			filter: RetrievalFilter::default(),
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RetrievalFilter {
	pub genres: bool,
	pub audiences: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Recommendation {
	pub prompt_candidate_cap: u32,
}
impl Default for Recommendation {
	fn default() -> Self {
		Self { prompt_candidate_cap: 15 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Enrichment {
	pub max_candidates: u32,
	pub max_favorites: u32,
	pub snippets_per_item: u32,
	pub snippet_chars: u32,
}
impl Default for Enrichment {
	fn default() -> Self {
		Self { max_candidates: 8, max_favorites: 2, snippets_per_item: 2, snippet_chars: 200 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Workflow {
	pub max_attempts: u32,
	pub max_steps: u32,
}
impl Default for Workflow {
	fn default() -> Self {
		Self { max_attempts: 2, max_steps: 16 }
	}
}

fn default_search_max_results() -> u32 {
	3
}

fn default_mock_count() -> u32 {
	100
}

fn default_batch_size() -> u32 {
	64
}
