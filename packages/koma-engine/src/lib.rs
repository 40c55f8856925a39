pub mod enrich;
pub mod favorite;
pub mod generate;
pub mod ingest;
pub mod prompt;
pub mod retrieval;
pub mod validate;
pub mod workflow;

use std::{future::Future, pin::Pin, sync::Arc};

use koma_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, SearchProviderConfig};
use koma_domain::{candidate::Candidate, item::CatalogItem};
use koma_index::qdrant::{CandidateFilter, QdrantIndex};
use koma_providers::{embedding, generation, websearch};

pub use generate::{ParsedRanking, RECOMMENDED_COUNT, RankedPick, extract_json_block};
pub use retrieval::Strategy;
pub use workflow::{Recommendation, Step, WorkflowState};

pub type EngineResult<T> = Result<T, EngineError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

pub trait WebSearchProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a SearchProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>>;
}

/// Read/write surface of the catalog vector index. The workflow only ever
/// reads; ingestion is the one writer.
pub trait CatalogIndex
where
	Self: Send + Sync,
{
	fn is_empty<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<bool>>;

	fn upsert<'a>(
		&'a self,
		items: &'a [CatalogItem],
		vectors: &'a [Vec<f32>],
	) -> BoxFuture<'a, color_eyre::Result<()>>;

	fn exact_match<'a>(
		&'a self,
		field: &'a str,
		value: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<CatalogItem>>>;

	fn query<'a>(
		&'a self,
		vector: &'a [f32],
		filter: &'a CandidateFilter,
		limit: u32,
		score_threshold: Option<f32>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Candidate>>>;
}

#[derive(Debug)]
pub enum EngineError {
	Catalog { message: String },
	Index { message: String },
	Provider { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
	pub websearch: Arc<dyn WebSearchProvider>,
}

pub struct Engine {
	pub cfg: Config,
	pub index: Arc<dyn CatalogIndex>,
	pub providers: Providers,
}

struct DefaultProviders;

impl std::fmt::Display for EngineError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Catalog { message } => write!(f, "Catalog error: {message}"),
			Self::Index { message } => write!(f, "Index error: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
		}
	}
}

impl std::error::Error for EngineError {}

impl From<koma_catalog::Error> for EngineError {
	fn from(err: koma_catalog::Error) -> Self {
		Self::Catalog { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for EngineError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl GenerationProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generation::complete(cfg, prompt))
	}
}

impl WebSearchProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a SearchProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>> {
		Box::pin(websearch::search(cfg, query))
	}
}

impl CatalogIndex for QdrantIndex {
	fn is_empty<'a>(&'a self) -> BoxFuture<'a, color_eyre::Result<bool>> {
		Box::pin(async move { Ok(QdrantIndex::is_empty(self).await?) })
	}

	fn upsert<'a>(
		&'a self,
		items: &'a [CatalogItem],
		vectors: &'a [Vec<f32>],
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move { Ok(self.upsert_items(items, vectors).await?) })
	}

	fn exact_match<'a>(
		&'a self,
		field: &'a str,
		value: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<CatalogItem>>> {
		Box::pin(async move { Ok(QdrantIndex::exact_match(self, field, value).await?) })
	}

	fn query<'a>(
		&'a self,
		vector: &'a [f32],
		filter: &'a CandidateFilter,
		limit: u32,
		score_threshold: Option<f32>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Candidate>>> {
		Box::pin(async move {
			Ok(QdrantIndex::query(self, vector, filter, limit, score_threshold).await?)
		})
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
		websearch: Arc<dyn WebSearchProvider>,
	) -> Self {
		Self { embedding, generation, websearch }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { embedding: provider.clone(), generation: provider.clone(), websearch: provider }
	}
}

impl Engine {
	pub fn new(cfg: Config, index: Arc<dyn CatalogIndex>) -> Self {
		Self { cfg, index, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, index: Arc<dyn CatalogIndex>, providers: Providers) -> Self {
		Self { cfg, index, providers }
	}
}
