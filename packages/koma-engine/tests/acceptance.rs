//! Workflow acceptance against a live Qdrant instance. Ignored by default;
//! set `KOMA_QDRANT_URL` and run with `--ignored`.

use std::{
	collections::VecDeque,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use serde_json::Map;

use koma_catalog::mock::MockCatalogSource;
use koma_config::{
	Catalog, Config, EmbeddingProviderConfig, LlmProviderConfig, Qdrant, SearchProviderConfig,
	Service, Storage,
};
use koma_domain::profile::UserProfile;
use koma_engine::{
	BoxFuture, EmbeddingProvider, Engine, GenerationProvider, Providers, WebSearchProvider,
};
use koma_index::qdrant::QdrantIndex;
use koma_testkit::{TestCollection, env_qdrant_url, grading_reply, ranking_reply, stable_vector};

const DIM: usize = 16;

struct StableEmbedding;
impl EmbeddingProvider for StableEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		let vectors = texts.iter().map(|text| stable_vector(text, DIM)).collect::<Vec<_>>();

		Box::pin(async move { Ok(vectors) })
	}
}

struct ScriptedGeneration {
	replies: Mutex<VecDeque<String>>,
	calls: Arc<AtomicUsize>,
}
impl GenerationProvider for ScriptedGeneration {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let reply = self
			.replies
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.pop_front()
			.unwrap_or_default();

		Box::pin(async move { Ok(reply) })
	}
}

struct StubSearch {
	snippets: Vec<String>,
}
impl WebSearchProvider for StubSearch {
	fn search<'a>(
		&'a self,
		_cfg: &'a SearchProviderConfig,
		_query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>> {
		let snippets = self.snippets.clone();

		Box::pin(async move { Ok(snippets) })
	}
}

fn live_config(url: &str, collection: &str) -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		storage: Storage {
			qdrant: Qdrant {
				url: url.to_string(),
				collection: collection.to_string(),
				vector_dim: DIM as u32,
			},
		},
		providers: koma_config::Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "openai".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embedding".to_string(),
				dimensions: DIM as u32,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			generation: LlmProviderConfig {
				provider_id: "openai".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test-generation".to_string(),
				temperature: 0.3,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			websearch: SearchProviderConfig {
				provider_id: "tavily".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/search".to_string(),
				max_results: 3,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		catalog: Catalog { source: "mock".to_string(), path: None, mock_count: 12, batch_size: 5 },
		retrieval: Default::default(),
		recommendation: Default::default(),
		enrichment: Default::default(),
		workflow: Default::default(),
	}
}

#[tokio::test]
#[ignore = "Requires external Qdrant. Set KOMA_QDRANT_URL to run."]
async fn recommendation_round_trip_against_qdrant() {
	let Some(url) = env_qdrant_url() else {
		eprintln!(
			"Skipping recommendation_round_trip_against_qdrant; set KOMA_QDRANT_URL to run this \
			 test."
		);
		return;
	};
	let collection = TestCollection::new(&url, "koma_acceptance");
	let cfg = live_config(&url, collection.name());
	let index = QdrantIndex::new(&cfg.storage.qdrant).expect("Failed to build Qdrant client.");

	index.ensure_collection().await.expect("Failed to create the collection.");

	let generation_calls = Arc::new(AtomicUsize::new(0));
	let replies = vec![
		ranking_reply(&[
			(1, "Nearest in catalog text."),
			(2, "Same genre rotation."),
			(3, "Alike in tone."),
		]),
		grading_reply(82, true),
	];
	let providers = Providers::new(
		Arc::new(StableEmbedding),
		Arc::new(ScriptedGeneration {
			replies: Mutex::new(replies.into()),
			calls: generation_calls.clone(),
		}),
		Arc::new(StubSearch { snippets: vec!["Catalog note.".to_string()] }),
	);
	let engine = Engine::with_providers(cfg, Arc::new(index), providers);
	let mut source = MockCatalogSource::new(12);
	let ingested = engine.ensure_catalog(&mut source, false).await.expect("Ingestion failed.");

	assert_eq!(ingested, 12);

	// The populated collection short-circuits a second pass.
	let skipped = engine.ensure_catalog(&mut source, false).await.expect("Ingestion failed.");

	assert_eq!(skipped, 0);

	let profile = UserProfile::from_tokens(
		"male",
		"18~30",
		vec!["Action".to_string()],
		"Mock Manga 000007".to_string(),
	);
	let state = engine.recommend(profile).await;

	assert_eq!(state.favorites.len(), 1);
	assert_eq!(state.favorites[0].id, 7);
	assert_eq!(state.attempt, 1);
	assert_eq!(state.recommendations.len(), 3);
	assert!((state.quality - 0.82).abs() < 1e-6);
	assert!(!state.needs_retry);
	assert!(state.candidates.iter().all(|candidate| candidate.item.id != 7));
	assert_eq!(generation_calls.load(Ordering::SeqCst), 2);

	collection.cleanup().await.expect("Failed to drop the test collection.");
}
