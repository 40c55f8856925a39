use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use koma_catalog::{
	CatalogSource, database::DatabaseCatalogSource, json::JsonCatalogSource,
	mock::MockCatalogSource,
};
use koma_config::Config;
use koma_domain::profile::UserProfile;
use koma_engine::{Engine, WorkflowState};
use koma_index::qdrant::QdrantIndex;

#[derive(Debug, Parser)]
#[command(about, rename_all = "kebab", version)]
pub struct Args {
	/// Path to the TOML configuration file.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Catalog source override, one of json, mock, or database.
	#[arg(long, value_name = "SOURCE")]
	pub source: Option<String>,
	/// Catalog file override for the json source.
	#[arg(long, value_name = "FILE")]
	pub catalog: Option<String>,
	/// Re-ingest the catalog even when the collection is already populated.
	#[arg(long)]
	pub reindex: bool,
	/// Reader gender, male or female.
	#[arg(long, default_value = "unspecified")]
	pub gender: String,
	/// Reader age bracket, e.g. 18~30.
	#[arg(long, default_value = "18~30")]
	pub age: String,
	/// Preferred genres, comma separated or repeated.
	#[arg(long, value_delimiter = ',')]
	pub genres: Vec<String>,
	/// Favorite manga title the recommendations are anchored on.
	#[arg(long)]
	pub favorite: String,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let mut cfg = koma_config::load(&args.config)?;

	init_tracing(&cfg)?;

	if let Some(source) = &args.source {
		cfg.catalog.source = source.clone();
	}
	if let Some(path) = &args.catalog {
		cfg.catalog.path = Some(path.clone());
	}

	koma_config::validate(&cfg)?;

	tracing::info!(
		embedding = cfg.providers.embedding.provider_id,
		generation = cfg.providers.generation.provider_id,
		websearch = cfg.providers.websearch.provider_id,
		"Provider stack configured."
	);

	let index = QdrantIndex::new(&cfg.storage.qdrant)?;

	index.ensure_collection().await?;

	let mut source = catalog_source(&cfg)?;
	let profile =
		UserProfile::from_tokens(&args.gender, &args.age, args.genres, args.favorite);
	let engine = Engine::new(cfg, Arc::new(index));

	engine.ensure_catalog(source.as_mut(), args.reindex).await?;

	let state = engine.recommend(profile).await;

	print_report(&state);

	Ok(())
}

fn init_tracing(cfg: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&cfg.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
	Ok(())
}

fn catalog_source(cfg: &Config) -> color_eyre::Result<Box<dyn CatalogSource>> {
	match cfg.catalog.source.as_str() {
		"json" => {
			let path = cfg.catalog.path.as_deref().ok_or_else(|| {
				eyre::eyre!("catalog.path must be set when catalog.source is json.")
			})?;

			Ok(Box::new(JsonCatalogSource::new(path)))
		},
		"mock" => Ok(Box::new(MockCatalogSource::new(cfg.catalog.mock_count as u64))),
		"database" => Ok(Box::new(DatabaseCatalogSource::new())),
		other => Err(eyre::eyre!("Unknown catalog source {other:?}.")),
	}
}

fn print_report(state: &WorkflowState) {
	println!("=== Recommendations ===");

	let picks = state.recommended_items();

	if picks.is_empty() {
		println!("No recommendations could be produced for this profile.");
	}

	for (at, (candidate, rec)) in picks.iter().enumerate() {
		let attrs = &candidate.item.attrs;
		let genres =
			if attrs.genres.is_empty() { "N/A".to_string() } else { attrs.genres.join(", ") };

		println!("\n{}. {} ({genres})", at + 1, candidate.item.display_title());

		if !attrs.authors.is_empty() {
			println!("   Author: {}", attrs.authors.join(", "));
		}

		println!("   Similarity: {:.3}", candidate.score);
		println!("   Reason: {}", rec.reason);
	}

	println!("\nQuality score: {:.0}/100", state.quality * 100.);
}
