use std::collections::HashMap;

use koma_domain::{
	candidate::Candidate,
	item::{CatalogItem, ItemAttrs},
};
use qdrant_client::{
	client::Payload,
	qdrant::{
		value::Kind, Condition, CreateCollectionBuilder, CreateFieldIndexCollection, Distance,
		FieldType, Filter, PointStruct, Query, QueryPointsBuilder, ScoredPoint,
		UpsertPointsBuilder, Value, VectorParamsBuilder,
	},
};
use serde_json::Value as JsonValue;

use crate::{Error, Result};

/// Payload fields that carry a filter index. Keyword fields back exact-match
/// lookups and categorical conditions; `catalog_id` backs exclusion filters.
pub const FILTER_INDEX_FIELDS: [(&str, FieldType); 7] = [
	("title", FieldType::Keyword),
	("title_english", FieldType::Keyword),
	("title_japanese", FieldType::Keyword),
	("status", FieldType::Keyword),
	("audiences", FieldType::Keyword),
	("genres", FieldType::Keyword),
	("catalog_id", FieldType::Integer),
];

/// Attribute constraints applied to a nearest-neighbour query. `exclude_ids`
/// always applies; the categorical conditions are added only when non-empty,
/// each as an any-of match.
#[derive(Clone, Debug, Default)]
pub struct CandidateFilter {
	pub exclude_ids: Vec<u64>,
	pub genres: Vec<String>,
	pub audiences: Vec<String>,
}

pub struct QdrantIndex {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantIndex {
	pub fn new(cfg: &koma_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		let builder = CreateCollectionBuilder::new(self.collection.clone())
			.vectors_config(VectorParamsBuilder::new(self.vector_dim as u64, Distance::Cosine));

		self.client.create_collection(builder).await?;

		for (field_name, field_type) in FILTER_INDEX_FIELDS {
			let request = CreateFieldIndexCollection {
				collection_name: self.collection.clone(),
				wait: Some(true),
				field_name: field_name.to_string(),
				field_type: Some(field_type as i32),
				field_index_params: None,
				ordering: None,
			};

			self.client.create_field_index(request).await?;
		}

		tracing::info!(
			collection = %self.collection,
			vector_dim = self.vector_dim,
			"Created vector collection."
		);

		Ok(())
	}

	pub async fn is_empty(&self) -> Result<bool> {
		let info = self.client.collection_info(&self.collection).await?;
		let points = info.result.and_then(|collection| collection.points_count).unwrap_or(0);

		Ok(points == 0)
	}

	pub async fn upsert_items(&self, items: &[CatalogItem], vectors: &[Vec<f32>]) -> Result<()> {
		if items.len() != vectors.len() {
			return Err(Error::InvalidArgument(format!(
				"Expected one vector per item, got {} items and {} vectors.",
				items.len(),
				vectors.len()
			)));
		}
		if items.is_empty() {
			return Ok(());
		}

		let mut points = Vec::with_capacity(items.len());

		for (item, vec) in items.iter().zip(vectors.iter()) {
			self.validate_vector_dim(vec)?;

			let payload = Payload::from(item_payload(item));

			points.push(PointStruct::new(item.id, vec.to_vec(), payload));
		}

		let upsert = UpsertPointsBuilder::new(self.collection.clone(), points).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	pub async fn exact_match(&self, field: &str, value: &str) -> Result<Option<CatalogItem>> {
		let filter = Filter::must([Condition::matches(field, value.to_string())]);
		// Without a query vector the points API returns matches in id order;
		// one hit is enough to resolve the lookup.
		let search = QueryPointsBuilder::new(self.collection.clone())
			.filter(filter)
			.limit(1)
			.with_payload(true);
		let response = self.client.query(search).await?;

		Ok(response.result.into_iter().next().and_then(|point| item_from_payload(&point.payload)))
	}

	pub async fn query(
		&self,
		vector: &[f32],
		filter: &CandidateFilter,
		limit: u32,
		score_threshold: Option<f32>,
	) -> Result<Vec<Candidate>> {
		self.validate_vector_dim(vector)?;

		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector.to_vec()))
			.filter(candidate_filter(filter))
			.limit(limit as u64)
			.with_payload(true);

		if let Some(threshold) = score_threshold {
			search = search.score_threshold(threshold);
		}

		let response = self.client.query(search).await?;
		let mut candidates = Vec::with_capacity(response.result.len());

		for point in response.result {
			let Some(candidate) = candidate_from_point(point) else {
				tracing::warn!(
					collection = %self.collection,
					"Skipped a result with malformed payload."
				);
				continue;
			};

			candidates.push(candidate);
		}

		Ok(candidates)
	}

	fn validate_vector_dim(&self, vec: &[f32]) -> Result<()> {
		if vec.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Embedding dimension {} does not match configured vector_dim {}.",
				vec.len(),
				self.vector_dim
			)));
		}

		Ok(())
	}
}

fn candidate_filter(filter: &CandidateFilter) -> Filter {
	let mut must = Vec::new();

	if !filter.genres.is_empty() {
		must.push(Condition::matches("genres", filter.genres.clone()));
	}
	if !filter.audiences.is_empty() {
		must.push(Condition::matches("audiences", filter.audiences.clone()));
	}

	let must_not = filter
		.exclude_ids
		.iter()
		.map(|id| Condition::matches("catalog_id", *id as i64))
		.collect();

	Filter { must, must_not, ..Default::default() }
}

fn item_payload(item: &CatalogItem) -> HashMap<String, Value> {
	let mut payload_map = HashMap::new();

	payload_map.insert("catalog_id".to_string(), Value::from(item.id as i64));
	payload_map.insert("text".to_string(), Value::from(item.text.clone()));
	payload_map.insert("title".to_string(), Value::from(item.attrs.title.clone()));
	if let Some(title) = &item.attrs.title_english {
		payload_map.insert("title_english".to_string(), Value::from(title.clone()));
	}
	if let Some(title) = &item.attrs.title_japanese {
		payload_map.insert("title_japanese".to_string(), Value::from(title.clone()));
	}
	payload_map
		.insert("genres".to_string(), Value::from(JsonValue::from(item.attrs.genres.clone())));
	payload_map
		.insert("themes".to_string(), Value::from(JsonValue::from(item.attrs.themes.clone())));
	payload_map.insert(
		"audiences".to_string(),
		Value::from(JsonValue::from(item.attrs.audiences.clone())),
	);
	payload_map
		.insert("authors".to_string(), Value::from(JsonValue::from(item.attrs.authors.clone())));
	if let Some(status) = &item.attrs.status {
		payload_map.insert("status".to_string(), Value::from(status.clone()));
	}
	if let Some(cover_url) = &item.attrs.cover_url {
		payload_map.insert("cover_url".to_string(), Value::from(cover_url.clone()));
	}
	if let Some(synopsis) = &item.attrs.synopsis {
		payload_map.insert("synopsis".to_string(), Value::from(synopsis.clone()));
	}

	payload_map
}

fn item_from_payload(payload: &HashMap<String, Value>) -> Option<CatalogItem> {
	let id = payload_u64(payload, "catalog_id")?;
	let title = payload_string(payload, "title")?;
	let attrs = ItemAttrs {
		title,
		title_english: payload_string(payload, "title_english"),
		title_japanese: payload_string(payload, "title_japanese"),
		genres: payload_string_list(payload, "genres"),
		themes: payload_string_list(payload, "themes"),
		audiences: payload_string_list(payload, "audiences"),
		status: payload_string(payload, "status"),
		authors: payload_string_list(payload, "authors"),
		cover_url: payload_string(payload, "cover_url"),
		synopsis: payload_string(payload, "synopsis"),
	};

	Some(CatalogItem {
		id,
		text: payload_string(payload, "text").unwrap_or_default(),
		attrs,
		web_summary: None,
	})
}

fn candidate_from_point(point: ScoredPoint) -> Option<Candidate> {
	let item = item_from_payload(&point.payload)?;

	Some(Candidate { item, score: point.score })
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}

fn payload_u64(payload: &HashMap<String, Value>, key: &str) -> Option<u64> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::IntegerValue(value)) => u64::try_from(*value).ok(),
		_ => None,
	}
}

fn payload_string_list(payload: &HashMap<String, Value>, key: &str) -> Vec<String> {
	let Some(value) = payload.get(key) else {
		return Vec::new();
	};
	let Some(Kind::ListValue(list)) = &value.kind else {
		return Vec::new();
	};

	list.values
		.iter()
		.filter_map(|entry| match &entry.kind {
			Some(Kind::StringValue(text)) => Some(text.to_string()),
			_ => None,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_item() -> CatalogItem {
		CatalogItem {
			id: 41,
			text: "Planetes\nSci-Fi, Slice of Life\nDebris collectors in orbit.".to_string(),
			attrs: ItemAttrs {
				title: "Planetes".to_string(),
				title_english: Some("Planetes".to_string()),
				title_japanese: Some("\u{30d7}\u{30e9}\u{30cd}\u{30c6}\u{30b9}".to_string()),
				genres: vec!["Sci-Fi".to_string(), "Slice of Life".to_string()],
				themes: vec!["Space".to_string()],
				audiences: vec!["Seinen".to_string()],
				status: Some("Finished".to_string()),
				authors: vec!["Makoto Yukimura".to_string()],
				cover_url: None,
				synopsis: Some("Debris collectors in orbit.".to_string()),
			},
			web_summary: None,
		}
	}

	#[test]
	fn payload_round_trips_item_fields() {
		let item = sample_item();
		let payload = item_payload(&item);
		let restored = item_from_payload(&payload).expect("Expected a complete payload.");

		assert_eq!(restored.id, item.id);
		assert_eq!(restored.text, item.text);
		assert_eq!(restored.attrs, item.attrs);
		assert!(restored.web_summary.is_none());
	}

	#[test]
	fn absent_optional_fields_stay_out_of_the_payload() {
		let mut item = sample_item();

		item.attrs.cover_url = None;
		item.attrs.synopsis = None;

		let payload = item_payload(&item);

		assert!(!payload.contains_key("cover_url"));
		assert!(!payload.contains_key("synopsis"));
	}

	#[test]
	fn malformed_payloads_are_dropped() {
		let mut payload = item_payload(&sample_item());

		payload.remove("title");

		let point = ScoredPoint { payload, score: 0.9, ..Default::default() };

		assert!(candidate_from_point(point).is_none());
	}

	#[test]
	fn exclusions_become_must_not_conditions() {
		let filter =
			CandidateFilter { exclude_ids: vec![3, 9], genres: Vec::new(), audiences: Vec::new() };
		let built = candidate_filter(&filter);

		assert!(built.must.is_empty());
		assert_eq!(
			built.must_not,
			vec![
				Condition::matches("catalog_id", 3_i64),
				Condition::matches("catalog_id", 9_i64),
			]
		);
	}

	#[test]
	fn categorical_conditions_are_any_of_matches() {
		let filter = CandidateFilter {
			exclude_ids: Vec::new(),
			genres: vec!["Action".to_string(), "Comedy".to_string()],
			audiences: vec!["Shounen".to_string()],
		};
		let built = candidate_filter(&filter);

		assert!(built.must_not.is_empty());
		assert_eq!(
			built.must,
			vec![
				Condition::matches("genres", vec!["Action".to_string(), "Comedy".to_string()]),
				Condition::matches("audiences", vec!["Shounen".to_string()]),
			]
		);
	}

	#[tokio::test]
	async fn upsert_rejects_mismatched_vector_dims() {
		let cfg = koma_config::Qdrant {
			url: "http://localhost:6334".to_string(),
			collection: "manga_items".to_string(),
			vector_dim: 4,
		};
		let index = QdrantIndex::new(&cfg).expect("Failed to build index client.");
		let err = index
			.upsert_items(&[sample_item()], &[vec![0.1, 0.2]])
			.await
			.expect_err("Expected a dimension error.");

		assert!(
			err.to_string().contains("does not match configured vector_dim"),
			"Unexpected error: {err}"
		);
	}
}
