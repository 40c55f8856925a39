use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};

#[test]
fn builds_bearer_auth_header() {
	let headers =
		koma_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");
	assert_eq!(value, "Bearer secret");
}

#[test]
fn carries_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-request-source".to_string(), Value::String("koma".to_string()));

	let headers =
		koma_providers::auth_headers("secret", &defaults).expect("Failed to build headers.");
	let value = headers.get("x-request-source").expect("Missing default header.");

	assert_eq!(value, "koma");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3));

	assert!(koma_providers::auth_headers("secret", &defaults).is_err());
}
