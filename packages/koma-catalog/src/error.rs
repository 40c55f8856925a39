pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read catalog file at {path:?}.")]
	ReadCatalog { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse catalog file at {path:?}.")]
	ParseCatalog { path: std::path::PathBuf, source: serde_json::Error },
	#[error("Catalog file at {path:?} contains no records.")]
	EmptyCatalog { path: std::path::PathBuf },
	#[error("Not implemented: {0}")]
	Unimplemented(String),
}
