//! Loading documents, validator definitions and options.
//!
//! Documents and definitions can come from files, strings, or HTTP URLs.

use std::path::Path;

use serde_json::Value;

use crate::definitions::Definitions;
use crate::error::LoadError;
use crate::registry::ValidatorRegistry;
use crate::types::SchemaGenerationOptions;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

fn read_file(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let content = read_file(path)?;
    load_document_str(&content)
}

/// Load a JSON document from a string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_document_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a JSON document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails or the response
/// isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, LoadError> {
    let network_error = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json())
        .map_err(network_error)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a JSON document from a file path or URL.
///
/// URL loading requires the `remote` feature.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_document_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}

/// Load validator definitions from a file path or URL and build a registry.
///
/// # Errors
///
/// Returns `LoadError` if the source can't be read, isn't a definition
/// document, or its include graph is invalid.
pub fn load_validators(source: &str) -> Result<ValidatorRegistry, LoadError> {
    let value = load_document_auto(source)?;
    Definitions::from_value(value)?.into_registry()
}

/// Load generation options from a JSON file.
///
/// Missing keys keep their defaults; unknown keys are rejected.
///
/// # Errors
///
/// Returns `LoadError::InvalidOptions` if the file isn't a valid options
/// object.
pub fn load_options(path: &Path) -> Result<SchemaGenerationOptions, LoadError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|source| LoadError::InvalidOptions { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn load_document_valid_file() {
        let file = temp_json(r#"{"openapi": "3.0.1"}"#);
        let doc = load_document(file.path()).unwrap();
        assert_eq!(doc["openapi"], "3.0.1");
    }

    #[test]
    fn load_document_file_not_found() {
        let result = load_document(Path::new("/nonexistent/path.json"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_document_invalid_json() {
        let file = temp_json("not valid json");
        let result = load_document(file.path());
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_document_str_invalid() {
        let result = load_document_str("not json");
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn is_url_detection() {
        assert!(is_url("https://example.com/openapi.json"));
        assert!(is_url("http://example.com/openapi.json"));
        assert!(!is_url("/path/to/openapi.json"));
        assert!(!is_url("openapi.json"));
    }

    #[test]
    fn load_document_auto_file() {
        let file = temp_json(r#"{"$defs": {}}"#);
        let doc = load_document_auto(file.path().to_str().unwrap()).unwrap();
        assert!(doc.get("$defs").is_some());
    }

    #[test]
    fn load_validators_from_file() {
        let file = temp_json(
            r#"{"validators": [{"name": "PersonValidator", "type": "Person",
                "rules": [{"property": "Name", "kind": "not_null"}]}]}"#,
        );
        let registry = load_validators(file.path().to_str().unwrap()).unwrap();
        assert!(registry.has_validators("Person"));
    }

    #[test]
    fn load_validators_rejects_unknown_kind() {
        let file = temp_json(
            r#"{"validators": [{"name": "V", "type": "T",
                "rules": [{"property": "Name", "kind": "credit_card"}]}]}"#,
        );
        let result = load_validators(file.path().to_str().unwrap());
        assert!(matches!(result, Err(LoadError::InvalidDefinitions { .. })));
    }

    #[test]
    fn load_options_partial_file() {
        let file = temp_json(r#"{"use_all_of_for_multiple_rules": true}"#);
        let options = load_options(file.path()).unwrap();
        assert!(options.use_all_of_for_multiple_rules);
        assert!(!options.search_base_type_validators);
    }

    #[test]
    fn load_options_unknown_key() {
        let file = temp_json(r#"{"use_all_of": true}"#);
        let result = load_options(file.path());
        assert!(matches!(result, Err(LoadError::InvalidOptions { .. })));
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_document_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/openapi.json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(r#"{"components": {"schemas": {}}}"#)
                .create();

            let doc = load_document_url(&format!("{}/openapi.json", server.url())).unwrap();
            assert!(doc["components"]["schemas"].is_object());
            mock.assert();
        }

        #[test]
        fn load_document_url_404() {
            let mut server = mockito::Server::new();
            let _mock = server.mock("GET", "/missing.json").with_status(404).create();

            let result = load_document_url(&format!("{}/missing.json", server.url()));
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }

        #[test]
        fn load_validators_from_url() {
            let mut server = mockito::Server::new();
            let _mock = server
                .mock("GET", "/validators.json")
                .with_status(200)
                .with_body(r#"{"validators": [{"name": "V", "type": "T"}]}"#)
                .create();

            let registry = load_validators(&format!("{}/validators.json", server.url())).unwrap();
            assert!(registry.get("V").is_some());
        }
    }
}
