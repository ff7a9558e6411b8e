//! End-to-end pipeline tests

use apidoc_mcp_common::{BridgeError, ContentLoader, FormatTag, PipelineConfig, Result};
use apidoc_mcp_pipeline::{Pipeline, RunOptions, TODO_FILE};
use mockall::mock;
use mockall::predicate::eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

mock! {
    pub Loader {}

    impl ContentLoader for Loader {
        fn load(&self, source: &str) -> Result<String>;
        fn content_type(&self, url: &str) -> Result<Option<String>>;
    }
}

const SWAGGER: &str = r#"{
  "swagger": "2.0",
  "info": {"title": "Pets API", "version": "1.0"},
  "host": "pets.example.com",
  "basePath": "/v1",
  "paths": {
    "/users/{id}": {
      "get": {
        "operationId": "getUser",
        "parameters": [{"name": "id", "in": "path", "required": true, "type": "string"}],
        "responses": {"200": {"description": "ok"}}
      }
    }
  }
}"#;

const MARKDOWN: &str = r#"# User Service

Manages users.
Version: 2.1.0

## GET /users/{id}

Fetch one user.

| Name | Type | Required | Description | In |
|------|------|----------|-------------|----|
| id | integer | yes | User id | path |

## POST /users

Create a user.

#### Request Body

```json
{"name": "Ann", "age": 30}
```
"#;

fn config(root: &Path, cache_enabled: bool) -> PipelineConfig {
    PipelineConfig {
        output_dir: root.join("out"),
        cache_dir: root.join("cache"),
        cache_enabled,
        ..Default::default()
    }
}

fn cache_entries(root: &Path) -> usize {
    fs::read_dir(root.join("cache"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[test]
fn test_swagger_file_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("pets.json");
    fs::write(&source, SWAGGER).unwrap();

    let pipeline = Pipeline::new(config(temp_dir.path(), true)).unwrap();
    let outcome = pipeline
        .run(source.to_str().unwrap(), &RunOptions::default())
        .unwrap();

    assert_eq!(outcome.output_dir, temp_dir.path().join("out").join("pets_api"));
    assert!(outcome.document.openapi_version().unwrap().starts_with("3."));
    assert_eq!(outcome.metrics.endpoints_count, 1);
    assert_eq!(outcome.metrics.generated_count, 1);
    assert!(!outcome.metrics.cache_hit);

    let server = fs::read_to_string(outcome.output_dir.join("mcp_server.py")).unwrap();
    assert!(server.contains("async def getUser(id: str) -> str:"));
    assert!(server.contains("\"https://pets.example.com/v1\""));
    assert_eq!(
        outcome.document.servers(),
        vec![("https://pets.example.com/v1".to_string(), String::new())]
    );
    let readme = fs::read_to_string(outcome.output_dir.join("README.md")).unwrap();
    assert!(readme.contains("## Servers"));
    assert!(readme.contains("- https://pets.example.com/v1"));
    assert_eq!(cache_entries(temp_dir.path()), 1);
}

#[test]
fn test_second_run_is_served_from_cache() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("pets.json");
    fs::write(&source, SWAGGER).unwrap();
    let source = source.to_str().unwrap();

    let pipeline = Pipeline::new(config(temp_dir.path(), true)).unwrap();
    let first = pipeline.prepare(source, None).unwrap();
    let second = pipeline.prepare(source, None).unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(second.format, FormatTag::Swagger);
    assert_eq!(
        first.document.to_pretty_json().unwrap(),
        second.document.to_pretty_json().unwrap()
    );
    assert!(second.convert_time.is_zero());
    assert_eq!(cache_entries(temp_dir.path()), 1);
}

#[test]
fn test_reformatted_input_hits_the_same_entry() {
    let temp_dir = TempDir::new().unwrap();
    let pretty = temp_dir.path().join("pretty.json");
    let compact = temp_dir.path().join("compact.json");
    fs::write(&pretty, SWAGGER).unwrap();
    let value: serde_json::Value = serde_json::from_str(SWAGGER).unwrap();
    fs::write(&compact, serde_json::to_string(&value).unwrap()).unwrap();

    let pipeline = Pipeline::new(config(temp_dir.path(), true)).unwrap();
    assert!(!pipeline.prepare(pretty.to_str().unwrap(), None).unwrap().cache_hit);
    assert!(pipeline.prepare(compact.to_str().unwrap(), None).unwrap().cache_hit);
}

#[test]
fn test_disabled_cache_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("pets.json");
    fs::write(&source, SWAGGER).unwrap();

    let pipeline = Pipeline::new(config(temp_dir.path(), false)).unwrap();
    let source = source.to_str().unwrap();
    assert!(!pipeline.prepare(source, None).unwrap().cache_hit);
    assert!(!pipeline.prepare(source, None).unwrap().cache_hit);
    assert_eq!(cache_entries(temp_dir.path()), 0);
}

#[test]
fn test_service_name_overrides_title_and_folder() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("pets.json");
    fs::write(&source, SWAGGER).unwrap();

    let pipeline = Pipeline::new(config(temp_dir.path(), true)).unwrap();
    let options = RunOptions {
        format: Some(FormatTag::Swagger),
        service_name: Some("petshop".to_string()),
    };
    let outcome = pipeline.run(source.to_str().unwrap(), &options).unwrap();

    assert_eq!(outcome.output_dir, temp_dir.path().join("out").join("petshop"));
    assert_eq!(outcome.document.title(), Some("petshop"));
    assert_eq!(
        outcome.document.get("info").unwrap()["x-original-title"],
        "Pets API"
    );

    // the cached document keeps the original title
    let cached = pipeline.prepare(source.to_str().unwrap(), Some(FormatTag::Swagger)).unwrap();
    assert!(cached.cache_hit);
    assert_eq!(cached.document.title(), Some("Pets API"));
}

#[test]
fn test_unstructured_text_is_deferred() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("notes.txt");
    fs::write(&source, "just some text").unwrap();

    let pipeline = Pipeline::new(config(temp_dir.path(), true)).unwrap();
    let result = pipeline.run(source.to_str().unwrap(), &RunOptions::default());

    assert!(matches!(result, Err(BridgeError::Generation(_))));
    let deferred = temp_dir
        .path()
        .join("out")
        .join("unstructured_api_data")
        .join(TODO_FILE);
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(deferred).unwrap()).unwrap();
    assert_eq!(saved["todo"], true);
    assert_eq!(cache_entries(temp_dir.path()), 0);
}

#[test]
fn test_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(config(temp_dir.path(), true)).unwrap();

    let result = pipeline.run(
        temp_dir.path().join("missing.md").to_str().unwrap(),
        &RunOptions::default(),
    );
    assert!(matches!(result, Err(BridgeError::Io(_))));
}

#[test]
fn test_remote_markdown_through_mock_loader() {
    let url = "https://docs.example.com/users";
    let mut loader = MockLoader::new();
    loader
        .expect_content_type()
        .with(eq(url))
        .times(1)
        .returning(|_| Ok(Some("text/markdown; charset=utf-8".to_string())));
    loader
        .expect_load()
        .with(eq(url))
        .times(1)
        .returning(|_| Ok(MARKDOWN.to_string()));

    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::with_loader(config(temp_dir.path(), false), Box::new(loader));
    let outcome = pipeline.run(url, &RunOptions::default()).unwrap();

    assert_eq!(outcome.output_dir, temp_dir.path().join("out").join("user_service"));
    assert_eq!(outcome.metrics.generated_count, 2);

    let server = fs::read_to_string(outcome.output_dir.join("mcp_server.py")).unwrap();
    assert!(server.contains("async def get_users__id(id: int) -> str:"));
    assert!(server.contains("async def post_users("));
    assert!(server.contains("_payload[\"name\"] = name"));
}

#[test]
fn test_fetch_failure_is_propagated() {
    let url = "https://docs.example.com/openapi.json";
    let mut loader = MockLoader::new();
    loader
        .expect_load()
        .returning(|_| Err(BridgeError::Fetch("connection refused".to_string())));

    let temp_dir = TempDir::new().unwrap();
    let pipeline = Pipeline::with_loader(config(temp_dir.path(), true), Box::new(loader));
    let result = pipeline.run(url, &RunOptions::default());

    assert!(matches!(result, Err(BridgeError::Fetch(_))));
}
