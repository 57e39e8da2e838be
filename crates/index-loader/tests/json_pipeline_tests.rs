//! Full pipeline: JSON files on disk, a mock search backend and a backup
//! directory.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use index_loader::{
    BulkLoader, Config, DataSource, DocumentReader, ElasticSink, FieldMapping,
    JsonDirectorySource, JsonFileStore, PagingCriteria, Reshaper, ResultQueue, SchemaSet,
    SchemaValidator, SemanticType, TypeRegistry,
};
use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_json(dir: &Path, name: &str, value: serde_json::Value) {
    std::fs::write(dir.join(name), serde_json::to_vec(&value).unwrap()).unwrap();
}

fn config_yaml(data: &Path, backup: &Path, url: &str) -> String {
    format!(
        r#"
source:
  dir: {data}
target:
  url: {url}
  index: catalog
parser:
  date_format: "%Y-%m-%d"
bulk:
  max_elements_per_bulk: 2
backup:
  dir: {backup}
mappings:
  - name: sku
    type: keyword
  - name: qty
    type: integer
  - name: added
    output_name: added_on
    type: date
  - name: title
    type: completion
"#,
        data = data.display(),
        backup = backup.display(),
        url = url,
    )
}

fn products() -> serde_json::Value {
    json!([
        { "sku": "A-1", "qty": 3, "added": "2024-01-05", "title": "desk lamp", "extra": true },
        { "sku": "A-2", "qty": 0, "added": "2024-02-10", "title": "chair" },
        { "sku": "A-3", "qty": 12, "added": "2024-03-15", "title": "tall book shelf" }
    ])
}

#[tokio::test]
async fn test_json_files_are_loaded_and_backed_up() {
    let data = TempDir::new().unwrap();
    let backup = TempDir::new().unwrap();
    write_json(data.path(), "a.json", products());
    write_json(data.path(), "b.json", json!([]));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "took": 1, "errors": false, "items": []
        })))
        .expect(2)
        .mount(&server)
        .await;

    let config = Config::from_yaml(&config_yaml(data.path(), backup.path(), &server.uri())).unwrap();
    let registry = Arc::new(TypeRegistry::new(&config.parser).unwrap());
    let queue = ResultQueue::from_config(&config.queue).unwrap();
    let sink = Arc::new(ElasticSink::new(&config.target, queue.clone()).unwrap());
    let store = Arc::new(JsonFileStore::from_config(config.backup.as_ref().unwrap()));
    let loader = BulkLoader::new(
        config.bulk.clone(),
        SchemaSet::new(config.field_mappings()),
        Reshaper::new(registry),
        sink,
    )
    .unwrap()
    .with_backup(store.clone());

    let mut source = JsonDirectorySource::open(&config.source.dir).unwrap();
    assert_eq!(source.remaining(), 2);
    let outcome = loader
        .load(&mut source, &CancellationToken::new())
        .await
        .unwrap();

    let first_file = data.path().join("a.json").display().to_string();
    assert_eq!(
        outcome.summary.correlation_ids,
        vec![format!("{}_0", first_file), format!("{}_1", first_file)]
    );
    assert_eq!(outcome.summary.documents_dispatched, 3);
    assert_eq!(outcome.summary.readers, 2);

    let completion = outcome
        .await_completion(Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(completion.acknowledged, 2);
    assert_eq!(queue.drain_ready().len(), 2);

    // backups run detached
    let backup_file = store.path_for(&format!("{}_0", first_file));
    for _ in 0..100 {
        if backup_file.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let stored: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&backup_file).unwrap()).unwrap();
    let first = &stored[0];
    assert_eq!(first["sku"], "A-1");
    assert_eq!(first["qty"], 3);
    assert_eq!(first["added_on"], 1_704_412_800_000i64);
    assert_eq!(
        first["title"]["input"],
        json!(["desk lamp", "lamp"])
    );
    assert!(first.get("extra").is_none());
    assert!(first.get("added").is_none());
}

#[tokio::test]
async fn test_validator_reports_every_violation() {
    let data = TempDir::new().unwrap();
    write_json(
        data.path(),
        "bad.json",
        json!([
            { "sku": "B-1", "qty": "many" },
            { "qty": 1, "added": "2024-01-01" }
        ]),
    );
    let validator = SchemaValidator::new(Arc::new(TypeRegistry::with_defaults()));
    let schema = SchemaSet::new(vec![
        FieldMapping::new("sku", SemanticType::Keyword),
        FieldMapping::new("qty", SemanticType::Integer),
        FieldMapping::new("added", SemanticType::Date),
    ]);

    let mut source = JsonDirectorySource::open(data.path()).unwrap();
    let mut reader = source.next_reader().await.unwrap();
    let criteria = PagingCriteria::from_beginning(10).unwrap();
    let documents = reader.read(&criteria).await.unwrap();
    assert_eq!(documents.len(), 2);

    let first = validator.validate(&documents[0], &schema).unwrap_err();
    assert_eq!(
        first.to_string(),
        "Data assigned to qty cannot be mapped to a integer, \
         Property added could not be found at data element"
    );

    // strings are not dates until they are reshaped
    let second = validator.validate(&documents[1], &schema).unwrap_err();
    assert_eq!(second.violations.len(), 2);
    assert!(second
        .to_string()
        .contains("Property sku could not be found at data element"));
    assert!(second
        .to_string()
        .contains("Data assigned to added cannot be mapped to a date"));
}
