use dimsync_core::{normalize, NormalizeOptions};
use dimsync_engine::{Resource, SnapshotError, SnapshotStore};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn nested_attributes_survive_round_trip() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp.path().join("sheets"));
    let raw = json!({
        "product_id": 1201,
        "code": "4711064647082",
        "stock": {"stock": "5", "active": "1"},
        "translations": {"pl_PL": {"name": "Etui", "description": "<p>10x5x3 cm</p>"}},
        "attributes": {"550": {"1370": "Etui na telefon"}, "552": {"1191": "10", "1196": "5"}}
    });

    store.write(Resource::Products, &[raw.clone()]).unwrap();
    let back = store.read(Resource::Products).unwrap();

    assert_eq!(back.len(), 1);
    assert_eq!(back[0]["attributes"], raw["attributes"]);
    assert_eq!(back[0]["stock"], raw["stock"]);

    let options = NormalizeOptions::default();
    assert_eq!(normalize(&back[0], &options), normalize(&raw, &options));
}

#[test]
fn columns_are_the_union_of_keys() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp.path());
    let records = vec![json!({"a": "1"}), json!({"b": [1, 2]})];

    store.write(Resource::Categories, &records).unwrap();
    let back = store.read(Resource::Categories).unwrap();

    assert_eq!(back, vec![json!({"a": "1"}), json!({"b": [1, 2]})]);
}

#[test]
fn write_replaces_previous_snapshot() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp.path());

    store
        .write(Resource::Producers, &[json!({"id": "1"}), json!({"id": "2"})])
        .unwrap();
    let path = store.write(Resource::Producers, &[json!({"id": "3"})]).unwrap();

    assert_eq!(path, store.path_for(Resource::Producers));
    assert_eq!(
        store.read(Resource::Producers).unwrap(),
        vec![json!({"id": "3"})]
    );
}

#[test]
fn reading_unknown_resource_is_missing() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp.path());
    let err = store.read(Resource::Attributes).unwrap_err();
    assert!(matches!(err, SnapshotError::Missing(Resource::Attributes)));
}

#[test]
fn text_that_looks_like_json_stays_text() {
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp.path());
    let raw = json!({
        "product_id": 7,
        "code": "[123]",
        "name": "{Etui} \"premium\"",
        "note": "\"cytat\"",
        "tags": ["[123]"]
    });

    store.write(Resource::Products, &[raw.clone()]).unwrap();
    let back = store.read(Resource::Products).unwrap();

    assert_eq!(back[0]["code"], json!("[123]"));
    assert_eq!(back[0]["name"], json!("{Etui} \"premium\""));
    assert_eq!(back[0]["note"], json!("\"cytat\""));
    assert_eq!(back[0]["tags"], json!(["[123]"]));

    let options = NormalizeOptions::default();
    assert_eq!(normalize(&back[0], &options).ean, "[123]");
}
