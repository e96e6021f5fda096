use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use post_receiver::catalog::{Catalog, CatalogError, Post};
use post_receiver::uploads::{
    LocalUploads, StoredFile, UploadReader, UploadStore, UploadStoreError,
};
use serde_json::json;

fn sample_post(sport: &str, faculties: &[&str]) -> Post {
    Post::new(
        sport.to_string(),
        faculties.iter().map(|f| f.to_string()).collect(),
        None,
        None,
        json!(1_700_000_000_000_i64),
    )
}

fn uploads(dir: &tempfile::TempDir) -> LocalUploads {
    LocalUploads::new(dir.path().join("uploads")).unwrap()
}

async fn stored_image(dir: &tempfile::TempDir, name: &str) -> StoredFile {
    uploads(dir).put(name, Bytes::from("png bytes")).await.unwrap()
}

fn image_post(image: StoredFile) -> Post {
    Post::new("Football".to_string(), vec![], Some(image), None, json!(1))
}

/// Records what the catalog looked like while each file was being removed.
struct ObservingStore {
    catalog: Catalog,
    seen: std::sync::Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl UploadStore for ObservingStore {
    async fn put(&self, _filename: &str, _data: Bytes) -> Result<StoredFile, UploadStoreError> {
        unimplemented!()
    }

    async fn open(&self, _filename: &str) -> Result<(UploadReader, u64), UploadStoreError> {
        unimplemented!()
    }

    async fn delete(&self, filename: &str) -> Result<(), UploadStoreError> {
        // Takes the catalog lock; would deadlock if delete still held it
        let len = self.catalog.len();
        self.seen.lock().unwrap().push((filename.to_string(), len));
        Ok(())
    }
}

#[test]
fn test_insert_assigns_id() {
    let catalog = Catalog::new();
    let post = catalog.insert(sample_post("Football", &["Eng"]));

    assert!(!post.id.is_empty());
    assert!(post.id.parse::<u64>().is_ok());
    assert_eq!(catalog.get(&post.id), Some(post));
}

#[test]
fn test_insert_keeps_existing_id() {
    let catalog = Catalog::new();
    let mut post = sample_post("Football", &[]);
    post.id = "custom-id".to_string();

    let stored = catalog.insert(post);
    assert_eq!(stored.id, "custom-id");
    assert!(catalog.get("custom-id").is_some());
}

#[test]
fn test_ids_unique_within_same_millisecond() {
    let catalog = Catalog::new();
    let ids: Vec<String> = (0..50)
        .map(|_| catalog.insert(sample_post("Chess", &[])).id)
        .collect();

    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());
}

#[tokio::test]
async fn test_ids_not_reused_after_delete() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Catalog::new();
    let first = catalog.insert(sample_post("Chess", &[]));
    catalog.delete(&first.id, &uploads(&dir)).await.unwrap();

    let second = catalog.insert(sample_post("Chess", &[]));
    assert_ne!(first.id, second.id);
    assert!(second.id.parse::<u64>().unwrap() > first.id.parse::<u64>().unwrap());
}

#[test]
fn test_list_all_in_insertion_order() {
    let catalog = Catalog::new();
    let a = catalog.insert(sample_post("Football", &["Eng"]));
    let b = catalog.insert(sample_post("Basketball", &["Law"]));

    let all = catalog.list_all();
    assert_eq!(all, vec![a, b]);
    assert_eq!(catalog.len(), 2);
    assert!(!catalog.is_empty());
}

#[test]
fn test_get_not_found() {
    let catalog = Catalog::new();
    assert!(catalog.get("nonexistent").is_none());
}

#[test]
fn test_filter_by_sport_ignores_case() {
    let catalog = Catalog::new();
    let a = catalog.insert(sample_post("Football", &["Eng"]));
    catalog.insert(sample_post("Cricket", &["Arts"]));
    let c = catalog.insert(sample_post("FOOTBALL", &["Med"]));

    let upper = catalog.filter_by_sport("Football");
    let lower = catalog.filter_by_sport("football");
    assert_eq!(upper, lower);
    assert_eq!(upper, vec![a, c]);
}

#[test]
fn test_filter_by_sport_exact_match_only() {
    let catalog = Catalog::new();
    catalog.insert(sample_post("Football", &[]));

    assert!(catalog.filter_by_sport("Foot").is_empty());
    assert!(catalog.filter_by_sport("Swimming").is_empty());
}

#[tokio::test]
async fn test_delete_removes_post_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let image = stored_image(&dir, "to-delete.png").await;
    let path = image.path.clone();

    let catalog = Catalog::new();
    let post = catalog.insert(image_post(image));
    assert!(path.exists());

    let deleted = catalog
        .delete(&post.id, &uploads(&dir))
        .await
        .unwrap()
        .expect("post should exist");
    assert_eq!(deleted.id, post.id);
    assert!(catalog.get(&post.id).is_none());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_delete_tolerates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let image = stored_image(&dir, "already-gone.png").await;
    std::fs::remove_file(&image.path).unwrap();

    let catalog = Catalog::new();
    let post = catalog.insert(image_post(image));

    assert!(catalog.delete(&post.id, &uploads(&dir)).await.unwrap().is_some());
    assert!(catalog.is_empty());
}

#[tokio::test]
async fn test_delete_keeps_post_when_file_cannot_be_removed() {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("uploads").join("stuck.png");
    std::fs::create_dir_all(path.join("inner")).unwrap();

    let catalog = Catalog::new();
    let post = catalog.insert(image_post(StoredFile {
        filename: "stuck.png".to_string(),
        path,
        size: 0,
    }));

    let err = catalog
        .delete(&post.id, &uploads(&dir))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::FileCleanup { .. }));
    assert_eq!(catalog.get(&post.id), Some(post));
}

#[tokio::test]
async fn test_delete_releases_lock_while_removing_file() {
    let catalog = Catalog::new();
    let post = catalog.insert(image_post(StoredFile {
        filename: "observed.png".to_string(),
        path: PathBuf::from("/nonexistent/observed.png"),
        size: 0,
    }));
    catalog.insert(sample_post("Chess", &[]));

    let store = ObservingStore {
        catalog: catalog.clone(),
        seen: Default::default(),
    };
    assert!(catalog.delete(&post.id, &store).await.unwrap().is_some());

    // The record is still present while its file is removed
    assert_eq!(
        *store.seen.lock().unwrap(),
        vec![("observed.png".to_string(), 2)]
    );
    assert_eq!(catalog.len(), 1);
}

#[tokio::test]
async fn test_delete_without_image_skips_store() {
    let catalog = Catalog::new();
    let post = catalog.insert(sample_post("Chess", &[]));
    let store = ObservingStore {
        catalog: catalog.clone(),
        seen: Default::default(),
    };

    assert!(catalog.delete(&post.id, &store).await.unwrap().is_some());
    assert!(store.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_not_found_leaves_catalog_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Catalog::new();
    let post = catalog.insert(sample_post("Football", &[]));

    assert!(catalog
        .delete("nonexistent", &uploads(&dir))
        .await
        .unwrap()
        .is_none());
    assert_eq!(catalog.list_all(), vec![post]);
}

#[test]
fn test_clones_share_state() {
    let catalog = Catalog::new();
    let handle = catalog.clone();
    let post = handle.insert(sample_post("Rugby", &[]));

    assert_eq!(catalog.get(&post.id), Some(post));
}

#[tokio::test]
async fn test_post_new_derives_url_and_size() {
    let dir = tempfile::tempdir().unwrap();
    let image = stored_image(&dir, "banner.png").await;

    let post = Post::new(
        "Football".to_string(),
        vec!["Eng".to_string()],
        Some(image.clone()),
        Some(json!({"source": "auto"})),
        json!(5),
    );

    assert_eq!(post.filename.as_deref(), Some("banner.png"));
    assert_eq!(post.url.as_deref(), Some("/uploads/banner.png"));
    assert_eq!(post.filepath, Some(image.path));
    assert_eq!(post.size, 9);

    let without_image = sample_post("Football", &[]);
    assert_eq!(without_image.url, None);
    assert_eq!(without_image.size, 0);
}

#[test]
fn test_post_serializes_camel_case_with_nulls() {
    let post = sample_post("Football", &["Eng"]);
    let value = serde_json::to_value(&post).unwrap();

    assert!(value.get("uploadedAt").unwrap().as_str().unwrap().ends_with('Z'));
    assert!(value.get("filename").unwrap().is_null());
    assert!(value.get("url").unwrap().is_null());
    assert!(value.get("metadata").unwrap().is_null());
    assert_eq!(value["timestamp"], json!(1_700_000_000_000_i64));
}
