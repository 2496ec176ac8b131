use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::AppError;

/// Remote artifact store keyed by relative path. Listings report byte
/// sizes; (path, size) is the only comparison key the sync uses, so a
/// same-size rewrite is treated as already in sync — known limitation.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list(&self, prefix: &str) -> Result<HashMap<String, u64>, AppError>;
    async fn upload(&self, key: &str, body: Vec<u8>) -> Result<(), AppError>;
    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError>;
}

#[derive(Debug, serde::Deserialize)]
struct ObjectEntry {
    key: String,
    size: u64,
}

/// Plain HTTP object store: `GET <base>/?prefix=` lists entries as JSON,
/// objects live at `<base>/<key>`.
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpObjectStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn list(&self, prefix: &str) -> Result<HashMap<String, u64>, AppError> {
        let entries: Vec<ObjectEntry> = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[("prefix", prefix)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(entries.into_iter().map(|e| (e.key, e.size)).collect())
    }

    async fn upload(&self, key: &str, body: Vec<u8>) -> Result<(), AppError> {
        self.client
            .put(self.object_url(key))
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let bytes = self
            .client
            .get(self.object_url(key))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

/// Uploads every file under `folder` to `prefix`, skipping files the store
/// already has at the same size when `skip_if_exists` is set. Individual
/// failures are logged and skipped; returns the number of files uploaded.
pub async fn upload_folder(
    store: &dyn ObjectStore,
    folder: &Path,
    prefix: &str,
    skip_if_exists: bool,
) -> Result<usize, AppError> {
    let existing = if skip_if_exists {
        store.list(prefix).await?
    } else {
        HashMap::new()
    };

    let mut uploaded = 0;
    for entry in WalkDir::new(folder).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let local_path = entry.path();
        let relative = match local_path.strip_prefix(folder) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let key = format!("{}/{}", prefix, relative.to_string_lossy().replace('\\', "/"));

        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                warn!("skipping {}: {}", local_path.display(), err);
                continue;
            }
        };
        if skip_if_exists && existing.get(&key) == Some(&size) {
            info!("skipping {}, already in store", local_path.display());
            continue;
        }

        let body = match tokio::fs::read(local_path).await {
            Ok(body) => body,
            Err(err) => {
                warn!("failed to read {}: {}", local_path.display(), err);
                continue;
            }
        };
        match store.upload(&key, body).await {
            Ok(()) => {
                info!("uploaded {} -> {}", local_path.display(), key);
                uploaded += 1;
            }
            Err(err) => warn!("failed to upload {}: {}", local_path.display(), err),
        }
    }
    Ok(uploaded)
}

/// Downloads every object under `prefix` into `folder`, skipping files that
/// already exist locally at the same size. Individual failures are logged
/// and skipped; returns the number of files downloaded.
pub async fn download_prefix(
    store: &dyn ObjectStore,
    prefix: &str,
    folder: &Path,
) -> Result<usize, AppError> {
    let remote = store.list(prefix).await?;

    let mut downloaded = 0;
    for (key, size) in remote {
        let relative = key
            .strip_prefix(prefix)
            .unwrap_or(&key)
            .trim_start_matches('/');
        let local_path = folder.join(relative);

        if let Ok(metadata) = tokio::fs::metadata(&local_path).await {
            if metadata.len() == size {
                info!("skipping {}, already local", key);
                continue;
            }
        }

        if let Some(parent) = local_path.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                warn!("failed to create {}: {}", parent.display(), err);
                continue;
            }
        }
        match store.download(&key).await {
            Ok(body) => match tokio::fs::write(&local_path, body).await {
                Ok(()) => {
                    info!("downloaded {} -> {}", key, local_path.display());
                    downloaded += 1;
                }
                Err(err) => warn!("failed to write {}: {}", local_path.display(), err),
            },
            Err(err) => warn!("failed to download {}: {}", key, err),
        }
    }
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        puts: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn list(&self, prefix: &str) -> Result<HashMap<String, u64>, AppError> {
            Ok(self
                .objects
                .lock()
                .unwrap()
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, body)| (key.clone(), body.len() as u64))
                .collect())
        }

        async fn upload(&self, key: &str, body: Vec<u8>) -> Result<(), AppError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.objects.lock().unwrap().insert(key.to_string(), body);
            Ok(())
        }

        async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| AppError::Internal(format!("no such object: {key}")))
        }
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("phishguard-sync-{tag}-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn reupload_of_unchanged_folder_is_a_no_op() {
        tokio_test::block_on(async {
            let dir = scratch_dir("idempotent");
            fs::write(dir.join("model.json"), b"{\"weights\":[]}").unwrap();
            fs::create_dir_all(dir.join("nested")).unwrap();
            fs::write(dir.join("nested/preprocessor.json"), b"{}").unwrap();

            let store = MemoryStore::default();
            let first = upload_folder(&store, &dir, "final_model", true).await.unwrap();
            assert_eq!(first, 2);

            let second = upload_folder(&store, &dir, "final_model", true).await.unwrap();
            assert_eq!(second, 0);
            assert_eq!(store.puts.load(Ordering::SeqCst), 2);

            fs::remove_dir_all(&dir).unwrap();
        });
    }

    #[test]
    fn size_change_triggers_reupload() {
        tokio_test::block_on(async {
            let dir = scratch_dir("resize");
            fs::write(dir.join("model.json"), b"v1").unwrap();

            let store = MemoryStore::default();
            upload_folder(&store, &dir, "final_model", true).await.unwrap();

            fs::write(dir.join("model.json"), b"longer-v2").unwrap();
            let count = upload_folder(&store, &dir, "final_model", true).await.unwrap();
            assert_eq!(count, 1);

            fs::remove_dir_all(&dir).unwrap();
        });
    }

    #[test]
    fn skip_if_exists_false_always_uploads() {
        tokio_test::block_on(async {
            let dir = scratch_dir("force");
            fs::write(dir.join("model.json"), b"same").unwrap();

            let store = MemoryStore::default();
            upload_folder(&store, &dir, "final_model", false).await.unwrap();
            let again = upload_folder(&store, &dir, "final_model", false).await.unwrap();
            assert_eq!(again, 1);
            assert_eq!(store.puts.load(Ordering::SeqCst), 2);

            fs::remove_dir_all(&dir).unwrap();
        });
    }

    #[test]
    fn download_fills_missing_files_and_skips_present_ones() {
        tokio_test::block_on(async {
            let store = MemoryStore::default();
            store
                .upload("final_model/model.json", b"model".to_vec())
                .await
                .unwrap();
            store
                .upload("final_model/nested/preprocessor.json", b"prep".to_vec())
                .await
                .unwrap();

            let dir = scratch_dir("download");
            let first = download_prefix(&store, "final_model", &dir).await.unwrap();
            assert_eq!(first, 2);
            assert_eq!(fs::read(dir.join("model.json")).unwrap(), b"model");
            assert_eq!(
                fs::read(dir.join("nested/preprocessor.json")).unwrap(),
                b"prep"
            );

            let second = download_prefix(&store, "final_model", &dir).await.unwrap();
            assert_eq!(second, 0);

            fs::remove_dir_all(&dir).unwrap();
        });
    }
}
