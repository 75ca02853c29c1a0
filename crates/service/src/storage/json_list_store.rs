use std::{io, path::{Path, PathBuf}, sync::Arc};
use tokio::{fs, io::AsyncWriteExt, sync::RwLock};
use tracing::{debug, warn};

use crate::errors::ServiceError;

/// Generic JSON file-backed ordered list.
///
/// Persists a `Vec<T>` as a pretty-printed JSON array and keeps it in memory
/// behind an async `RwLock`. Every mutation is applied to a copy, written to
/// `<file>.tmp`, renamed over the target and only then published, so a failed
/// write leaves both the file and the in-memory list untouched.
pub struct JsonListStore<T> {
    inner: RwLock<Vec<T>>,
    file_path: PathBuf,
}

impl<T> JsonListStore<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync,
{
    /// Initialize the store from a path. Creates the file with an empty list if missing.
    ///
    /// A file that does not parse is moved aside to `<file>.corrupt-<unix-ts>-<uuid>`
    /// and the store starts empty.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ServiceError::storage("create data dir", e))?;
            }
        }

        let items: Vec<T> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => {
                write_atomic(&file_path, &Vec::<T>::new()).await?;
                Vec::new()
            }
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(items) => items,
                Err(e) => {
                    let moved = quarantine(&file_path).await?;
                    warn!(
                        file = %file_path.display(),
                        moved_to = %moved.display(),
                        error = %e,
                        "ledger file unreadable; moved aside and starting empty"
                    );
                    write_atomic(&file_path, &Vec::<T>::new()).await?;
                    Vec::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                write_atomic(&file_path, &Vec::<T>::new()).await?;
                Vec::new()
            }
            Err(e) => return Err(ServiceError::storage("read ledger", e)),
        };

        debug!(file = %file_path.display(), entries = items.len(), "json list store loaded");
        Ok(Arc::new(Self { inner: RwLock::new(items), file_path }))
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Run `f` against the current entries under the read lock.
    pub async fn with_items<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&[T]) -> R,
    {
        let items = self.inner.read().await;
        f(&items)
    }

    /// First entry matching `pred`.
    pub async fn find<F>(&self, pred: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        let items = self.inner.read().await;
        items.iter().find(|t| pred(t)).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Apply a mutation and persist it before publishing.
    ///
    /// Holds the write lock across the file write, so persisted snapshots are
    /// written in the same order the mutations were applied.
    pub async fn mutate<R, F>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, ServiceError>,
    {
        let mut items = self.inner.write().await;
        let mut next = items.clone();
        let out = f(&mut next)?;
        write_atomic(&self.file_path, &next).await?;
        *items = next;
        Ok(out)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".tmp");
    PathBuf::from(s)
}

/// Write pretty JSON to `<path>.tmp`, fsync it, then rename over `path`.
async fn write_atomic<T: serde::Serialize>(path: &Path, items: &[T]) -> Result<(), ServiceError> {
    let data = serde_json::to_vec_pretty(items).map_err(|e| ServiceError::storage("encode ledger", e))?;
    let tmp = tmp_path(path);

    let mut file = fs::File::create(&tmp)
        .await
        .map_err(|e| ServiceError::storage("create temp file", e))?;
    file.write_all(&data)
        .await
        .map_err(|e| ServiceError::storage("write temp file", e))?;
    file.sync_all()
        .await
        .map_err(|e| ServiceError::storage("sync temp file", e))?;
    drop(file);

    fs::rename(&tmp, path)
        .await
        .map_err(|e| ServiceError::storage("replace ledger", e))?;
    Ok(())
}

/// Move an unreadable ledger to `<file>.corrupt-<unix-ts>-<uuid>`.
/// The uuid suffix keeps two quarantines in the same second apart.
async fn quarantine(path: &Path) -> Result<PathBuf, ServiceError> {
    let mut s = path.as_os_str().to_os_string();
    s.push(format!(".corrupt-{}-{}", models::now_unix(), uuid::Uuid::new_v4().simple()));
    let target = PathBuf::from(s);
    fs::rename(path, &target)
        .await
        .map_err(|e| ServiceError::storage("move corrupt ledger aside", e))?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_file(tag: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("json_list_store_{}", uuid::Uuid::new_v4()))
            .join(format!("{tag}.json"))
    }

    async fn snapshot<T>(store: &JsonListStore<T>) -> Vec<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync,
    {
        store.with_items(|items| items.to_vec()).await
    }

    async fn corrupt_backups(path: &Path) -> Result<Vec<PathBuf>, anyhow::Error> {
        let prefix = format!("{}.corrupt-", path.file_name().unwrap().to_string_lossy());
        let mut saved = Vec::new();
        let mut dir = fs::read_dir(path.parent().unwrap()).await?;
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                saved.push(entry.path());
            }
        }
        Ok(saved)
    }

    async fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn json_list_store_mutations_persist() -> Result<(), anyhow::Error> {
        let path = tmp_file("basic");
        let store = JsonListStore::<String>::new(&path).await?;

        // missing file is created empty
        assert!(store.is_empty().await);
        assert_eq!(fs::read_to_string(&path).await?.trim(), "[]");

        store.mutate(|v| { v.push("a".into()); Ok(()) }).await?;
        store.mutate(|v| { v.push("b".into()); Ok(()) }).await?;
        let removed = store
            .mutate(|v| Ok(v.remove(0)))
            .await?;
        assert_eq!(removed, "a");
        assert_eq!(store.find(|s| s == "b").await.as_deref(), Some("b"));

        // reload from disk
        let reloaded = JsonListStore::<String>::new(&path).await?;
        assert_eq!(snapshot(&reloaded).await, vec!["b".to_string()]);
        // no temp file is left behind
        assert!(fs::metadata(tmp_path(&path)).await.is_err());

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_closure_leaves_state_untouched() -> Result<(), anyhow::Error> {
        let path = tmp_file("closure_err");
        let store = JsonListStore::<u32>::new(&path).await?;
        store.mutate(|v| { v.push(1); Ok(()) }).await?;

        let res: Result<(), _> = store
            .mutate(|v| {
                v.push(2);
                Err(ServiceError::not_found("entry"))
            })
            .await;
        assert!(matches!(res, Err(ServiceError::NotFound(_))));
        assert_eq!(snapshot(&store).await, vec![1]);
        let on_disk: Vec<u32> = serde_json::from_slice(&fs::read(&path).await?)?;
        assert_eq!(on_disk, vec![1]);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_rolls_back_memory() -> Result<(), anyhow::Error> {
        let path = tmp_file("write_err");
        let store = JsonListStore::<u32>::new(&path).await?;
        store.mutate(|v| { v.push(1); Ok(()) }).await?;

        // a directory squatting on the temp path makes the write fail
        fs::create_dir_all(tmp_path(&path)).await?;
        let res = store.mutate(|v| { v.push(2); Ok(()) }).await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));
        assert_eq!(snapshot(&store).await, vec![1]);

        fs::remove_dir_all(tmp_path(&path)).await?;
        store.mutate(|v| { v.push(3); Ok(()) }).await?;
        assert_eq!(snapshot(&store).await, vec![1, 3]);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_moved_aside() -> Result<(), anyhow::Error> {
        let path = tmp_file("corrupt");
        fs::create_dir_all(path.parent().unwrap()).await?;
        fs::write(&path, b"{ not json").await?;

        let store = JsonListStore::<u32>::new(&path).await?;
        assert!(store.is_empty().await);

        let saved = corrupt_backups(&path).await?;
        assert_eq!(saved.len(), 1);
        assert_eq!(fs::read(&saved[0]).await?, b"{ not json");

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn back_to_back_corrupt_loads_keep_every_backup() -> Result<(), anyhow::Error> {
        let path = tmp_file("twice");
        fs::create_dir_all(path.parent().unwrap()).await?;

        // both loads land within the same second
        fs::write(&path, b"first-corrupt").await?;
        JsonListStore::<u32>::new(&path).await?;
        fs::write(&path, b"second-corrupt").await?;
        JsonListStore::<u32>::new(&path).await?;

        let mut contents = Vec::new();
        for p in corrupt_backups(&path).await? {
            contents.push(fs::read_to_string(&p).await?);
        }
        contents.sort();
        assert_eq!(contents, vec!["first-corrupt".to_string(), "second-corrupt".to_string()]);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn blank_file_reads_as_empty() -> Result<(), anyhow::Error> {
        let path = tmp_file("blank");
        fs::create_dir_all(path.parent().unwrap()).await?;
        fs::write(&path, b"\n").await?;
        let store = JsonListStore::<u32>::new(&path).await?;
        assert_eq!(store.len().await, 0);
        cleanup(&path).await;
        Ok(())
    }
}
