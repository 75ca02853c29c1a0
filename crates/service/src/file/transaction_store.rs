use std::{path::PathBuf, sync::Arc};

use models::{now_unix, CreateTransaction, Transaction, UpdateTransaction, UserSummary};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::ledger::{ListFilter, TransactionStore};
use crate::storage::json_list_store::JsonListStore;

/// 文件存储：以 JSON 数组持久化交易账本（默认 `<data_dir>/transactions.json`）
#[derive(Clone)]
pub struct FileTransactionStore {
    store: Arc<JsonListStore<Transaction>>,
}

impl FileTransactionStore {
    /// 初始化存储，若文件不存在则创建空账本
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonListStore::<Transaction>::new(path).await?;
        if store.is_empty().await {
            info!(file = %store.file_path().display(), "ledger empty; starting fresh");
        } else {
            info!(file = %store.file_path().display(), entries = store.len().await, "ledger loaded");
        }
        Ok(Arc::new(Self { store }))
    }

    /// 列出交易（保持写入顺序）
    pub async fn list(&self, filter: &ListFilter) -> Vec<Transaction> {
        self.store.with_items(|items| filter.apply(items)).await
    }

    /// 根据 id 获取
    pub async fn get(&self, id: Uuid) -> Option<Transaction> {
        self.store.find(|t| t.id == id).await
    }

    /// 创建交易：先校验，再落盘，最后返回
    #[instrument(skip(self, input), fields(user = %input.user))]
    pub async fn create(&self, input: CreateTransaction) -> Result<Transaction, ServiceError> {
        input.validate()?;
        let tx = input.into_transaction(now_unix());
        let created = tx.clone();
        self.store
            .mutate(move |items| {
                items.push(tx);
                Ok(())
            })
            .await?;
        info!(id = %created.id, amount = created.amount, "transaction created");
        Ok(created)
    }

    /// 部分更新指定交易；空更新直接返回当前记录，不写文件
    #[instrument(skip(self, input), fields(id = %id))]
    pub async fn update(&self, id: Uuid, input: UpdateTransaction) -> Result<Transaction, ServiceError> {
        input.validate()?;
        if input.is_empty() {
            return self.get(id).await.ok_or_else(|| ServiceError::not_found("transaction"));
        }
        let updated = self
            .store
            .mutate(|items| {
                let existing = items
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| ServiceError::not_found("transaction"))?;
                input.apply_to(existing);
                Ok(existing.clone())
            })
            .await?;
        info!("transaction updated");
        Ok(updated)
    }

    /// 删除指定交易；不存在时返回 false 且不写文件
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = self
            .store
            .mutate(|items| {
                let pos = items
                    .iter()
                    .position(|t| t.id == id)
                    .ok_or_else(|| ServiceError::not_found("transaction"))?;
                items.remove(pos);
                Ok(())
            })
            .await;
        match res {
            Ok(()) => {
                info!("transaction deleted");
                Ok(true)
            }
            Err(ServiceError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// 单个用户的汇总
    pub async fn summary(&self, user: &str) -> UserSummary {
        self.store.with_items(|items| UserSummary::from_ledger(user, items)).await
    }

    pub async fn count(&self) -> usize {
        self.store.len().await
    }
}

#[async_trait::async_trait]
impl TransactionStore for FileTransactionStore {
    async fn list(&self, filter: &ListFilter) -> Vec<Transaction> { self.list(filter).await }
    async fn get(&self, id: Uuid) -> Option<Transaction> { self.get(id).await }
    async fn create(&self, input: CreateTransaction) -> Result<Transaction, ServiceError> { self.create(input).await }
    async fn update(&self, id: Uuid, input: UpdateTransaction) -> Result<Transaction, ServiceError> { self.update(id, input).await }
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> { self.delete(id).await }
    async fn summary(&self, user: &str) -> UserSummary { self.summary(user).await }
    async fn count(&self) -> usize { self.count().await }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::Pagination;
    use models::errors::ModelError;

    fn ledger_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("svc_ledger_{}", Uuid::new_v4()))
            .join("transactions.json")
    }

    async fn cleanup(path: &PathBuf) {
        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }

    fn input(user: &str, item: &str, amount: f64) -> CreateTransaction {
        CreateTransaction { user: user.into(), item: item.into(), amount, timestamp: None }
    }

    #[tokio::test]
    async fn ledger_crud_and_reload() -> Result<(), anyhow::Error> {
        let path = ledger_path();
        let store = FileTransactionStore::new(&path).await?;

        // create
        let a = store.create(input(" alice ", "coffee", 3.5)).await?;
        let b = store.create(input("bob", "train", 12.0)).await?;
        assert_eq!(a.user, "alice");
        assert!(a.timestamp > 0);

        // list keeps insertion order
        let all = store.list(&ListFilter::default()).await;
        assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a.id, b.id]);

        // get
        assert_eq!(store.get(b.id).await.map(|t| t.item), Some("train".to_string()));
        assert!(store.get(Uuid::new_v4()).await.is_none());

        // update
        let upd = UpdateTransaction { amount: Some(4.0), ..Default::default() };
        let updated = store.update(a.id, upd).await?;
        assert_eq!(updated.amount, 4.0);
        assert_eq!(updated.item, "coffee");

        // delete
        assert!(store.delete(b.id).await?);
        assert!(!store.delete(b.id).await?);

        // reload store from disk to ensure persistence
        let reloaded = FileTransactionStore::new(&path).await?;
        let txs = reloaded.list(&ListFilter::default()).await;
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0], updated);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn validation_and_missing_ids_do_not_write() -> Result<(), anyhow::Error> {
        let path = ledger_path();
        let store = FileTransactionStore::new(&path).await?;
        let a = store.create(input("alice", "coffee", 3.5)).await?;
        let before = tokio::fs::read(&path).await?;

        let err = store.create(input("", "coffee", 1.0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Model(ModelError::Validation(_))));

        let bad = UpdateTransaction { item: Some("  ".into()), ..Default::default() };
        assert!(matches!(store.update(a.id, bad).await, Err(ServiceError::Model(_))));

        let missing = UpdateTransaction { amount: Some(1.0), ..Default::default() };
        assert!(matches!(store.update(Uuid::new_v4(), missing).await, Err(ServiceError::NotFound(_))));

        assert_eq!(tokio::fs::read(&path).await?, before);
        assert_eq!(store.count().await, 1);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn empty_update_skips_the_write() -> Result<(), anyhow::Error> {
        let path = ledger_path();
        let store = FileTransactionStore::new(&path).await?;
        let a = store.create(input("alice", "coffee", 3.5)).await?;

        // any write would now fail on the squatted temp path
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::create_dir_all(&tmp).await?;

        let same = store.update(a.id, UpdateTransaction::default()).await?;
        assert_eq!(same, a);
        assert!(matches!(
            store.update(Uuid::new_v4(), UpdateTransaction::default()).await,
            Err(ServiceError::NotFound(_))
        ));

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn summary_and_filtered_listing() -> Result<(), anyhow::Error> {
        let path = ledger_path();
        let store = FileTransactionStore::new(&path).await?;
        for (user, amount) in [("alice", 1.0), ("bob", 5.0), ("alice", 2.0), ("alice", 4.5)] {
            store.create(input(user, "thing", amount)).await?;
        }

        let s = store.summary("alice").await;
        assert_eq!(s.count, 3);
        assert_eq!(s.total_amount, 7.5);

        let alice = store.list(&ListFilter::for_user("alice")).await;
        assert_eq!(alice.len(), 3);

        let page = ListFilter {
            user: Some("alice".into()),
            pagination: Some(Pagination { page: 2, per_page: 2 }),
        };
        let second = store.list(&page).await;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].amount, 4.5);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_creates_all_land_on_disk() -> Result<(), anyhow::Error> {
        let path = ledger_path();
        let store = FileTransactionStore::new(&path).await?;

        let mut handles = Vec::new();
        for i in 0..16 {
            let s = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                s.create(input("alice", &format!("item-{i}"), i as f64)).await
            }));
        }
        for h in handles {
            h.await??;
        }

        let reloaded = FileTransactionStore::new(&path).await?;
        assert_eq!(reloaded.count().await, 16);
        assert_eq!(reloaded.summary("alice").await.total_amount, (0..16).sum::<i32>() as f64);

        cleanup(&path).await;
        Ok(())
    }
}
