//! In-memory `UserStore` for tests. Mirrors the Postgres schema rules:
//! email unique among active rows, soft-deleted rows invisible to lookups.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::UserStore;
use super::repo_types::{StoreError, User};

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().unwrap().is_empty()
    }

    pub fn soft_delete(&self, id: Uuid) -> bool {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|u| u.id == id && u.is_active()) {
            Some(user) => {
                user.deleted_at = Some(OffsetDateTime::now_utc());
                true
            }
            None => false,
        }
    }

    fn find(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.is_active() && pred(u))
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.find(|u| u.email == email).is_some())
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.is_active() && u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        rows.push(user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.find(|u| u.email == email))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.find(|u| u.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unique_email_only_among_active_rows() {
        let store = MemoryUserStore::default();
        assert!(store.is_empty());
        let first = User::new("A", "B", "a@b.com", "h".into());
        store.create(&first).await.unwrap();

        let clash = User::new("C", "D", "a@b.com", "h".into());
        assert!(matches!(
            store.create(&clash).await,
            Err(StoreError::DuplicateEmail)
        ));

        assert!(store.soft_delete(first.id));
        assert!(!store.is_empty());
        assert!(!store.email_exists("a@b.com").await.unwrap());
        assert!(store.find_by_id(first.id).await.unwrap().is_none());

        store.create(&clash).await.unwrap();
        assert_eq!(store.len(), 2);
        let found = store.find_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(found.id, clash.id);
    }
}
