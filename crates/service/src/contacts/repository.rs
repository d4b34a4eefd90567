use async_trait::async_trait;
use common::pagination::Pagination;
use models::contact;
use models::schemas::{ContactCreate, ContactPatch};
use sea_orm::sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use thiserror::Error;
use tracing::warn;

use super::filters::{escape_like, BirthdayWindow, ContactFilter};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("unique constraint violated on {field}")]
    Conflict { field: &'static str },
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<DbErr> for RepositoryError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            // email is the only unique column besides the generated id
            Some(SqlErr::UniqueConstraintViolation(_)) => RepositoryError::Conflict { field: "email" },
            _ => RepositoryError::Storage(e.to_string()),
        }
    }
}

/// Persistence port for contacts. Absent rows are `Ok(None)`, never errors.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// One page of matching rows plus the number of matching rows overall.
    async fn list(&self, filter: &ContactFilter, page: Pagination) -> Result<(Vec<contact::Model>, u64), RepositoryError>;
    async fn get_by_id(&self, id: i32) -> Result<Option<contact::Model>, RepositoryError>;
    async fn create(&self, input: ContactCreate) -> Result<contact::Model, RepositoryError>;
    async fn update(&self, id: i32, patch: ContactPatch) -> Result<Option<contact::Model>, RepositoryError>;
    /// Returns the row as it was before deletion.
    async fn delete(&self, id: i32) -> Result<Option<contact::Model>, RepositoryError>;
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// SeaORM-backed repository implementation.
///
/// Every call runs in its own transaction: committed when the work succeeds,
/// rolled back on any error.
#[derive(Clone)]
pub struct SeaOrmContactRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmContactRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

async fn settle<T>(txn: DatabaseTransaction, result: Result<T, DbErr>) -> Result<T, RepositoryError> {
    match result {
        Ok(v) => {
            txn.commit().await?;
            Ok(v)
        }
        Err(e) => {
            if let Err(rb) = txn.rollback().await {
                warn!(error = %rb, "contact_txn_rollback_failed");
            }
            Err(e.into())
        }
    }
}

fn search_condition(needle: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(needle));
    let like = |col: contact::Column| {
        Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern.clone()).escape('\\'))
    };
    Condition::any()
        .add(like(contact::Column::FirstName))
        .add(like(contact::Column::LastName))
        .add(like(contact::Column::Email))
}

/// `to_char(birth_date, 'MM-DD') IN ('06-05', ...)`
fn birthday_condition(window: &BirthdayWindow) -> SimpleExpr {
    let keys: Vec<String> = window
        .month_days()
        .into_iter()
        .map(|(m, d)| format!("{m:02}-{d:02}"))
        .collect();
    Expr::expr(
        Func::cust(Alias::new("to_char"))
            .arg(Expr::col(contact::Column::BirthDate))
            .arg("MM-DD"),
    )
    .is_in(keys)
}

fn filter_condition(filter: &ContactFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(needle) = filter.search() {
        cond = cond.add(search_condition(needle));
    }
    if let Some(window) = filter.birthdays() {
        cond = cond.add(birthday_condition(window));
    }
    cond
}

#[async_trait]
impl ContactRepository for SeaOrmContactRepository {
    async fn list(&self, filter: &ContactFilter, page: Pagination) -> Result<(Vec<contact::Model>, u64), RepositoryError> {
        let txn = self.db.begin().await?;
        let cond = filter_condition(filter);
        let result: Result<_, DbErr> = async {
            let total = contact::Entity::find().filter(cond.clone()).count(&txn).await?;
            let items = contact::Entity::find()
                .filter(cond)
                .order_by_asc(contact::Column::Id)
                .offset(page.offset())
                .limit(page.limit)
                .all(&txn)
                .await?;
            Ok::<_, DbErr>((items, total))
        }
        .await;
        settle(txn, result).await
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<contact::Model>, RepositoryError> {
        Ok(contact::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn create(&self, input: ContactCreate) -> Result<contact::Model, RepositoryError> {
        let txn = self.db.begin().await?;
        let result = input.into_active_model().insert(&txn).await;
        settle(txn, result).await
    }

    async fn update(&self, id: i32, patch: ContactPatch) -> Result<Option<contact::Model>, RepositoryError> {
        let txn = self.db.begin().await?;
        let result: Result<Option<contact::Model>, DbErr> = async {
            let Some(found) = contact::Entity::find_by_id(id).one(&txn).await? else {
                return Ok(None);
            };
            let mut am: contact::ActiveModel = found.into();
            patch.apply(&mut am);
            am.update(&txn).await.map(Some)
        }
        .await;
        settle(txn, result).await
    }

    async fn delete(&self, id: i32) -> Result<Option<contact::Model>, RepositoryError> {
        let txn = self.db.begin().await?;
        let result: Result<Option<contact::Model>, DbErr> = async {
            let Some(found) = contact::Entity::find_by_id(id).one(&txn).await? else {
                return Ok(None);
            };
            found.clone().delete(&txn).await?;
            Ok(Some(found))
        }
        .await;
        settle(txn, result).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(self.db.ping().await?)
    }
}

/// In-process repository with the same filtering, uniqueness and
/// all-or-nothing write rules as the database one. Used by tests and by the
/// server when `CONTACTS_STORE=memory`.
pub mod memory {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use sea_orm::prelude::DateTimeWithTimeZone;
    use tokio::sync::RwLock;

    use super::*;

    #[derive(Default)]
    struct Table {
        rows: BTreeMap<i32, contact::Model>,
        last_id: i32,
    }

    impl Table {
        fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
            self.rows
                .values()
                .any(|r| r.email == email && Some(r.id) != except)
        }
    }

    #[derive(Default)]
    pub struct InMemoryContactRepository {
        table: RwLock<Table>,
    }

    impl InMemoryContactRepository {
        pub fn new() -> Self { Self::default() }
    }

    #[async_trait]
    impl ContactRepository for InMemoryContactRepository {
        async fn list(&self, filter: &ContactFilter, page: Pagination) -> Result<(Vec<contact::Model>, u64), RepositoryError> {
            let table = self.table.read().await;
            let matching: Vec<contact::Model> = table
                .rows
                .values()
                .filter(|c| filter.matches(c))
                .cloned()
                .collect();
            let total = matching.len() as u64;
            Ok((page.slice(&matching), total))
        }

        async fn get_by_id(&self, id: i32) -> Result<Option<contact::Model>, RepositoryError> {
            Ok(self.table.read().await.rows.get(&id).cloned())
        }

        async fn create(&self, input: ContactCreate) -> Result<contact::Model, RepositoryError> {
            let mut table = self.table.write().await;
            if table.email_taken(&input.email, None) {
                return Err(RepositoryError::Conflict { field: "email" });
            }
            table.last_id += 1;
            let now: DateTimeWithTimeZone = Utc::now().into();
            let row = contact::Model {
                id: table.last_id,
                first_name: input.first_name,
                last_name: input.last_name,
                email: input.email,
                phone: input.phone,
                birth_date: input.birth_date,
                notes: input.notes,
                created_at: now,
                updated_at: now,
            };
            table.rows.insert(row.id, row.clone());
            Ok(row)
        }

        async fn update(&self, id: i32, patch: ContactPatch) -> Result<Option<contact::Model>, RepositoryError> {
            let mut table = self.table.write().await;
            let Some(mut row) = table.rows.get(&id).cloned() else {
                return Ok(None);
            };
            patch.apply_to_model(&mut row);
            if table.email_taken(&row.email, Some(id)) {
                return Err(RepositoryError::Conflict { field: "email" });
            }
            let now: DateTimeWithTimeZone = Utc::now().into();
            row.updated_at = std::cmp::max(now, row.created_at);
            table.rows.insert(id, row.clone());
            Ok(Some(row))
        }

        async fn delete(&self, id: i32) -> Result<Option<contact::Model>, RepositoryError> {
            Ok(self.table.write().await.rows.remove(&id))
        }

        async fn ping(&self) -> Result<(), RepositoryError> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::memory::InMemoryContactRepository;
    use super::*;
    use crate::test_support::get_db;

    fn input(first: &str, last: &str, email: &str, birth: NaiveDate) -> ContactCreate {
        ContactCreate {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            phone: "+1 555 0100".into(),
            birth_date: birth,
            notes: None,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn memory_ids_are_never_reused() {
        let repo = InMemoryContactRepository::new();
        let a = repo.create(input("A", "A", "a@x.io", d(1990, 1, 1))).await.unwrap();
        repo.delete(a.id).await.unwrap();
        let b = repo.create(input("B", "B", "b@x.io", d(1990, 1, 1))).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn memory_conflicting_update_changes_nothing() {
        let repo = InMemoryContactRepository::new();
        repo.create(input("A", "A", "a@x.io", d(1990, 1, 1))).await.unwrap();
        let b = repo.create(input("B", "B", "b@x.io", d(1990, 1, 1))).await.unwrap();

        let patch = ContactPatch { first_name: Some("Changed".into()), email: Some("a@x.io".into()), ..Default::default() };
        assert_eq!(repo.update(b.id, patch).await, Err(RepositoryError::Conflict { field: "email" }));

        let after = repo.get_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(after, b);
    }

    #[tokio::test]
    async fn memory_email_uniqueness_is_case_sensitive() {
        let repo = InMemoryContactRepository::new();
        repo.create(input("A", "A", "a@x.io", d(1990, 1, 1))).await.unwrap();
        assert!(repo.create(input("A", "A", "A@x.io", d(1990, 1, 1))).await.is_ok());
        assert_eq!(
            repo.create(input("A", "A", "a@x.io", d(1990, 1, 1))).await,
            Err(RepositoryError::Conflict { field: "email" })
        );
    }

    #[tokio::test]
    async fn memory_offset_past_signed_range_is_empty_page() {
        let repo = InMemoryContactRepository::new();
        repo.create(input("A", "A", "a@x.io", d(1990, 1, 1))).await.unwrap();
        let (items, total) = repo.list(&ContactFilter::new(), Pagination::new(u64::MAX, 10)).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 1);
    }

    #[test]
    fn empty_filter_has_no_conditions() {
        assert!(filter_condition(&ContactFilter::new()).is_empty());
        let f = ContactFilter::new().with_search(Some("doe"));
        assert_eq!(filter_condition(&f).len(), 1);
    }

    // --- PostgreSQL-backed tests; skipped without a reachable database ---

    #[tokio::test]
    async fn seaorm_crud_roundtrip() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let repo = SeaOrmContactRepository::new(db);

        let email = format!("crud_{}@example.com", Uuid::new_v4().simple());
        let created = repo.create(input("John", "Doe", &email, d(2000, 6, 10))).await?;
        assert!(created.id > 0);
        assert_eq!(created.created_at, created.updated_at);

        let patch = ContactPatch { phone: Some("777".into()), notes: Some(Some("vip".into())), ..Default::default() };
        let updated = repo.update(created.id, patch).await?.expect("row exists");
        assert_eq!(updated.phone, "777");
        assert_eq!(updated.notes.as_deref(), Some("vip"));
        assert_eq!(updated.first_name, "John");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);

        let removed = repo.delete(created.id).await?.expect("row exists");
        assert_eq!(removed.id, created.id);
        assert!(repo.get_by_id(created.id).await?.is_none());
        assert!(repo.delete(created.id).await?.is_none());
        assert!(repo.update(created.id, ContactPatch::default()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn seaorm_duplicate_email_conflicts_and_rolls_back() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let repo = SeaOrmContactRepository::new(db);

        let tag = Uuid::new_v4().simple().to_string();
        let first = repo.create(input("A", "A", &format!("a_{tag}@example.com"), d(1990, 1, 1))).await?;
        let second = repo.create(input("B", "B", &format!("b_{tag}@example.com"), d(1990, 1, 1))).await?;

        let dup = repo.create(input("C", "C", &first.email, d(1990, 1, 1))).await;
        assert_eq!(dup, Err(RepositoryError::Conflict { field: "email" }));

        let patch = ContactPatch { last_name: Some("Changed".into()), email: Some(first.email.clone()), ..Default::default() };
        assert_eq!(repo.update(second.id, patch).await, Err(RepositoryError::Conflict { field: "email" }));
        let unchanged = repo.get_by_id(second.id).await?.expect("row exists");
        assert_eq!(unchanged.last_name, "B");

        repo.delete(first.id).await?;
        repo.delete(second.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn seaorm_list_filters_and_counts() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let repo = SeaOrmContactRepository::new(db);

        let tag = format!("zq{}", &Uuid::new_v4().simple().to_string()[..10]);
        let mut ids = Vec::new();
        for i in 0..12 {
            let birth = if i == 0 { d(1999, 12, 30) } else { d(1999, 3, 15) };
            let c = repo
                .create(input("Seed", &format!("{tag}_{i}"), &format!("{tag}_{i}@example.com"), birth))
                .await?;
            ids.push(c.id);
        }

        let f = ContactFilter::new().with_search(Some(&tag.to_uppercase()));
        let (items, total) = repo.list(&f, Pagination::new(10, 100)).await?;
        assert_eq!(total, 12);
        assert_eq!(items.len(), 2);

        let f = f.with_birthdays(Some(BirthdayWindow::upcoming(d(2024, 12, 28))));
        let (items, total) = repo.list(&f, Pagination::default()).await?;
        assert_eq!(total, 1);
        assert_eq!(items[0].id, ids[0]);

        let wildcard = ContactFilter::new().with_search(Some("%"));
        let (items, _) = repo.list(&wildcard, Pagination::new(0, 500)).await?;
        assert!(items.iter().all(|c| !c.last_name.starts_with(&tag)));

        for id in ids {
            repo.delete(id).await?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn seaorm_ping() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        SeaOrmContactRepository::new(db).ping().await?;
        Ok(())
    }

    #[tokio::test]
    async fn seaorm_offset_past_signed_range_is_empty_page() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let repo = SeaOrmContactRepository::new(db);

        let (items, _) = repo.list(&ContactFilter::new(), Pagination::new(u64::MAX, 10)).await?;
        assert!(items.is_empty());
        Ok(())
    }
}
