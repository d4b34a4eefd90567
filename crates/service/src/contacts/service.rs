use std::sync::Arc;

use chrono::{Local, NaiveDate};
use common::pagination::{Pagination, DEFAULT_LIMIT};
use models::schemas::{ContactCreate, ContactListResponse, ContactPatch, ContactResponse, ContactUpdate};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::errors::ServiceError;
use super::filters::{BirthdayWindow, ContactFilter};
use super::repository::ContactRepository;

/// Query string of `GET /contacts`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListContactsQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub search_text: Option<String>,
    #[serde(default)]
    pub upcoming_birthdays: Option<bool>,
}

fn default_limit() -> u64 { DEFAULT_LIMIT }

impl Default for ListContactsQuery {
    fn default() -> Self {
        Self { skip: 0, limit: DEFAULT_LIMIT, search_text: None, upcoming_birthdays: None }
    }
}

impl ListContactsQuery {
    pub fn pagination(&self) -> Pagination { Pagination::new(self.skip, self.limit) }
}

fn local_today() -> NaiveDate { Local::now().date_naive() }

/// Application service for the contact book.
///
/// Validates input, turns missing rows into `NotFound` and uniqueness
/// violations into `Conflict`; everything else is the repository's job.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use chrono::NaiveDate;
/// use models::schemas::ContactCreate;
/// use service::contacts::{ContactService, InMemoryContactRepository};
///
/// let svc = ContactService::new(Arc::new(InMemoryContactRepository::new()));
/// let input = ContactCreate {
///     first_name: "Ada".into(),
///     last_name: "Lovelace".into(),
///     email: "ada@example.com".into(),
///     phone: "+44 20 7946 0000".into(),
///     birth_date: NaiveDate::from_ymd_opt(1815, 12, 10).unwrap(),
///     notes: None,
/// };
/// let created = tokio_test::block_on(svc.create(input)).unwrap();
/// assert_eq!(created.id, 1);
/// ```
#[derive(Clone)]
pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
    today: fn() -> NaiveDate,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactRepository>) -> Self {
        Self { repo, today: local_today }
    }

    /// Use a fixed calendar instead of the local date.
    pub fn with_clock(repo: Arc<dyn ContactRepository>, today: fn() -> NaiveDate) -> Self {
        Self { repo, today }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: ListContactsQuery) -> Result<ContactListResponse, ServiceError> {
        let page = query.pagination().validate()?;
        let window = query
            .upcoming_birthdays
            .unwrap_or(false)
            .then(|| BirthdayWindow::upcoming((self.today)()));
        let filter = ContactFilter::new()
            .with_search(query.search_text.as_deref())
            .with_birthdays(window);

        let (rows, total_count) = self.repo.list(&filter, page).await.map_err(log_storage)?;
        Ok(ContactListResponse {
            total_count,
            items: rows.into_iter().map(ContactResponse::from).collect(),
        })
    }

    pub async fn get(&self, id: i32) -> Result<ContactResponse, ServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .map_err(log_storage)?
            .map(ContactResponse::from)
            .ok_or_else(|| ServiceError::not_found("Contact"))
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: ContactCreate) -> Result<ContactResponse, ServiceError> {
        input.validate()?;
        let created = self.repo.create(input).await.map_err(log_write_error)?;
        info!(id = created.id, "contact_created");
        Ok(created.into())
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn update(&self, id: i32, input: ContactUpdate) -> Result<ContactResponse, ServiceError> {
        input.validate()?;
        let updated = self
            .repo
            .update(id, ContactPatch::from(input))
            .await
            .map_err(log_write_error)?
            .ok_or_else(|| ServiceError::not_found("Contact"))?;
        info!(id = updated.id, "contact_updated");
        Ok(updated.into())
    }

    /// Deletes the contact and returns its last state.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<ContactResponse, ServiceError> {
        let removed = self
            .repo
            .delete(id)
            .await
            .map_err(log_storage)?
            .ok_or_else(|| ServiceError::not_found("Contact"))?;
        info!(id = removed.id, "contact_deleted");
        Ok(removed.into())
    }

    /// Round-trip to storage; errors when the database is unreachable.
    pub async fn health(&self) -> Result<(), ServiceError> {
        self.repo.ping().await.map_err(log_storage)
    }
}

fn log_storage(e: super::repository::RepositoryError) -> ServiceError {
    let e = ServiceError::from(e);
    if let ServiceError::Repository(msg) = &e {
        error!(error = %msg, "contact_storage_failed");
    }
    e
}

fn log_write_error(e: super::repository::RepositoryError) -> ServiceError {
    let e = log_storage(e);
    if let ServiceError::Conflict(msg) = &e {
        warn!(reason = %msg, "contact_write_conflict");
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::repository::memory::InMemoryContactRepository;

    fn fixed_today() -> NaiveDate { NaiveDate::from_ymd_opt(2000, 6, 5).unwrap() }

    fn svc() -> ContactService {
        ContactService::with_clock(Arc::new(InMemoryContactRepository::new()), fixed_today)
    }

    fn create(first: &str, last: &str, email: &str, birth: (i32, u32, u32)) -> ContactCreate {
        ContactCreate {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            phone: "0501234567".into(),
            birth_date: NaiveDate::from_ymd_opt(birth.0, birth.1, birth.2).unwrap(),
            notes: None,
        }
    }

    fn update_from(c: &ContactResponse) -> ContactUpdate {
        ContactUpdate {
            first_name: c.first_name.clone(),
            last_name: c.last_name.clone(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            birth_date: c.birth_date,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamps() {
        let s = svc();
        let c = s.create(create("John", "Doe", "john@x.com", (2000, 6, 10))).await.unwrap();
        assert!(c.id > 0);
        assert_eq!(c.updated_at, Some(c.created_at));
        assert_eq!(s.get(c.id).await.unwrap(), c);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_storage() {
        let s = svc();
        let err = s.create(create("", "Doe", "john@x.com", (2000, 6, 10))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = s.create(create("John", "Doe", "not-an-email", (2000, 6, 10))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(s.list(ListContactsQuery::default()).await.unwrap().total_count, 0);
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let s = svc();
        s.create(create("John", "Doe", "john@x.com", (2000, 6, 10))).await.unwrap();
        let err = s.create(create("Johnny", "Doe", "john@x.com", (2001, 1, 1))).await.unwrap_err();
        assert_eq!(err, ServiceError::Conflict("Contact with this email already exists".into()));
        assert!(s.create(create("Jane", "Doe", "jane@x.com", (2001, 1, 1))).await.is_ok());
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let s = svc();
        assert!(matches!(s.get(42).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(s.delete(42).await, Err(ServiceError::NotFound(_))));
        let c = s.create(create("John", "Doe", "john@x.com", (2000, 6, 10))).await.unwrap();
        let mut body = update_from(&c);
        body.first_name = "Other".into();
        assert!(matches!(s.update(c.id + 1, body).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_changes_supplied_fields_only() {
        let s = svc();
        let mut input = create("John", "Doe", "john@x.com", (2000, 6, 10));
        input.notes = Some("keep me".into());
        let c = s.create(input).await.unwrap();

        let mut body = update_from(&c);
        body.phone = "111".into();
        let u = s.update(c.id, body).await.unwrap();
        assert_eq!(u.phone, "111");
        assert_eq!(u.notes.as_deref(), Some("keep me"));
        assert_eq!(u.created_at, c.created_at);
        assert!(u.updated_at >= c.updated_at);

        let mut body = update_from(&c);
        body.notes = Some(None);
        let cleared = s.update(c.id, body).await.unwrap();
        assert_eq!(cleared.notes, None);
    }

    #[tokio::test]
    async fn delete_returns_snapshot_then_gone() {
        let s = svc();
        let c = s.create(create("John", "Doe", "john@x.com", (2000, 6, 10))).await.unwrap();
        let removed = s.delete(c.id).await.unwrap();
        assert_eq!(removed, c);
        assert!(matches!(s.get(c.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn search_and_total_count() {
        let s = svc();
        s.create(create("John", "Doe", "john@x.com", (2000, 6, 10))).await.unwrap();
        s.create(create("Jane", "Roe", "jane.doe@x.com", (2000, 6, 2))).await.unwrap();
        s.create(create("Bob", "Smith", "bob@x.com", (2000, 1, 1))).await.unwrap();

        let q = ListContactsQuery { search_text: Some("DOE".into()), ..Default::default() };
        let page = s.list(q).await.unwrap();
        assert_eq!(page.total_count, 2);
        assert!(page.items.iter().all(|c| c.last_name == "Doe" || c.email.contains("doe")));
    }

    #[tokio::test]
    async fn upcoming_birthdays_look_forward_only() {
        let s = svc();
        s.create(create("John", "Doe", "john@x.com", (2000, 6, 10))).await.unwrap();
        s.create(create("Jane", "Roe", "jane@x.com", (2000, 6, 2))).await.unwrap();

        let q = ListContactsQuery { upcoming_birthdays: Some(true), ..Default::default() };
        let page = s.list(q).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|c| c.first_name.as_str()).collect();
        assert_eq!(names, vec!["John"]);

        let q = ListContactsQuery { upcoming_birthdays: Some(false), ..Default::default() };
        assert_eq!(s.list(q).await.unwrap().total_count, 2);
    }

    #[tokio::test]
    async fn pagination_keeps_full_count() {
        let s = svc();
        for i in 0..12 {
            s.create(create("P", &format!("N{i}"), &format!("p{i}@x.com"), (1990, 1, 1))).await.unwrap();
        }
        let q = ListContactsQuery { skip: 10, limit: 100, ..Default::default() };
        let page = s.list(q).await.unwrap();
        assert_eq!(page.total_count, 12);
        assert_eq!(page.items.len(), 2);

        let q = ListContactsQuery { limit: 501, ..Default::default() };
        assert!(matches!(s.list(q).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn health_ok_for_memory_store() {
        assert!(svc().health().await.is_ok());
    }
}
