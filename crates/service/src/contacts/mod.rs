//! Contacts: filters, persistence port and the application service.

pub mod filters;
pub mod repository;
pub mod service;

pub use repository::{memory::InMemoryContactRepository, ContactRepository, RepositoryError, SeaOrmContactRepository};
pub use service::{ContactService, ListContactsQuery};
