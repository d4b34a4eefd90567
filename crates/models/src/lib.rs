//! Persistence model for the contact book: the SeaORM entity, the request
//! and response schemas, and connection helpers.

pub mod errors;
pub mod db;
pub mod contact;
pub mod schemas;
