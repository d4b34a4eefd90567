pub mod routes;
pub mod startup;
pub mod state;
pub mod errors;
pub mod middleware;
pub mod openapi;

pub use startup::run;
