pub mod types;
pub mod pagination;

pub mod utils {
    pub mod logging;
}
