mod error;
mod memory;
mod traits;

pub mod conformance;

pub use error::RepositoryError;
pub use memory::InMemoryRepository;
pub use traits::Repository;
