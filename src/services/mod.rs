// Service exports
pub mod completion;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use completion::{CompletionBackend, CompletionClient, GenerationParams, RawCompletion, NO_RESPONSE};
pub use memory::InMemoryMealRepository;
pub use postgres::PostgresClient;
pub use repository::{MealRepository, RepositoryError};
