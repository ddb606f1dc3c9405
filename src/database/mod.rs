pub mod manager;
pub mod models;
pub mod repositories;

pub use manager::{DatabaseError, DatabaseManager};
pub use repositories::{
    DocumentRepository, HandbookRepository, OrganizationRepository, SubscriptionRepository,
    UserRepository,
};
