pub mod documents;
pub mod handbooks;
pub mod organizations;
pub mod subscriptions;
pub mod users;

pub use documents::DocumentRepository;
pub use handbooks::HandbookRepository;
pub use organizations::OrganizationRepository;
pub use subscriptions::SubscriptionRepository;
pub use users::UserRepository;
