pub mod charges;
pub mod metrics;
pub mod permissions;
pub mod provider;
pub mod repository;
pub mod validation;

pub use charges::ChargeService;
pub use provider::{MockProvider, PaymentProvider};
pub use repository::ChargeRepository;
