pub mod customer_resolver;
pub mod events;
pub mod notifier;
pub mod order_service;
pub mod validation;

pub use customer_resolver::*;
pub use events::*;
pub use notifier::*;
pub use order_service::*;
pub use validation::*;
