pub mod account;
pub mod account_directory;
pub mod order;
pub mod order_store;

pub use account::*;
pub use account_directory::*;
pub use order::*;
pub use order_store::*;
