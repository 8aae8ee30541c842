pub mod health;
pub mod orders;
pub mod settings;

pub use health::*;
pub use orders::*;
pub use settings::*;
