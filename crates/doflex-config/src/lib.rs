pub mod credentials;
pub mod error;
pub mod settings;

pub use credentials::discover_token;
pub use error::*;
pub use settings::DriverSettings;
