//! Configuration module

mod site;

pub use site::AuthConfig;
pub use site::BlogConfig;
pub use site::ServerConfig;
