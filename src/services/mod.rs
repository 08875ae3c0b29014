mod auth;
mod discovery;

pub use auth::{AuthSession, CookieSession, DEFAULT_USER_AGENT};
pub use discovery::{ContentDiscovery, JsonFileDiscovery};
