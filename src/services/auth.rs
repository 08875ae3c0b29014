use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Platform;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Source of the authenticated HTTP client every probe goes through.
pub trait AuthSession: Send + Sync {
    fn http_client(&self) -> Result<Client>;
}

/// Session built from cookies exported out of a logged-in browser. The
/// platforms share one SSO, so every cookie is set on every platform host.
pub struct CookieSession {
    cookies: Vec<String>,
    user_agent: String,
    connect_timeout: Duration,
}

impl CookieSession {
    pub fn new(cookies: Vec<String>) -> Self {
        Self {
            cookies,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn cookie_jar(&self) -> Result<Jar> {
        if self.cookies.is_empty() {
            return Err(AppError::Auth(
                "no session cookies configured; add them under [auth] session_cookies".into(),
            ));
        }

        let jar = Jar::default();
        for platform in Platform::ALL {
            let origin = Url::parse(&platform.origin())
                .map_err(|e| AppError::Auth(format!("bad origin for {}: {}", platform, e)))?;
            for cookie in &self.cookies {
                let pair = cookie.split(';').next().unwrap_or_default().trim();
                match pair.split_once('=') {
                    Some((name, _)) if !name.trim().is_empty() => {}
                    _ => {
                        return Err(AppError::Auth(format!(
                            "malformed session cookie '{}', expected name=value",
                            cookie
                        )))
                    }
                }
                jar.add_cookie_str(
                    &format!("{}; Domain={}; Path=/", pair, platform.as_str()),
                    &origin,
                );
            }
        }
        Ok(jar)
    }
}

impl AuthSession for CookieSession {
    fn http_client(&self) -> Result<Client> {
        let jar = self.cookie_jar()?;
        tracing::debug!(
            "Session built with {} cookies for {} platforms",
            self.cookies.len(),
            Platform::ALL.len()
        );
        let client = Client::builder()
            .cookie_provider(Arc::new(jar))
            .user_agent(self.user_agent.clone())
            .connect_timeout(self.connect_timeout)
            .build()?;
        Ok(client)
    }
}
