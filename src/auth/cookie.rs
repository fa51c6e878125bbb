use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::AppConfig;

/// Attributes of the session cookie that carries the bearer token.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    secure: bool,
    same_site: SameSite,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secure: bool, same_site: SameSite) -> Self {
        Self {
            name: name.into(),
            secure,
            same_site,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.security.cookie_name.clone(),
            config.cookie_secure(),
            config.cookie_same_site(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// HTTP-only session cookie; no Max-Age, the token's own expiry governs
    pub fn issue(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.name.clone(), token))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .path("/")
            .build()
    }

    /// Same cookie, emptied with Max-Age=0 so the browser drops it
    pub fn clear(&self) -> Cookie<'static> {
        let mut cookie = self.issue(String::new());
        cookie.make_removal();
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_cookie_is_strict_and_not_secure() {
        let cookie = SessionCookie::from_config(&AppConfig::development()).issue("abc".to_string());
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn production_cookie_is_cross_site() {
        let cookie = SessionCookie::from_config(&AppConfig::production()).issue("abc".to_string());
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
    }

    #[test]
    fn cleared_cookie_keeps_attributes_and_expires() {
        let session = SessionCookie::from_config(&AppConfig::production());
        let cookie = session.clear();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age().map(|d| d.whole_seconds()), Some(0));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));

        let header = cookie.to_string();
        assert!(header.contains("Max-Age=0"), "{header}");
    }
}
