//! Login gate, Spotify implicit-grant redirect and route protection.
//!
//! The credential check is a demo stand-in; the cookie it sets is what
//! [`guard`] looks for.
use reqwest::Url;

use crate::config::AppConfig;
use crate::error::AuthError;

pub const AUTH_COOKIE: &str = "authToken";
pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/home-page";
pub const HELP_PATH: &str = "/howto-page";
pub const PROTECTED_ROUTES: [&str; 2] = [DASHBOARD_PATH, HELP_PATH];

const DEMO_EMAIL: &str = "user@example.com";
const DEMO_PASSWORD: &str = "password123";
const DEMO_TOKEN: &str = "demo-auth-token-12345";
const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

pub fn is_protected(path: &str) -> bool {
    PROTECTED_ROUTES.iter().any(|r| path.starts_with(r))
}

/// Value of `name` in a `document.cookie` style header.
pub fn cookie_value<'a>(cookies: &'a str, name: &str) -> Option<&'a str> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

pub fn guard(path: &str, cookies: &str) -> RouteDecision {
    if is_protected(path) && cookie_value(cookies, AUTH_COOKIE).is_none() {
        RouteDecision::Redirect(login_redirect(path))
    } else {
        RouteDecision::Allow
    }
}

pub fn login_redirect(from: &str) -> String {
    format!("{}?from={}", LOGIN_PATH, urlencoding::encode(from))
}

/// `from` query parameter of a login URL, restricted to local paths.
pub fn return_path(query: &str) -> String {
    let query = query.trim_start_matches('?');
    reqwest::Url::parse(&format!("http://local/?{}", query))
        .ok()
        .and_then(|u| u.query_pairs().find(|(k, _)| k == "from").map(|(_, v)| v.into_owned()))
        .filter(|p| p.starts_with('/') && !p.starts_with("//"))
        .unwrap_or_else(|| DASHBOARD_PATH.to_string())
}

pub fn authenticate(email: &str, password: &str) -> Result<String, AuthError> {
    if email.trim() == DEMO_EMAIL && password == DEMO_PASSWORD {
        Ok(DEMO_TOKEN.to_string())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

pub fn auth_cookie(token: &str) -> String {
    format!("{}={}; path=/; max-age={}; Secure; SameSite=Lax", AUTH_COOKIE, token, COOKIE_MAX_AGE_SECS)
}

pub fn clear_auth_cookie() -> String {
    format!("{}=; path=/; max-age=0; Secure; SameSite=Lax", AUTH_COOKIE)
}

pub fn authorize_url(config: &AppConfig) -> Result<String, String> {
    let scope = config.scopes.join(" ");
    Url::parse_with_params(
        &config.authorize_endpoint,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("response_type", "token"),
            ("show_dialog", "true"),
        ],
    )
    .map(String::from)
    .map_err(|e| e.to_string())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_in: Option<u64>,
}

/// Pulls `access_token` out of the redirect URL (query or fragment). Returns
/// the token and the bare path, ready to replace the visible URL.
pub fn take_access_token(href: &str) -> Option<(AccessToken, String)> {
    let url = Url::parse(href).ok()?;
    let fragment_pairs = url
        .fragment()
        .and_then(|f| Url::parse(&format!("http://local/?{}", f)).ok())
        .map(|u| u.query_pairs().into_owned().collect::<Vec<_>>())
        .unwrap_or_default();
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().chain(fragment_pairs).collect();

    let value = pairs.iter().find(|(k, _)| k == "access_token").map(|(_, v)| v.clone())?;
    if value.is_empty() {
        return None;
    }
    let expires_in = pairs
        .iter()
        .find(|(k, _)| k == "expires_in")
        .and_then(|(_, v)| v.parse().ok());

    Some((AccessToken { value, expires_in }, url.path().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_protected_route_redirects_with_return_path() {
        assert_eq!(
            guard("/home-page", ""),
            RouteDecision::Redirect("/login?from=%2Fhome-page".to_string())
        );
        assert_eq!(guard("/howto-page", "theme=dark"), RouteDecision::Redirect("/login?from=%2Fhowto-page".into()));
    }

    #[test]
    fn cookie_unlocks_protected_routes() {
        assert_eq!(guard("/home-page", "theme=dark; authToken=demo"), RouteDecision::Allow);
        assert_eq!(guard("/home-page", "authToken="), RouteDecision::Redirect(login_redirect("/home-page")));
    }

    #[test]
    fn login_redirect_escapes_the_return_path() {
        let to = login_redirect("/howto-page?step=2&x=a b");
        assert_eq!(to, "/login?from=%2Fhowto-page%3Fstep%3D2%26x%3Da%20b");
        assert_eq!(return_path(&to["/login".len()..]), "/howto-page?step=2&x=a b");
    }

    #[test]
    fn public_routes_are_allowed() {
        assert_eq!(guard("/login", ""), RouteDecision::Allow);
        assert_eq!(guard("/", ""), RouteDecision::Allow);
    }

    #[test]
    fn return_path_defaults_and_rejects_external() {
        assert_eq!(return_path("?from=%2Fhowto-page"), "/howto-page");
        assert_eq!(return_path(""), DASHBOARD_PATH);
        assert_eq!(return_path("from=https://evil.example"), DASHBOARD_PATH);
        assert_eq!(return_path("from=//evil.example"), DASHBOARD_PATH);
    }

    #[test]
    fn demo_credentials() {
        assert_eq!(authenticate("user@example.com", "password123").as_deref(), Ok(DEMO_TOKEN));
        assert_eq!(authenticate("user@example.com", "nope"), Err(AuthError::InvalidCredentials));
        assert!(auth_cookie("t").starts_with("authToken=t; path=/; max-age=604800"));
    }

    #[test]
    fn authorize_url_carries_scopes_and_grant() {
        let config = AppConfig { client_id: "cid".into(), ..AppConfig::default() };
        let url = authorize_url(&config).unwrap();
        assert!(url.starts_with("https://accounts.spotify.com/authorize?client_id=cid"));
        assert!(url.contains("scope=user-read-recently-played+user-top-read"));
        assert!(url.contains("response_type=token"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fhome-page"));
    }

    #[test]
    fn token_is_taken_from_query_and_stripped() {
        let (token, clean) =
            take_access_token("https://app.example/home-page?access_token=abc&expires_in=3600").unwrap();
        assert_eq!(token, AccessToken { value: "abc".into(), expires_in: Some(3600) });
        assert_eq!(clean, "/home-page");
    }

    #[test]
    fn token_is_taken_from_fragment() {
        let (token, _) =
            take_access_token("https://app.example/home-page#access_token=xyz&token_type=Bearer").unwrap();
        assert_eq!(token.value, "xyz");
        assert_eq!(token.expires_in, None);
    }

    #[test]
    fn no_token_no_change() {
        assert!(take_access_token("https://app.example/home-page").is_none());
        assert!(take_access_token("https://app.example/home-page?access_token=").is_none());
    }
}
