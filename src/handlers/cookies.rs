// Cookie management helpers
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpResponse;
use time::Duration;

pub const TOKEN_COOKIE_NAME: &str = "token";

/// Create an HttpOnly, SameSite=Strict cookie
pub fn create_auth_cookie<'a>(
    name: &'a str,
    value: String,
    max_age_seconds: i64,
    secure: bool,
) -> Cookie<'a> {
    let mut cookie = Cookie::build(name, value)
        .path("/")
        .max_age(Duration::seconds(max_age_seconds))
        .http_only(true)
        .same_site(SameSite::Strict)
        .finish();

    if secure {
        cookie.set_secure(true);
    }

    cookie
}

/// Set the token cookie on a response
pub fn set_auth_cookie(
    mut response: HttpResponse,
    token: String,
    ttl: i64,
    secure: bool,
) -> HttpResponse {
    let cookie = create_auth_cookie(TOKEN_COOKIE_NAME, token, ttl, secure);
    response.add_cookie(&cookie).ok();
    response
}

/// Clear the token cookie (set to expired)
pub fn clear_auth_cookie(mut response: HttpResponse) -> HttpResponse {
    let expired = Cookie::build(TOKEN_COOKIE_NAME, "")
        .path("/")
        .max_age(Duration::seconds(0))
        .http_only(true)
        .same_site(SameSite::Strict)
        .finish();
    response.add_cookie(&expired).ok();
    response
}

/// Extract a token from the request. The Authorization header takes priority
/// over the cookie: when both are present the header wins.
pub fn extract_token(req: &actix_web::HttpRequest) -> Option<String> {
    if let Some(h) = req.headers().get("authorization") {
        if let Ok(s) = h.to_str() {
            if let Some(rest) = s.strip_prefix("Bearer ").or_else(|| s.strip_prefix("bearer ")) {
                if !rest.trim().is_empty() {
                    return Some(rest.trim().to_string());
                }
            }
        }
    }

    if let Some(cookie) = req.cookie(TOKEN_COOKIE_NAME) {
        let val = cookie.value().trim();
        if !val.is_empty() {
            return Some(val.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn header_wins_over_cookie() {
        let req = TestRequest::default()
            .insert_header(("authorization", "Bearer from-header"))
            .cookie(Cookie::new(TOKEN_COOKIE_NAME, "from-cookie"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("from-header"));
    }

    #[test]
    fn falls_back_to_cookie() {
        let req = TestRequest::default()
            .cookie(Cookie::new(TOKEN_COOKIE_NAME, "from-cookie"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn secure_flag_follows_configuration() {
        let on = create_auth_cookie(TOKEN_COOKIE_NAME, "t".into(), 60, true);
        assert_eq!(on.secure(), Some(true));

        let off = create_auth_cookie(TOKEN_COOKIE_NAME, "t".into(), 60, false);
        assert_ne!(off.secure(), Some(true));
    }

    #[test]
    fn empty_values_are_ignored() {
        let req = TestRequest::default()
            .insert_header(("authorization", "Bearer   "))
            .to_http_request();
        assert_eq!(extract_token(&req), None);

        let req = TestRequest::default().to_http_request();
        assert_eq!(extract_token(&req), None);
    }
}
