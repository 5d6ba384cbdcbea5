//! Redirect handling.
//!
//! The dispatcher consults [`plan`] after every hop: it applies the
//! request's [`RedirectPolicy`](crate::RedirectPolicy), the hop budget and
//! the per-status method rewrite rules, and reports whether to finish,
//! reject or issue another hop. [`is_redirect`] is the public predicate for
//! the five Location-bearing status codes.

use std::fmt;

use http::{Method, StatusCode};
use url::Url;

use crate::error;
use crate::http::headers::Headers;
use crate::http::request::{RedirectPolicy, Request};

/// True for the standard redirect status codes: 301, 302, 303, 307, 308.
#[must_use]
pub fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Outcome of the redirect decision for one response.
#[derive(Debug)]
pub(crate) enum Step {
    /// Hand the response to the caller as a terminal response.
    Finish,
    /// Reject the whole fetch with this error.
    Reject(crate::Error),
    /// Issue another hop at `url`, rewriting to a bare GET when `to_get`.
    Hop { url: Url, to_get: bool },
}

/// Decides what to do with a response, given the request that produced it.
///
/// Ordering mirrors the fetch algorithm: a Location-less redirect is
/// terminal, the hop budget is charged before anything else can fail, and
/// a stream body blocks every non-303 hop even when the rewrite would have
/// dropped it.
pub(crate) fn plan(request: &Request, status: StatusCode, headers: &Headers) -> Step {
    if !is_redirect(status.as_u16()) {
        return Step::Finish;
    }

    match request.redirect() {
        RedirectPolicy::Error => Step::Reject(error::no_redirect(request.url().clone())),
        RedirectPolicy::Manual => Step::Finish,
        RedirectPolicy::Follow => {
            let location = match headers.get("location") {
                Some(location) => location,
                None => return Step::Finish,
            };
            if request.counter() >= request.follow() {
                return Step::Reject(error::max_redirect(request.url().clone()));
            }
            let next = match request.url().join(&location) {
                Ok(next) => next,
                Err(_) => {
                    return Step::Reject(
                        error::builder(InvalidLocation(location))
                            .with_url(request.url().clone()),
                    );
                }
            };
            if !matches!(next.scheme(), "http" | "https") {
                return Step::Reject(error::url_bad_scheme(next));
            }
            if next.host_str().is_none() {
                return Step::Reject(error::url_missing_host(next));
            }
            if status != StatusCode::SEE_OTHER && request.body().blocks_replay() {
                return Step::Reject(error::unsupported_redirect(request.url().clone()));
            }
            let to_get = rewrites_to_get(status, request.method());
            Step::Hop { url: next, to_get }
        }
    }
}

/// The 303 / 301-302-POST rule: these hops become bare GETs.
pub(crate) fn rewrites_to_get(status: StatusCode, method: &Method) -> bool {
    status == StatusCode::SEE_OTHER
        || ((status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND)
            && *method == Method::POST)
}

/// Mutates `request` into the next hop: strips sensitive headers when the
/// hop leaves the current host, applies the GET rewrite, bumps the counter
/// and retargets the URL.
pub(crate) fn apply_hop(request: &mut Request, next: Url, to_get: bool) {
    let previous = request.url().clone();
    remove_sensitive_headers(request.headers_mut(), &next, &previous);
    if to_get {
        *request.method_mut() = Method::GET;
        request.clear_body();
        request.headers_mut().delete("content-length");
    }
    let counter = request.counter() + 1;
    request.set_counter(counter);
    *request.url_mut() = next;
}

/// Removes credential-bearing headers when redirecting to a different
/// scheme, host or port.
pub(crate) fn remove_sensitive_headers(headers: &mut Headers, next: &Url, previous: &Url) {
    let cross_origin = next.scheme() != previous.scheme()
        || next.host_str() != previous.host_str()
        || next.port_or_known_default() != previous.port_or_known_default();
    if cross_origin {
        headers.delete("authorization");
        headers.delete("www-authenticate");
        headers.delete("cookie");
        headers.delete("cookie2");
    }
}

/// Rewrites a manual-mode response's `Location` to an absolute URL when it
/// resolves against `base`. A malformed value is left untouched.
pub(crate) fn absolutize_location(headers: &mut Headers, base: &Url) {
    let raw = match headers.get("location") {
        Some(raw) => raw,
        None => return,
    };
    if let Ok(absolute) = base.join(&raw) {
        let _ = headers.set("location", absolute.as_str());
    }
}

#[derive(Debug)]
struct InvalidLocation(String);

impl fmt::Display for InvalidLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid redirect URL: {}", self.0)
    }
}

impl std::error::Error for InvalidLocation {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::body::Body;
    use bytes::Bytes;

    fn request(method: Method, url: &str) -> Request {
        Request::new(method, url).expect("test URL parses")
    }

    fn location_headers(value: &str) -> Headers {
        let mut headers = Headers::new();
        headers.set("location", value).expect("valid header");
        headers
    }

    fn stream_body() -> Body {
        Body::wrap_stream(futures_util::stream::iter(vec![Ok::<_, std::io::Error>(
            Bytes::from_static(b"live"),
        )]))
    }

    #[test]
    fn redirect_predicate_matches_the_five_codes() {
        for code in [301, 302, 303, 307, 308] {
            assert!(is_redirect(code), "{code} is a redirect");
        }
        for code in [200, 204, 300, 304, 305, 306, 309, 400] {
            assert!(!is_redirect(code), "{code} is not a redirect");
        }
    }

    #[test]
    fn non_redirect_status_finishes() {
        let req = request(Method::GET, "http://a.test/");
        let step = plan(&req, StatusCode::OK, &location_headers("/next"));
        assert!(matches!(step, Step::Finish));
    }

    #[test]
    fn error_policy_rejects_with_no_redirect() {
        let mut req = request(Method::GET, "http://a.test/");
        req.set_redirect(RedirectPolicy::Error);
        match plan(&req, StatusCode::FOUND, &location_headers("/next")) {
            Step::Reject(err) => {
                assert_eq!(err.kind(), &crate::Kind::NoRedirect);
                assert!(err.is_redirect());
            }
            step => panic!("expected rejection, got {step:?}"),
        }
    }

    #[test]
    fn manual_policy_finishes_untouched() {
        let mut req = request(Method::GET, "http://a.test/");
        req.set_redirect(RedirectPolicy::Manual);
        let step = plan(&req, StatusCode::MOVED_PERMANENTLY, &location_headers("/next"));
        assert!(matches!(step, Step::Finish));
    }

    #[test]
    fn missing_location_is_terminal() {
        let req = request(Method::GET, "http://a.test/");
        let step = plan(&req, StatusCode::MOVED_PERMANENTLY, &Headers::new());
        assert!(matches!(step, Step::Finish));
    }

    #[test]
    fn hop_budget_is_charged_first() {
        let mut req = request(Method::GET, "http://a.test/");
        req.set_follow(5);
        req.set_counter(5);
        match plan(&req, StatusCode::FOUND, &location_headers("/next")) {
            Step::Reject(err) => assert_eq!(err.kind(), &crate::Kind::MaxRedirect),
            step => panic!("expected rejection, got {step:?}"),
        }
    }

    #[test]
    fn relative_location_resolves_against_the_request_url() {
        let req = request(Method::GET, "http://a.test/dir/page");
        match plan(&req, StatusCode::FOUND, &location_headers("../inspect")) {
            Step::Hop { url, .. } => assert_eq!(url.as_str(), "http://a.test/inspect"),
            step => panic!("expected hop, got {step:?}"),
        }
    }

    #[test]
    fn stream_bodies_cannot_follow_non_303_redirects() {
        let mut req = request(Method::POST, "http://a.test/upload");
        req.set_body(stream_body()).expect("POST accepts a body");

        match plan(&req, StatusCode::TEMPORARY_REDIRECT, &location_headers("/next")) {
            Step::Reject(err) => assert_eq!(err.kind(), &crate::Kind::UnsupportedRedirect),
            step => panic!("expected rejection, got {step:?}"),
        }

        // 303 drops the body, so a stream is fine there.
        match plan(&req, StatusCode::SEE_OTHER, &location_headers("/next")) {
            Step::Hop { to_get, .. } => assert!(to_get),
            step => panic!("expected hop, got {step:?}"),
        }
    }

    #[test]
    fn method_rewrite_follows_the_303_and_post_rules() {
        let post = Method::POST;
        let put = Method::PUT;
        let get = Method::GET;

        assert!(rewrites_to_get(StatusCode::SEE_OTHER, &get));
        assert!(rewrites_to_get(StatusCode::SEE_OTHER, &put));
        assert!(rewrites_to_get(StatusCode::MOVED_PERMANENTLY, &post));
        assert!(rewrites_to_get(StatusCode::FOUND, &post));
        assert!(!rewrites_to_get(StatusCode::MOVED_PERMANENTLY, &put));
        assert!(!rewrites_to_get(StatusCode::FOUND, &get));
        assert!(!rewrites_to_get(StatusCode::TEMPORARY_REDIRECT, &post));
        assert!(!rewrites_to_get(StatusCode::PERMANENT_REDIRECT, &post));
    }

    #[test]
    fn malformed_location_rejects_with_builder_error() {
        let req = request(Method::GET, "http://a.test/");
        match plan(&req, StatusCode::FOUND, &location_headers("http://[malformed")) {
            Step::Reject(err) => assert!(err.is_builder()),
            step => panic!("expected rejection, got {step:?}"),
        }
    }

    #[test]
    fn apply_hop_rewrites_method_body_and_counter() {
        let mut req = request(Method::POST, "http://a.test/form");
        req.set_body("payload").expect("POST accepts a body");
        req.headers_mut()
            .set("content-length", "7")
            .expect("valid header");

        apply_hop(
            &mut req,
            Url::parse("http://a.test/landing").expect("static URL parses"),
            true,
        );

        assert_eq!(req.method(), &Method::GET);
        assert!(!req.body().has_content());
        assert!(!req.headers().has("content-length"));
        assert_eq!(req.counter(), 1);
        assert_eq!(req.url().as_str(), "http://a.test/landing");
    }

    #[test]
    fn cross_host_hops_strip_credentials() {
        let mut req = request(Method::GET, "http://a.test/");
        req.headers_mut()
            .set("authorization", "Bearer token")
            .expect("valid header");
        req.headers_mut()
            .set("cookie", "id=1")
            .expect("valid header");
        req.headers_mut()
            .set("accept", "text/plain")
            .expect("valid header");

        apply_hop(
            &mut req,
            Url::parse("http://b.test/").expect("static URL parses"),
            false,
        );

        assert!(!req.headers().has("authorization"));
        assert!(!req.headers().has("cookie"));
        assert!(req.headers().has("accept"));
    }

    #[test]
    fn same_host_hops_keep_credentials() {
        let mut req = request(Method::GET, "http://a.test/one");
        req.headers_mut()
            .set("authorization", "Bearer token")
            .expect("valid header");

        apply_hop(
            &mut req,
            Url::parse("http://a.test/two").expect("static URL parses"),
            false,
        );

        assert!(req.headers().has("authorization"));
    }

    #[test]
    fn scheme_change_counts_as_cross_origin() {
        let mut headers = Headers::new();
        headers
            .set("authorization", "Bearer token")
            .expect("valid header");
        remove_sensitive_headers(
            &mut headers,
            &Url::parse("https://a.test/").expect("static URL parses"),
            &Url::parse("http://a.test/").expect("static URL parses"),
        );
        assert!(!headers.has("authorization"));
    }

    #[test]
    fn manual_location_absolutizes_when_possible() {
        let base = Url::parse("http://a.test/dir/page").expect("static URL parses");

        let mut headers = location_headers("next");
        absolutize_location(&mut headers, &base);
        assert_eq!(
            headers.get("location").as_deref(),
            Some("http://a.test/dir/next")
        );

        let mut headers = location_headers("http://[malformed");
        absolutize_location(&mut headers, &base);
        assert_eq!(
            headers.get("location").as_deref(),
            Some("http://[malformed")
        );
    }
}
