//! Security headers middleware.
//!
//! The site serves its own CSS and plain HTML forms, nothing else, so the
//! policy allows only same-origin styles and form posts.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

/// Content security policy for every page.
const CSP: &str = "default-src 'none'; \
                   style-src 'self'; \
                   img-src 'self' data:; \
                   font-src 'self'; \
                   form-action 'self'; \
                   base-uri 'self'; \
                   frame-ancestors 'none'; \
                   object-src 'none'";

/// Browser features the site never needs.
const PERMISSIONS_POLICY: &str = "camera=(), geolocation=(), microphone=(), payment=(), \
                                  usb=(), interest-cohort=()";

/// Headers set on every response.
///
/// Pages show per-user ratings and admin data, so nothing is cacheable.
const HEADERS: [(HeaderName, &str); 8] = [
    (X_FRAME_OPTIONS, "DENY"),
    (X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (REFERRER_POLICY, "same-origin"),
    (CONTENT_SECURITY_POLICY, CSP),
    (CACHE_CONTROL, "no-store, max-age=0"),
    (HeaderName::from_static("permissions-policy"), PERMISSIONS_POLICY),
    (HeaderName::from_static("cross-origin-opener-policy"), "same-origin"),
    (HeaderName::from_static("cross-origin-resource-policy"), "same-origin"),
];

/// Add security headers to all responses.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    response
}
