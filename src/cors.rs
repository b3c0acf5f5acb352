//! Permissive cross-origin headers for development. The deployed
//! client is served from the same origin, so nothing here runs
//! outside debug mode.
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_HEADERS,
};
use hyper::{Body, Request, Response};

pub fn allow_origin(mut response: Response<Body>) -> Response<Body> {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

/// Answers an `OPTIONS` preflight, echoing the requested headers back.
pub fn preflight_requests(req: Request<Body>) -> Response<Body> {
    let requested = req
        .headers()
        .get(ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(""));
    let mut response = Response::new(Body::empty());
    let headers = response.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, PATCH"),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested);
    allow_origin(response)
}

#[cfg(test)]
mod tests {
    use hyper::header::{
        HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_REQUEST_HEADERS,
    };
    use hyper::{Body, Request, Response};

    #[test]
    fn test_allow_origin() {
        let response = super::allow_origin(Response::new(Body::empty()));
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("*"))
        );
    }

    #[test]
    fn test_preflight() {
        let request = Request::builder()
            .method("OPTIONS")
            .header(ACCESS_CONTROL_REQUEST_HEADERS, "authorization, content-type")
            .body(Body::empty())
            .unwrap();
        let response = super::preflight_requests(request);
        let headers = response.headers();
        assert_eq!(
            headers.get(ACCESS_CONTROL_ALLOW_HEADERS),
            Some(&HeaderValue::from_static("authorization, content-type"))
        );
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN), Some(&HeaderValue::from_static("*")));
        assert!(headers.contains_key(ACCESS_CONTROL_ALLOW_METHODS));

        // no requested headers to echo is fine
        let bare = Request::builder().method("OPTIONS").body(Body::empty()).unwrap();
        let response = super::preflight_requests(bare);
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_HEADERS),
            Some(&HeaderValue::from_static(""))
        );
    }
}
