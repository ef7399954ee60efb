use http::header::{HeaderValue, LOCATION};
use http::StatusCode;
use hyper::{Body, Request, Response};
use log::{info, warn};

use crate::rules::RoutingTable;

pub const DEFAULT_BODY: &[u8] = b"Silence is gold";

/// Decides the response for one request: an exact-match hit redirects with a
/// temporary status (307, so clients do not cache a rule that may change on
/// the next restart), anything else gets the default body.
pub fn respond_to_request(req: &Request<Body>, table: &RoutingTable) -> Response<Body> {
    let path = req.uri().path();
    match table.lookup(path) {
        Some(to) => match HeaderValue::from_str(to) {
            Ok(location) => {
                info!("{} => {}", path, to);
                let mut resp = Response::new(Body::empty());
                *resp.status_mut() = StatusCode::TEMPORARY_REDIRECT;
                resp.headers_mut().insert(LOCATION, location);
                resp
            }
            Err(e) => {
                warn!("{} => [bad target {:?}] : {}", path, to, e);
                let mut resp = Response::new(Body::empty());
                *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                resp
            }
        },
        None => Response::new(Body::from(DEFAULT_BODY)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    fn table(pairs: &[(&str, &str)]) -> RoutingTable {
        pairs
            .iter()
            .map(|(from, to)| Rule {
                from: from.to_string(),
                to: to.to_string(),
            })
            .collect()
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[test]
    fn hit_redirects_temporarily() {
        let table = table(&[("/a", "https://example.com/b")]);
        let resp = respond_to_request(&get("/a"), &table);
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            resp.headers().get(LOCATION).unwrap(),
            "https://example.com/b"
        );
    }

    #[tokio::test]
    async fn miss_gets_the_default_body() {
        let table = table(&[("/a", "https://example.com/b")]);
        let resp = respond_to_request(&get("/unknown"), &table);
        assert_eq!(resp.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], DEFAULT_BODY);
    }

    #[test]
    fn query_strings_are_not_part_of_the_path() {
        let table = table(&[("/a", "https://example.com/b")]);
        let resp = respond_to_request(&get("/a?x=1"), &table);
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    #[test]
    fn unrepresentable_target_is_an_internal_error() {
        // Cannot come out of the line-oriented loader, but the table does not
        // promise that.
        let table = table(&[("/a", "https://example.com/\u{7f}")]);
        let resp = respond_to_request(&get("/a"), &table);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.headers().get(LOCATION).is_none());
    }
}
