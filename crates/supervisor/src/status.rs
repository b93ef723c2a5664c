// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The status plane: a standalone server bound to the same port the proxy
//! routes client traffic to, serving 503s for every request until the real
//! handler processes are ready to take over.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};

const PROVISIONING_HTML: &str = "\
<!DOCTYPE html>
<html><head><title>Starting up</title></head>
<body><h1>System provisioning</h1><p>The service is starting up. Please retry shortly.</p></body>
</html>";

/// Default service for the status plane's `App`: every path gets a 503,
/// with a JSON body under `/api` and a plain HTML body everywhere else.
pub async fn provisioning(req: HttpRequest) -> HttpResponse {
    if req.path().starts_with("/api") {
        HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE).json(serde_json::json!({
            "status": "error",
            "message": "System provisioning",
        }))
    } else {
        HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE)
            .content_type("text/html; charset=utf-8")
            .body(PROVISIONING_HTML)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn api_paths_get_a_json_body() {
        let req = TestRequest::with_uri("/api/v1/users").to_http_request();
        let resp = provisioning(req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], "System provisioning");
    }

    #[actix_web::test]
    async fn other_paths_get_html() {
        let req = TestRequest::with_uri("/").to_http_request();
        let resp = provisioning(req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }
}
