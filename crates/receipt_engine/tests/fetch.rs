use std::time::Duration;

use pretty_assertions::assert_eq;
use receipt_core::TokenStatus;
use receipt_engine::{FailureKind, FetchSettings, PreviewClient, ReqwestPreviewClient};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

fn preview_body() -> serde_json::Value {
    serde_json::json!({
        "token": {"token_id": TOKEN, "status": "active", "consumed_at": null},
        "receipt": {
            "issued_at": "2026-10-01T09:58:12Z",
            "retailer_id": "acme",
            "store_id": "store-7",
            "currency": "EUR",
            "subtotal": "10.00",
            "vat_total": "2.40",
            "total": "12.40",
            "items": [
                {"line_no": 1, "sku": "A-1", "name": "Coffee", "qty": 2,
                 "unit_price": 5, "line_total": 10, "vat_rate": 24, "vat_amount": 2.4}
            ]
        }
    })
}

fn client(server: &MockServer, settings: FetchSettings) -> ReqwestPreviewClient {
    ReqwestPreviewClient::new(&format!("{}/functions/v1/", server.uri()), None, settings)
        .expect("client")
}

#[tokio::test]
async fn fetches_and_parses_preview() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/functions/v1/token-preview"))
        .and(query_param("token_id", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(preview_body()))
        .mount(&server)
        .await;

    let preview = client(&server, FetchSettings::default())
        .fetch_preview(TOKEN)
        .await
        .expect("fetch ok");

    assert_eq!(preview.token.token_id, TOKEN);
    assert_eq!(preview.token.status, TokenStatus::Active);
    assert_eq!(preview.receipt.total, 12.4);
    assert_eq!(preview.receipt.items.len(), 1);
    assert_eq!(preview.receipt.items[0].name, "Coffee");
}

#[tokio::test]
async fn api_key_is_sent_as_bearer_and_apikey() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/functions/v1/token-preview"))
        .and(header("authorization", "Bearer anon-key"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(preview_body()))
        .mount(&server)
        .await;

    let client = ReqwestPreviewClient::new(
        &format!("{}/functions/v1", server.uri()),
        Some("anon-key"),
        FetchSettings::default(),
    )
    .unwrap();
    assert!(client.fetch_preview(TOKEN).await.is_ok());
}

#[tokio::test]
async fn error_body_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/functions/v1/token-preview"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "Token not found"})),
        )
        .mount(&server)
        .await;

    let err = client(&server, FetchSettings::default())
        .fetch_preview(TOKEN)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert_eq!(err.message, "Token not found");
    assert_eq!(err.user_message(), "Token not found (http status 404)");
}

#[tokio::test]
async fn status_without_error_body_uses_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client(&server, FetchSettings::default())
        .fetch_preview(TOKEN)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert!(err.message.contains("500"));
}

#[tokio::test]
async fn malformed_json_is_invalid_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{\"token\": 1}", "application/json"))
        .mount(&server)
        .await;

    let err = client(&server, FetchSettings::default())
        .fetch_preview(TOKEN)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidBody);
}

#[tokio::test]
async fn html_response_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .mount(&server)
        .await;

    let err = client(&server, FetchSettings::default())
        .fetch_preview(TOKEN)
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "text/html".to_string()
        }
    );
}

#[tokio::test]
async fn times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(preview_body()),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let err = client(&server, settings).fetch_preview(TOKEN).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("01234567890", "application/json"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let err = client(&server, settings).fetch_preview(TOKEN).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}
