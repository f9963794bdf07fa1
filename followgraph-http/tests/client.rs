use followgraph_http::{Auth, HttpClient, HttpError, RequestOpts, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::new(&server.uri())
        .expect("mock server url")
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn get_json_sends_query_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/users/show.json"))
        .and(query_param("user_id", "12"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 12, "screen_name": "jack"})))
        .expect(1)
        .mount(&server)
        .await;

    let got: Value = client_for(&server)
        .get_json(
            "1.1/users/show.json",
            RequestOpts {
                auth: Some(Auth::Bearer(" tok ")),
                query: Some(vec![("user_id", "12".into())]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(got["screen_name"], "jack");
}

#[tokio::test]
async fn post_form_uses_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header("authorization", "Basic a2V5OnNlY3JldA=="))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token_type": "bearer", "access_token": "AAAA"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let got: Value = client_for(&server)
        .post_form(
            "oauth2/token",
            &[("grant_type", "client_credentials")],
            RequestOpts {
                auth: Some(Auth::Basic {
                    user: "key",
                    password: "secret",
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(got["access_token"], "AAAA");
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let got: Value = client_for(&server)
        .with_retries(1)
        .get_json("flaky", RequestOpts::default())
        .await
        .unwrap();

    assert_eq!(got["ok"], true);
}

#[tokio::test]
async fn rate_limited_request_waits_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_json(json!({"errors": [{"code": 88, "message": "Rate limit exceeded"}]})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;

    let got: Vec<u64> = client_for(&server)
        .with_retries(0)
        .get_json("limited", RequestOpts::default())
        .await
        .unwrap();

    assert_eq!(got, vec![1, 2, 3]);
}

#[tokio::test]
async fn rate_limit_surfaces_when_waiting_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-rate-limit-reset", "1700000000")
                .set_body_json(json!({"errors": [{"code": 88, "message": "Rate limit exceeded"}]})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .with_retries(0)
        .with_rate_limit_wait(false, Duration::from_secs(0))
        .get_json::<Value>("limited", RequestOpts::default())
        .await
        .unwrap_err();

    match err {
        HttpError::Api {
            status,
            code,
            rate_limit_reset,
            message,
            ..
        } => {
            assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
            assert_eq!(code, Some(88));
            assert_eq!(rate_limit_reset, Some(1_700_000_000));
            assert_eq!(message, "Rate limit exceeded");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"request": "/private", "error": "Not authorized."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .with_retries(3)
        .get_json::<Value>("private", RequestOpts::default())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert!(err.to_string().contains("Not authorized."));
}

#[tokio::test]
async fn invalid_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_json::<Value>("garbage", RequestOpts::default())
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Decode(_, ref snip) if snip == "not json"));
}
