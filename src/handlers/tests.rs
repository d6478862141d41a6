use super::*;
use crate::errors::ProviderError;
use crate::models::Fetched;
use crate::normalize::Normalized;

async fn body_json(response: warp::reply::Response) -> serde_json::Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_handle_not_found_rejection() {
    let rejection = warp::reject::not_found();
    let response = handle_rejection(rejection).await.unwrap().into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "Not Found"}));
}

#[tokio::test]
async fn test_handle_invalid_parameter_rejection() {
    let rejection = warp::reject::custom(GatewayError::InvalidParameter("month must be between 1 and 12, got 13".into()));
    let response = handle_rejection(rejection).await.unwrap().into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "invalid parameter: month must be between 1 and 12, got 13"})
    );
}

#[tokio::test]
async fn test_handle_quota_rejection() {
    let err = GatewayError::Fetch(FetchError::QuotaExceeded { provider: "football".into() });
    let response = handle_rejection(warp::reject::custom(err)).await.unwrap().into_response();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_handle_timeout_rejection() {
    let err = GatewayError::Fetch(NetworkError::Timeout.into());
    let response = handle_rejection(warp::reject::custom(err)).await.unwrap().into_response();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[test]
fn test_upstream_failures_are_bad_gateway() {
    for err in [
        FetchError::Network(NetworkError::RateLimited),
        FetchError::Network(NetworkError::Connection("refused".into())),
        FetchError::Provider(ProviderError::Status(500)),
        FetchError::Provider(ProviderError::EmptyBody),
    ] {
        assert_eq!(status_for(&GatewayError::Fetch(err)), StatusCode::BAD_GATEWAY);
    }
    assert_eq!(
        status_for(&GatewayError::UnknownProvider("f1".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_handle_unknown_rejection() {
    #[derive(Debug)]
    struct Strange;
    impl warp::reject::Reject for Strange {}

    let response = handle_rejection(warp::reject::custom(Strange)).await.unwrap().into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_respond_sets_freshness_header() {
    let response = respond(Ok(Fetched::stale(Normalized::Trending(vec!["UFC".into()])))).unwrap();
    assert_eq!(response.headers().get("x-data-freshness").unwrap(), "stale");
    assert_eq!(
        body_json(response).await,
        json!({"data": ["UFC"], "freshness": "stale"})
    );
}

#[test]
fn test_numeric_params() {
    assert_eq!(param::<u64>("league", "17").ok(), Some(17));
    assert!(param::<u64>("league", "premier").is_err());
    assert_eq!(text_param("query", "jon%20jones").ok().as_deref(), Some("jon jones"));
    assert!(text_param("query", "%ff").is_err());
}
