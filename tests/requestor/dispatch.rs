use std::sync::atomic::Ordering;

use cbm_concepts::requestor::{
    ConceptRequestor,
    credentials::EnvCredentialProvider,
    error::RequestErrorKind,
    types::{CredentialRef, RequestorConfig},
};

use crate::support::{RecordingAdapter, endpoint, request, requestor};

#[tokio::test]
async fn given_concurrency_limit_when_requesting_all_then_in_flight_never_exceeds_limit() {
    let adapter = RecordingAdapter::with_delay(20);
    let config = RequestorConfig {
        concurrency_limit: 3,
        ..RequestorConfig::default()
    };
    let requestor = requestor(config, adapter.clone()).await;

    let requests = (0..12).map(|i| request(i, &format!("prompt {i}"))).collect();
    let outcomes = requestor.request_all(requests).await;

    assert_eq!(outcomes.len(), 12);
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 12);
    let peak = adapter.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in-flight {peak} exceeded limit");
    assert!(peak > 1, "requests should overlap in concurrent mode");
}

#[tokio::test]
async fn given_sequential_mode_when_requesting_all_then_requests_run_one_at_a_time_in_order() {
    let adapter = RecordingAdapter::with_delay(5);
    let config = RequestorConfig {
        concurrency_limit: 8,
        sequential: true,
        ..RequestorConfig::default()
    };
    let requestor = requestor(config, adapter.clone()).await;
    assert_eq!(requestor.concurrency_limit(), 1);

    let requests = (0..5).map(|i| request(i, &format!("prompt {i}"))).collect();
    let outcomes = requestor.request_all(requests).await;

    assert_eq!(adapter.peak.load(Ordering::SeqCst), 1);
    let order: Vec<usize> = outcomes.iter().map(|o| o.request.class_index).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn given_one_failing_request_when_requesting_all_then_others_still_succeed() {
    let adapter = RecordingAdapter::with_delay(1);
    let requestor = requestor(RequestorConfig::default(), adapter).await;

    let outcomes = requestor
        .request_all(vec![
            request(0, "prompt a"),
            request(1, "please fail"),
            request(2, "prompt c"),
        ])
        .await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(
        outcomes[0].result.as_ref().expect("first ok").text,
        "- answer to prompt a"
    );
    let err = outcomes[1].result.as_ref().expect_err("second fails");
    assert_eq!(err.kind, RequestErrorKind::Network);
    assert_eq!(outcomes[1].request.class_index, 1);
    assert!(outcomes[2].result.is_ok());
}

#[tokio::test]
async fn given_missing_env_credential_when_connecting_then_authentication_error_is_returned() {
    let mut endpoint = endpoint();
    endpoint.credential = CredentialRef::Env {
        var: "CBM_CONCEPTS_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
    };

    let err = match ConceptRequestor::connect(
        endpoint,
        &RequestorConfig::default(),
        &EnvCredentialProvider,
    )
    .await
    {
        Ok(_) => panic!("connect should fail without the credential"),
        Err(err) => err,
    };
    assert_eq!(err.kind, RequestErrorKind::Authentication);
}

#[tokio::test]
async fn given_blank_model_when_connecting_then_invalid_request_is_returned() {
    let mut endpoint = endpoint();
    endpoint.model = "  ".to_string();

    let err = match ConceptRequestor::connect(
        endpoint,
        &RequestorConfig::default(),
        &EnvCredentialProvider,
    )
    .await
    {
        Ok(_) => panic!("connect should reject a blank model"),
        Err(err) => err,
    };
    assert_eq!(err.kind, RequestErrorKind::InvalidRequest);
}
