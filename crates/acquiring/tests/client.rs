//! HTTP client tests against a local mock server.

use std::collections::BTreeMap;
use std::sync::Arc;

use acquiring::client::{
    AcquiringApi, AcquiringClient, GetStateRequest, InitRequest, PasswordTokenSigner, TokenSigner,
};
use acquiring::models::{PaymentId, ResponseStatus};
use acquiring::Error;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> AcquiringClient {
    AcquiringClient::new(
        &format!("{}/", server.uri()),
        "TestTerminal",
        Arc::new(PasswordTokenSigner::new("password")),
    )
    .expect("client")
}

fn init_request() -> InitRequest {
    InitRequest {
        order_id: "order-21050".to_string(),
        amount: 100_000.into(),
        ..InitRequest::default()
    }
}

#[tokio::test]
async fn init_signs_and_parses_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Init"))
        .and(body_partial_json(json!({"TerminalKey": "TestTerminal"})))
        .and(body_string_contains("Token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Success": true,
            "ErrorCode": "0",
            "TerminalKey": "TestTerminal",
            "Status": "NEW",
            "PaymentId": "13660",
            "OrderId": "order-21050",
            "Amount": 100000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server).init(init_request()).await.unwrap();
    assert_eq!(response.payment_id, PaymentId(13660));
    assert_eq!(response.status, ResponseStatus::New);
}

#[tokio::test]
async fn business_error_envelope_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Charge"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Success": false,
            "ErrorCode": "104",
            "Message": "Повторите попытку позже",
            "Details": "Требуется подтверждение CVC",
            "PaymentId": 880
        })))
        .mount(&server)
        .await;

    let error = client_for(&server)
        .charge(acquiring::client::ChargeRequest {
            payment_id: PaymentId(880),
            rebill_id: "145919".to_string(),
        })
        .await
        .expect_err("declined charge must error");
    match error {
        Error::Api {
            error_code,
            payment_id,
            ..
        } => {
            assert_eq!(error_code, "104");
            assert_eq!(payment_id, Some(PaymentId(880)));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn unrecognized_status_string_parses_as_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/GetState"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Success": true,
            "ErrorCode": "0",
            "Status": "BRAND_NEW_STATUS",
            "PaymentId": 77
        })))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .get_state(GetStateRequest {
            payment_id: PaymentId(77),
        })
        .await
        .unwrap();
    assert_eq!(response.status, ResponseStatus::Unknown);
}

#[tokio::test]
async fn pay_link_is_fetched_from_the_versioned_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/TinkoffPay/transactions/42/versions/2.0/link"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Success": true,
            "ErrorCode": "0",
            "Params": { "RedirectUrl": "https://www.tinkoff.ru/tpay/42" }
        })))
        .mount(&server)
        .await;

    let link = client_for(&server)
        .get_tinkoff_pay_link(PaymentId(42), "2.0")
        .await
        .unwrap();
    assert_eq!(link.params.redirect_url, "https://www.tinkoff.ru/tpay/42");
}

#[tokio::test]
async fn terminal_pay_methods_come_from_the_query_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/GetTerminalPayMethods"))
        .and(wiremock::matchers::query_param("TerminalKey", "TestTerminal"))
        .and(wiremock::matchers::query_param("PaySource", "SDK"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Success": true,
            "ErrorCode": "0",
            "TerminalInfo": {
                "Paymethods": [
                    { "PayMethod": "TinkoffPay", "Params": { "Version": "2.0" } },
                    { "PayMethod": "SBP", "Params": {} }
                ],
                "AddCardScheme": true
            }
        })))
        .mount(&server)
        .await;

    let methods = client_for(&server).get_terminal_pay_methods().await.unwrap();
    assert!(methods.terminal_info.add_card_scheme);
    assert_eq!(methods.terminal_info.paymethods.len(), 2);
    assert_eq!(methods.terminal_info.paymethods[0].pay_method, "TinkoffPay");
    assert_eq!(
        methods.terminal_info.paymethods[0].params.get("Version"),
        Some(&"2.0".to_string())
    );
}

#[test]
fn token_vector_for_documented_example_is_stable() {
    // The signer is deterministic over sorted params; pin one vector so a
    // signing regression fails loudly.
    let signer = PasswordTokenSigner::new("b");
    let mut params = BTreeMap::new();
    params.insert("A".to_string(), "a".to_string());
    params.insert("z".to_string(), "c".to_string());
    assert_eq!(
        signer.sign(&params),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}
