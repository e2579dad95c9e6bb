//! End-to-end process scenarios against the scripted backend.

use std::sync::Arc;
use std::time::Duration;

use acquiring::models::{PaymentId, ResponseStatus};
use acquiring::poller::StatusPoller;
use acquiring::process::{
    MirPayProcess, PaymentState, RecurrentPaymentProcess, SbpProcess, TpayProcess,
    CVC_REQUIRED_ERROR_CODE,
};
use acquiring::Error;
use acquiring_integration_tests::*;
use anyhow::Result;

const DEEPLINK: &str = "https://www.tinkoff.ru/tpay/1";

/// Init then a pay link produce NeedChooseOnUi; a link failure on restart
/// fails with the session id; a healthy third start recovers.
#[tokio::test(start_paused = true)]
async fn tpay_deeplink_failure_and_recovery() -> Result<()> {
    setup_tracing();
    let api = Arc::new(ScriptedApi::new());
    let process = TpayProcess::new(api.clone());

    api.push_init(Ok(init_ok(1)));
    api.push_tinkoff_pay_link(Ok(pay_link(DEEPLINK)));
    process.start(payment_options("order-1", 100), "2.0".to_string()).await;
    match process.state() {
        PaymentState::NeedChooseOnUi {
            payment_id,
            deeplink,
        } => {
            assert_eq!(payment_id, PaymentId(1));
            assert_eq!(deeplink, DEEPLINK);
        }
        other => panic!("expected NeedChooseOnUi, got {other:?}"),
    }

    // Second attempt: the link endpoint is down.
    api.push_init(Ok(init_ok(1)));
    api.push_tinkoff_pay_link(Err(Error::Custom("network down".to_string())));
    process.start(payment_options("order-1", 100), "2.0".to_string()).await;
    match process.state() {
        PaymentState::PaymentFailed { payment_id, error } => {
            assert_eq!(payment_id, Some(PaymentId(1)));
            assert!(matches!(error.as_ref(), Error::Custom(_)));
        }
        other => panic!("expected PaymentFailed, got {other:?}"),
    }

    // Third attempt against a healthy backend recovers.
    api.push_init(Ok(init_ok(1)));
    api.push_tinkoff_pay_link(Ok(pay_link(DEEPLINK)));
    process.start(payment_options("order-1", 100), "2.0".to_string()).await;
    assert!(matches!(
        process.state(),
        PaymentState::NeedChooseOnUi { .. }
    ));
    assert_eq!(api.call_count("Init"), 3);
    Ok(())
}

/// A process parked in PaymentFailed accepts a fresh start and runs the
/// whole flow again instead of staying stuck.
#[tokio::test(start_paused = true)]
async fn failed_process_restarts_from_scratch() -> Result<()> {
    setup_tracing();
    let api = Arc::new(ScriptedApi::new());
    let process = MirPayProcess::new(api.clone());

    api.push_init(Err(Error::Custom("no connectivity".to_string())));
    process.start(payment_options("order-2", 500)).await;
    assert!(matches!(
        process.state(),
        PaymentState::PaymentFailed {
            payment_id: None,
            ..
        }
    ));

    api.push_init(Ok(init_ok(7)));
    api.push_mir_pay_link(Ok(pay_link("mirpay://pay/7")));
    process.start(payment_options("order-2", 500)).await;
    assert!(matches!(
        process.state(),
        PaymentState::NeedChooseOnUi { payment_id: PaymentId(7), .. }
    ));
    assert_eq!(api.call_count("Init"), 2);
    Ok(())
}

/// The full redirect round trip: deeplink, bank app, polling to success.
#[tokio::test(start_paused = true)]
async fn tpay_polls_to_success_after_bank_app() -> Result<()> {
    setup_tracing();
    let api = Arc::new(ScriptedApi::new());
    let process = TpayProcess::new(api.clone());

    api.push_init(Ok(init_ok(3)));
    api.push_tinkoff_pay_link(Ok(pay_link(DEEPLINK)));
    process.start(payment_options("order-3", 900), "2.0".to_string()).await;

    process.going_to_bank_app();
    assert!(matches!(
        process.state(),
        PaymentState::LeaveOnBankApp { payment_id: PaymentId(3) }
    ));
    // Repeated hand-off notifications stay a no-op.
    process.going_to_bank_app();
    assert!(matches!(
        process.state(),
        PaymentState::LeaveOnBankApp { .. }
    ));

    api.push_status(3, ResponseStatus::Authorizing);
    api.push_status(3, ResponseStatus::Confirmed);
    process.start_checking_status().await;
    match process.state() {
        PaymentState::Success { payment_id, .. } => assert_eq!(payment_id, PaymentId(3)),
        other => panic!("expected Success, got {other:?}"),
    }
    Ok(())
}

/// SBP polls straight from the QR payload state.
#[tokio::test(start_paused = true)]
async fn sbp_polls_from_qr_state() -> Result<()> {
    setup_tracing();
    let api = Arc::new(ScriptedApi::new());
    let process = SbpProcess::new(api.clone());

    api.push_init(Ok(init_ok(11)));
    api.push_get_qr(Ok(acquiring::client::GetQrResponse {
        data: "https://qr.nspk.ru/AD1000".to_string(),
        payment_id: Some(PaymentId(11)),
    }));
    process.start(payment_options("order-11", 250)).await;
    assert!(matches!(
        process.state(),
        PaymentState::NeedChooseOnUi { payment_id: PaymentId(11), .. }
    ));

    api.push_status(11, ResponseStatus::Confirmed);
    process.start_checking_status().await;
    assert!(matches!(process.state(), PaymentState::Success { .. }));
    Ok(())
}

/// Charge declined with the CVC confirmation code parks the process in
/// CvcUiNeeded with the rejected session preserved verbatim.
#[tokio::test(start_paused = true)]
async fn recurrent_charge_declined_with_cvc_code() -> Result<()> {
    setup_tracing();
    let api = Arc::new(ScriptedApi::new());
    let process = RecurrentPaymentProcess::new(api.clone(), test_env());

    api.push_init(Ok(init_ok(900)));
    api.push_charge(Err(api_error(CVC_REQUIRED_ERROR_CODE, Some(880))));
    process
        .start(payment_options("order-r", 1500), "145919".to_string())
        .await;
    match process.state() {
        PaymentState::CvcUiNeeded {
            rejected_payment_id,
            payment_options,
        } => {
            assert_eq!(rejected_payment_id, PaymentId(880));
            assert_eq!(payment_options.order.order_id, "order-r");
        }
        other => panic!("expected CvcUiNeeded, got {other:?}"),
    }

    // Confirmation with the CVC resumes through a fresh session.
    api.push_init(Ok(init_ok(901)));
    api.push_finish_authorize(Ok(finish_ok(901, ResponseStatus::Confirmed)));
    process
        .start_with_cvc(
            "123".to_string(),
            "145919".to_string(),
            PaymentId(880),
            payment_options("order-r", 1500),
        )
        .await;
    assert!(matches!(
        process.state(),
        PaymentState::Success { payment_id: PaymentId(901), .. }
    ));
    Ok(())
}

/// A declined charge with any other code fails the attempt.
#[tokio::test(start_paused = true)]
async fn recurrent_charge_declined_with_other_code_fails() -> Result<()> {
    setup_tracing();
    let api = Arc::new(ScriptedApi::new());
    let process = RecurrentPaymentProcess::new(api.clone(), test_env());

    api.push_init(Ok(init_ok(910)));
    api.push_charge(Err(api_error("1030", Some(910))));
    process
        .start(payment_options("order-r2", 700), "145919".to_string())
        .await;
    match process.state() {
        PaymentState::PaymentFailed { payment_id, error } => {
            assert_eq!(payment_id, Some(PaymentId(910)));
            assert_eq!(error.api_error_code(), Some("1030"));
        }
        other => panic!("expected PaymentFailed, got {other:?}"),
    }
    Ok(())
}

/// A recurring charge that lands non-terminal polls to its outcome.
#[tokio::test(start_paused = true)]
async fn recurrent_charge_polls_to_success() -> Result<()> {
    setup_tracing();
    let api = Arc::new(ScriptedApi::new());
    let process = RecurrentPaymentProcess::new(api.clone(), test_env());

    api.push_init(Ok(init_ok(920)));
    api.push_charge(Ok(charge_ok(920, ResponseStatus::Authorizing)));
    api.push_status(920, ResponseStatus::Authorizing);
    api.push_status(920, ResponseStatus::Confirmed);
    process
        .start(payment_options("order-r3", 300), "145919".to_string())
        .await;
    match process.state() {
        PaymentState::Success { rebill_id, .. } => {
            assert_eq!(rebill_id.as_deref(), Some("145919"));
        }
        other => panic!("expected Success, got {other:?}"),
    }
    Ok(())
}

/// stop() is safe from any state and terminates in-flight polling.
#[tokio::test(start_paused = true)]
async fn stop_cancels_polling_and_never_panics() -> Result<()> {
    setup_tracing();

    // From the initial state.
    let idle = TpayProcess::new(Arc::new(ScriptedApi::new()));
    idle.stop();
    assert!(matches!(idle.state(), PaymentState::Stopped));

    // From a terminal state.
    let api = Arc::new(ScriptedApi::new());
    let done = SbpProcess::new(api.clone());
    api.push_init(Ok(init_ok(21)));
    api.push_get_qr(Ok(acquiring::client::GetQrResponse {
        data: "https://qr.nspk.ru/AD2000".to_string(),
        payment_id: None,
    }));
    done.start(payment_options("order-21", 100)).await;
    api.push_status(21, ResponseStatus::Confirmed);
    done.start_checking_status().await;
    assert!(matches!(done.state(), PaymentState::Success { .. }));
    done.stop();
    assert!(matches!(done.state(), PaymentState::Stopped));

    // Mid-poll: the polling task ends promptly once stopped.
    let api = Arc::new(ScriptedApi::new());
    let process = Arc::new(
        TpayProcess::new(api.clone()).with_poller(StatusPoller::new(
            1_000,
            Duration::from_millis(3000),
        )),
    );
    api.push_init(Ok(init_ok(22)));
    api.push_tinkoff_pay_link(Ok(pay_link(DEEPLINK)));
    process.start(payment_options("order-22", 100), "2.0".to_string()).await;
    process.going_to_bank_app();
    for _ in 0..50 {
        api.push_status(22, ResponseStatus::Authorizing);
    }

    let polling = {
        let process = process.clone();
        tokio::spawn(async move { process.start_checking_status().await })
    };
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    process.stop();
    tokio::time::timeout(Duration::from_secs(30), polling).await??;
    assert!(matches!(process.state(), PaymentState::Stopped));

    // A stopped instance rejects further starts.
    api.push_init(Ok(init_ok(23)));
    process.start(payment_options("order-23", 100), "2.0".to_string()).await;
    assert!(matches!(process.state(), PaymentState::Stopped));
    Ok(())
}

/// A second start while polling is rejected without disturbing the flow.
#[tokio::test(start_paused = true)]
async fn start_is_rejected_while_checking_status() -> Result<()> {
    setup_tracing();
    let api = Arc::new(ScriptedApi::new());
    let process = Arc::new(TpayProcess::new(api.clone()));

    api.push_init(Ok(init_ok(30)));
    api.push_tinkoff_pay_link(Ok(pay_link(DEEPLINK)));
    process.start(payment_options("order-30", 100), "2.0".to_string()).await;
    process.going_to_bank_app();

    api.push_status(30, ResponseStatus::Authorizing);
    api.push_status(30, ResponseStatus::Confirmed);
    let polling = {
        let process = process.clone();
        tokio::spawn(async move { process.start_checking_status().await })
    };
    tokio::task::yield_now().await;
    // Must be ignored: the first attempt is still being driven.
    process.start(payment_options("order-30", 100), "2.0".to_string()).await;
    tokio::time::timeout(Duration::from_secs(60), polling).await??;

    assert!(matches!(process.state(), PaymentState::Success { .. }));
    assert_eq!(api.call_count("Init"), 1);
    Ok(())
}
