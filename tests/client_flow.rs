//! End-to-end client behavior against injected transport doubles.
//!
//! All tests run on paused time, so cycle-floor assertions are exact and
//! the availability/arming races are deterministic.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::{timeout, Instant};

use ledctl::{
    client, ClientConfig, FlashPeriod, LedClient, LedCommand, LedTarget, Notification, Operation,
    ScriptedSource, ServiceEndpoint, Transport,
};

// ============================================================================
// Test doubles
// ============================================================================

/// Records every send with the (mock-clock) instant it happened at.
#[derive(Clone, Default)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<(Bytes, Instant)>>>,
}

impl RecordingTransport {
    fn payloads(&self) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(payload, _)| payload.to_vec())
            .collect()
    }

    fn instants(&self) -> Vec<Instant> {
        self.sent.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

impl Transport for RecordingTransport {
    async fn send(&mut self, _endpoint: ServiceEndpoint, payload: Bytes) -> io::Result<()> {
        self.sent.lock().unwrap().push((payload, Instant::now()));
        Ok(())
    }
}

/// Fails the first send attempt, records and accepts the rest.
#[derive(Clone, Default)]
struct FlakyTransport {
    attempts: Arc<Mutex<Vec<(Bytes, Instant)>>>,
}

impl Transport for FlakyTransport {
    async fn send(&mut self, _endpoint: ServiceEndpoint, payload: Bytes) -> io::Result<()> {
        let mut attempts = self.attempts.lock().unwrap();
        attempts.push((payload, Instant::now()));
        if attempts.len() == 1 {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "no route"))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn switch_on() -> LedCommand {
    LedCommand::new(Operation::SwitchOn, LedTarget::default())
}

fn flash(period: u16, led: u8) -> LedCommand {
    LedCommand::new(
        Operation::CustomFlash(FlashPeriod::new(period).unwrap()),
        LedTarget::new(led).unwrap(),
    )
}

fn config(cycle_ms: u64) -> ClientConfig {
    ClientConfig::builder().cycle_ms(cycle_ms).build()
}

fn endpoint() -> ServiceEndpoint {
    ServiceEndpoint::led_service()
}

async fn next(reports: &mut mpsc::Receiver<Notification>) -> Notification {
    timeout(Duration::from_secs(10), reports.recv())
        .await
        .expect("timed out waiting for a notification")
        .expect("notification stream ended unexpectedly")
}

/// Let the background tasks drain everything that is currently runnable.
async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn availability_starts_the_request_cycle() {
    let (events, intake) = client::event_channel();
    let transport = RecordingTransport::default();
    let script = ScriptedSource::new(vec![switch_on(), flash(500, 2)]);
    let (led_client, mut reports) = LedClient::spawn(config(100), intake, transport.clone(), script);

    events.availability_changed(endpoint(), true).await.unwrap();

    assert_eq!(
        next(&mut reports).await,
        Notification::Availability {
            endpoint: endpoint(),
            available: true
        }
    );
    assert_eq!(
        next(&mut reports).await,
        Notification::RequestSent {
            seq: 0,
            command: switch_on()
        }
    );
    // Defaults: operation 1, LED 1, no period, sequence 0
    assert_eq!(transport.payloads(), vec![vec![1, 1, 0, 0, 0, 0]]);

    events
        .response_received(Bytes::from_static(&[2, 0, 0]))
        .await
        .unwrap();
    assert_eq!(
        next(&mut reports).await,
        Notification::ResponseReceived {
            seq: 0,
            success: true
        }
    );

    // The response triggers the next command, sent once the cycle elapses
    assert_eq!(
        next(&mut reports).await,
        Notification::RequestSent {
            seq: 1,
            command: flash(500, 2)
        }
    );
    assert_eq!(
        transport.payloads()[1],
        vec![3, 2, 0x01, 0xF4, 0, 1] // 500 ms big-endian, sequence 1
    );

    events
        .response_received(Bytes::from_static(&[2, 0, 1]))
        .await
        .unwrap();
    assert_eq!(
        next(&mut reports).await,
        Notification::ResponseReceived {
            seq: 1,
            success: true
        }
    );

    // Script exhausted: the client quits on its own
    timeout(Duration::from_secs(10), led_client.wait())
        .await
        .expect("client did not stop after the script ran out");
}

#[tokio::test(start_paused = true)]
async fn sequence_numbers_increase_without_gaps() {
    let (events, intake) = client::event_channel();
    let transport = RecordingTransport::default();
    let script = ScriptedSource::new(vec![switch_on(); 5]);
    let (led_client, mut reports) = LedClient::spawn(config(50), intake, transport.clone(), script);

    events.availability_changed(endpoint(), true).await.unwrap();

    for expected_seq in 0u16..5 {
        loop {
            if let Notification::RequestSent { seq, .. } = next(&mut reports).await {
                assert_eq!(seq, expected_seq);
                break;
            }
        }
        let [hi, lo] = expected_seq.to_be_bytes();
        events
            .response_received(Bytes::copy_from_slice(&[2, hi, lo]))
            .await
            .unwrap();
    }

    let payloads = transport.payloads();
    assert_eq!(payloads.len(), 5);
    for (i, payload) in payloads.iter().enumerate() {
        assert_eq!(&payload[4..6], (i as u16).to_be_bytes());
    }

    timeout(Duration::from_secs(10), led_client.wait())
        .await
        .expect("client did not stop");
}

#[tokio::test(start_paused = true)]
async fn no_send_while_unavailable_and_armed_survives_the_outage() {
    let (events, intake) = client::event_channel();
    let transport = RecordingTransport::default();
    let script = ScriptedSource::new(vec![switch_on(), flash(250, 1), switch_on()]);
    let (led_client, mut reports) = LedClient::spawn(config(100), intake, transport.clone(), script);

    events.availability_changed(endpoint(), true).await.unwrap();
    loop {
        if matches!(next(&mut reports).await, Notification::RequestSent { seq: 0, .. }) {
            break;
        }
    }

    // Respond (arming the second command) and immediately lose the service.
    // The ordered event channel guarantees the arm happens first.
    events
        .response_received(Bytes::from_static(&[2, 0, 0]))
        .await
        .unwrap();
    events.availability_changed(endpoint(), false).await.unwrap();
    settle().await;

    // Well past the cycle floor, still nothing may go out
    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(transport.payloads().len(), 1, "sent while unavailable");

    // Service returns: the command armed through the outage goes out first
    // (the recovery also rebuilds, arming the third command behind it)
    events.availability_changed(endpoint(), true).await.unwrap();
    loop {
        if let Notification::RequestSent { seq, command } = next(&mut reports).await {
            assert_eq!(seq, 1);
            assert_eq!(command, flash(250, 1));
            break;
        }
    }
    assert_eq!(transport.payloads()[1][..2], [3, 1]);

    led_client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn consecutive_sends_respect_the_cycle_floor() {
    let cycle = Duration::from_millis(500);
    let (events, intake) = client::event_channel();
    let transport = RecordingTransport::default();
    let script = ScriptedSource::new(vec![switch_on(); 3]);
    let (led_client, mut reports) = LedClient::spawn(config(500), intake, transport.clone(), script);

    events.availability_changed(endpoint(), true).await.unwrap();

    for seq in 0u16..3 {
        loop {
            if matches!(next(&mut reports).await, Notification::RequestSent { .. }) {
                break;
            }
        }
        // Reply instantly; the next send must still wait out the cycle
        let [hi, lo] = seq.to_be_bytes();
        events
            .response_received(Bytes::copy_from_slice(&[2, hi, lo]))
            .await
            .unwrap();
    }

    let instants = transport.instants();
    assert_eq!(instants.len(), 3);
    for pair in instants.windows(2) {
        assert!(
            pair[1] - pair[0] >= cycle,
            "sends {:?} apart, cycle is {:?}",
            pair[1] - pair[0],
            cycle
        );
    }

    timeout(Duration::from_secs(10), led_client.wait())
        .await
        .expect("client did not stop");
}

#[tokio::test(start_paused = true)]
async fn malformed_response_is_reported_and_does_not_arm() {
    let (events, intake) = client::event_channel();
    let transport = RecordingTransport::default();
    let script = ScriptedSource::new(vec![switch_on(), switch_on()]);
    let (led_client, mut reports) = LedClient::spawn(config(50), intake, transport.clone(), script);

    events.availability_changed(endpoint(), true).await.unwrap();
    loop {
        if matches!(next(&mut reports).await, Notification::RequestSent { .. }) {
            break;
        }
    }

    // Two bytes instead of three
    events
        .response_received(Bytes::from_static(&[2, 0]))
        .await
        .unwrap();
    assert_eq!(
        next(&mut reports).await,
        Notification::MalformedResponse { len: 2 }
    );

    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(
        transport.payloads().len(),
        1,
        "a malformed response must not arm a new request"
    );

    // A well-formed response gets the cycle going again
    events
        .response_received(Bytes::from_static(&[2, 0, 0]))
        .await
        .unwrap();
    loop {
        if matches!(
            next(&mut reports).await,
            Notification::RequestSent { seq: 1, .. }
        ) {
            break;
        }
    }

    led_client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failure_result_codes_are_reported_as_failed() {
    let (events, intake) = client::event_channel();
    let transport = RecordingTransport::default();
    let script = ScriptedSource::new(vec![switch_on(), switch_on()]);
    let (led_client, mut reports) = LedClient::spawn(config(50), intake, transport, script);

    events.availability_changed(endpoint(), true).await.unwrap();
    loop {
        if matches!(next(&mut reports).await, Notification::RequestSent { .. }) {
            break;
        }
    }

    events
        .response_received(Bytes::from_static(&[9, 0, 0]))
        .await
        .unwrap();
    let report = next(&mut reports).await;
    assert_eq!(
        report,
        Notification::ResponseReceived {
            seq: 0,
            success: false
        }
    );
    assert_eq!(report.to_string(), "Request [0] has failed !");

    led_client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn availability_of_other_services_is_ignored() {
    let (events, intake) = client::event_channel();
    let transport = RecordingTransport::default();
    let script = ScriptedSource::new(vec![switch_on()]);
    let (led_client, mut reports) = LedClient::spawn(config(50), intake, transport.clone(), script);

    let other = ServiceEndpoint::new(0x4242, 0x0001);
    events.availability_changed(other, true).await.unwrap();
    assert_eq!(
        next(&mut reports).await,
        Notification::Availability {
            endpoint: other,
            available: true
        }
    );
    settle().await;
    assert!(
        transport.payloads().is_empty(),
        "a foreign service must not trigger a request"
    );

    events.availability_changed(endpoint(), true).await.unwrap();
    loop {
        if matches!(next(&mut reports).await, Notification::RequestSent { seq: 0, .. }) {
            break;
        }
    }

    led_client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn repeated_availability_reports_are_no_ops() {
    let (events, intake) = client::event_channel();
    let transport = RecordingTransport::default();
    // A second availability=true must not pull a second command
    let script = ScriptedSource::new(vec![switch_on(), switch_on()]);
    let (led_client, mut reports) = LedClient::spawn(config(50), intake, transport.clone(), script);

    events.availability_changed(endpoint(), true).await.unwrap();
    events.availability_changed(endpoint(), true).await.unwrap();
    loop {
        if matches!(next(&mut reports).await, Notification::RequestSent { .. }) {
            break;
        }
    }
    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(transport.payloads().len(), 1);

    led_client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_send_is_retried_next_cycle_with_the_same_sequence_number() {
    let cycle = Duration::from_millis(200);
    let (events, intake) = client::event_channel();
    let transport = FlakyTransport::default();
    let script = ScriptedSource::new(vec![switch_on()]);
    let (led_client, mut reports) =
        LedClient::spawn(config(200), intake, transport.clone(), script);

    events.availability_changed(endpoint(), true).await.unwrap();

    // Only the successful (second) attempt is reported
    loop {
        if let Notification::RequestSent { seq, .. } = next(&mut reports).await {
            assert_eq!(seq, 0);
            break;
        }
    }

    let attempts = transport.attempts.lock().unwrap().clone();
    assert_eq!(attempts.len(), 2);
    for (payload, _) in &attempts {
        assert_eq!(&payload[4..6], [0, 0], "retry must reuse sequence 0");
    }
    assert!(
        attempts[1].1 - attempts[0].1 >= cycle,
        "retry must wait out the cycle"
    );

    led_client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn quit_from_the_source_stops_the_client() {
    let (events, intake) = client::event_channel();
    let transport = RecordingTransport::default();
    let script = ScriptedSource::new(Vec::new());
    let (led_client, _reports) = LedClient::spawn(config(50), intake, transport.clone(), script);

    events.availability_changed(endpoint(), true).await.unwrap();

    timeout(Duration::from_secs(10), led_client.wait())
        .await
        .expect("client did not stop on quit");
    assert!(transport.payloads().is_empty());

    // The event channel is closed once the client is gone
    assert!(matches!(
        events.availability_changed(endpoint(), true).await,
        Err(ledctl::Error::Shutdown)
    ));
}

#[tokio::test(start_paused = true)]
async fn shutdown_wakes_a_blocked_client() {
    let (_events, intake) = client::event_channel();
    let transport = RecordingTransport::default();
    let script = ScriptedSource::new(vec![switch_on()]);
    let (led_client, _reports) = LedClient::spawn(config(1000), intake, transport, script);

    // Nothing ever arrives; shutdown must still complete promptly
    timeout(Duration::from_secs(10), led_client.shutdown())
        .await
        .expect("shutdown did not complete");
}
