//! End-to-end CoAP exchanges against a scripted mock device.

mod support;

use support::{connect, response_for};

use velocitysp::cbor::{self, YangValue};
use velocitysp::client::{CoapClient, CoapRequest};
use velocitysp::coap::{content_format, BlockValue, Code, Message, MessageType};
use velocitysp::config::ClientConfig;
use velocitysp::error::Error;
use velocitysp::sid::SidTable;
use velocitysp::transport::pair;
use velocitysp::types::{ConnectionState, DeviceModel};

fn encode(value: &YangValue) -> Vec<u8> {
    cbor::encode(value, &SidTable::embedded()).expect("encodable")
}

fn interface_table(ports: usize) -> YangValue {
    YangValue::map(vec![YangValue::entry(
        "interface",
        YangValue::Array(
            (1..=ports)
                .map(|i| {
                    YangValue::map(vec![
                        YangValue::entry("name", i.to_string().into()),
                        YangValue::entry("enabled", YangValue::Bool(true)),
                        YangValue::entry(
                            "description",
                            "front panel port with a longer description".into(),
                        ),
                    ])
                })
                .collect(),
        ),
    )])
}

#[tokio::test]
async fn get_completes_in_one_round_trip() {
    let (device, mut mock) = connect().await;
    let payload = encode(&interface_table(2));

    let serve = async {
        let req = mock.recv_coap().await;
        assert_eq!(req.code, Code::GET);
        assert_eq!(req.mtype, MessageType::Confirmable);
        assert_eq!(req.uri_path(), "ietf-interfaces:interfaces");

        // Options must appear in ascending number order
        let numbers: Vec<u16> = req.options().iter().map(|o| o.number).collect();
        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        assert_eq!(numbers, sorted);

        // Single-block reply: num=0, M=0
        let mut resp = response_for(
            &req,
            Code::CONTENT,
            payload.clone(),
            Some(content_format::YANG_DATA_CBOR),
        );
        resp.set_block2(BlockValue::new(0, false, 4).unwrap());
        mock.send_coap(&resp).await;
    };

    let (value, ()) = tokio::join!(device.yang_get("/ietf-interfaces:interfaces"), serve);
    let value = value.unwrap();
    assert_eq!(
        value.get("interface").unwrap().as_array().unwrap().len(),
        2
    );
    device.disconnect();
}

#[tokio::test]
async fn identify_infers_model_from_port_count() {
    let (device, mut mock) = connect().await;

    let serve = async {
        let checksum_req = mock.recv_coap().await;
        assert_eq!(
            checksum_req.uri_path(),
            "ietf-constrained-yang-library:yang-library/checksum"
        );
        let resp = response_for(
            &checksum_req,
            Code::CONTENT,
            encode(&YangValue::text("a1b2c3d4")),
            Some(content_format::YANG_DATA_CBOR),
        );
        mock.send_coap(&resp).await;

        let ifaces_req = mock.recv_coap().await;
        assert_eq!(ifaces_req.uri_path(), "ietf-interfaces:interfaces");
        let resp = response_for(
            &ifaces_req,
            Code::CONTENT,
            encode(&interface_table(8)),
            Some(content_format::YANG_DATA_CBOR),
        );
        mock.send_coap(&resp).await;
    };

    let (info, ()) = tokio::join!(device.identify(), serve);
    let info = info.unwrap();
    assert_eq!(info.model, DeviceModel::Lan9668);
    assert_eq!(info.port_count, 8);
    assert_eq!(info.checksum.as_deref(), Some("a1b2c3d4"));
    device.disconnect();
}

#[tokio::test]
async fn unknown_port_count_is_not_a_failure() {
    let (device, mut mock) = connect().await;

    let serve = async {
        let checksum_req = mock.recv_coap().await;
        // No yang-library on this firmware
        let resp = response_for(&checksum_req, Code::NOT_FOUND, vec![], None);
        mock.send_coap(&resp).await;

        let ifaces_req = mock.recv_coap().await;
        let resp = response_for(
            &ifaces_req,
            Code::CONTENT,
            encode(&interface_table(5)),
            Some(content_format::YANG_DATA_CBOR),
        );
        mock.send_coap(&resp).await;
    };

    let (info, ()) = tokio::join!(device.identify(), serve);
    let info = info.unwrap();
    assert_eq!(info.model, DeviceModel::Unknown);
    assert_eq!(info.port_count, 5);
    assert_eq!(info.checksum, None);
    device.disconnect();
}

#[tokio::test]
async fn client_error_carries_code_path_and_token() {
    let (device, mut mock) = connect().await;

    let serve = async {
        let req = mock.recv_coap().await;
        let resp = response_for(&req, Code::NOT_FOUND, vec![], None);
        mock.send_coap(&resp).await;
    };

    let (result, ()) = tokio::join!(device.yang_get("/no-such:thing"), serve);
    match result.unwrap_err() {
        Error::ClientError { code, path, .. } => {
            assert_eq!(code.to_string(), "4.04");
            assert_eq!(path, "/no-such:thing");
        }
        other => panic!("expected ClientError, got {other:?}"),
    }
    device.disconnect();
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let (device, mut mock) = connect().await;

    let serve = async {
        let req = mock.recv_coap().await;
        let resp = response_for(&req, Code::INTERNAL_SERVER_ERROR, vec![], None);
        mock.send_coap(&resp).await;
        req
    };

    let (result, req) = tokio::join!(
        device.yang_set("/ieee1588-ptp:ptp/instances", YangValue::map(vec![])),
        serve
    );
    let err = result.unwrap_err();
    assert!(matches!(err, Error::ServerError { .. }));
    assert_eq!(err.exit_code(), 4);
    assert_eq!(req.code, Code::PUT);
    // No retransmission follows a definitive error
    assert_eq!(device.stats().retransmits, 0);
    device.disconnect();
}

#[tokio::test]
async fn rst_terminates_the_exchange() {
    let (device, mut mock) = connect().await;

    let serve = async {
        let req = mock.recv_coap().await;
        let rst = Message::new(MessageType::Reset, Code::EMPTY, req.message_id);
        mock.send_coap(&rst).await;
    };

    let (result, ()) = tokio::join!(device.yang_delete("/ietf-interfaces:interfaces"), serve);
    assert!(matches!(result.unwrap_err(), Error::Reset { .. }));
    device.disconnect();
}

#[tokio::test]
async fn separate_response_is_acknowledged() {
    let (device, mut mock) = connect().await;
    let body = encode(&YangValue::Bool(true));

    let serve = async {
        let req = mock.recv_coap().await;
        // Empty ACK first, then a confirmable response with its own MID
        mock.send_coap(&Message::ack(req.message_id)).await;

        let mut resp = Message::new(MessageType::Confirmable, Code::CONTENT, 0x7777);
        resp.token = req.token.clone();
        resp.set_content_format(content_format::YANG_DATA_CBOR);
        resp.payload = body.clone();
        mock.send_coap(&resp).await;

        // The host must ACK the separate response
        let ack = mock.recv_coap().await;
        assert_eq!(ack.mtype, MessageType::Acknowledgement);
        assert_eq!(ack.code, Code::EMPTY);
        assert_eq!(ack.message_id, 0x7777);
    };

    let (value, ()) = tokio::join!(
        device.yang_get("/ietf-interfaces:interfaces/interface/enabled"),
        serve
    );
    assert_eq!(value.unwrap(), YangValue::Bool(true));
    device.disconnect();
}

#[tokio::test]
async fn exchanges_interleave_and_correlate_by_token() {
    let (device, mut mock) = connect().await;

    let serve = async {
        let first = mock.recv_coap().await;
        let second = mock.recv_coap().await;
        assert_ne!(first.token, second.token, "tokens must be distinct");

        // Answer out of order: the correlator sorts it out by token
        let resp = response_for(
            &second,
            Code::CONTENT,
            encode(&YangValue::Int(2)),
            Some(content_format::YANG_DATA_CBOR),
        );
        mock.send_coap(&resp).await;
        let resp = response_for(
            &first,
            Code::CONTENT,
            encode(&YangValue::Int(1)),
            Some(content_format::YANG_DATA_CBOR),
        );
        mock.send_coap(&resp).await;
    };

    let (a, b, ()) = tokio::join!(
        device.yang_get("/ietf-interfaces:interfaces"),
        device.yang_get("/ieee1588-ptp:ptp"),
        serve
    );
    assert_eq!(a.unwrap().as_int(), Some(1));
    assert_eq!(b.unwrap().as_int(), Some(2));
    device.disconnect();
}

#[tokio::test]
async fn late_reply_after_cancel_is_dropped() {
    let (device, mut mock) = connect().await;

    let handle = device
        .client()
        .submit(CoapRequest::get("/ietf-interfaces:interfaces"))
        .await
        .unwrap();
    let req = mock.recv_coap().await;

    handle.cancel();
    let cancelled_token = handle.token();
    match handle.response().await {
        Err(Error::Cancelled(token)) => assert_eq!(token, cancelled_token),
        other => panic!("expected Cancelled, got {other:?}"),
    }

    // The reply lands after cancellation and must be silently discarded
    let resp = response_for(&req, Code::CONTENT, vec![0xF5], None);
    mock.send_coap(&resp).await;

    // Ping round-trip to make sure the loop has processed the late reply
    let (rtt, ()) = tokio::join!(device.ping(), mock.answer_ping());
    rtt.unwrap();

    assert!(device.stats().unmatched_responses >= 1);
    device.disconnect();
}

#[tokio::test]
async fn transport_loss_fails_outstanding_exchanges() {
    let (device, mut mock) = connect().await;

    let handle = device
        .client()
        .submit(CoapRequest::get("/ietf-interfaces:interfaces"))
        .await
        .unwrap();
    let _req = mock.recv_coap().await;
    drop(mock);

    let err = handle.response().await.unwrap_err();
    assert!(matches!(err, Error::TransportDown));
    assert_eq!(err.exit_code(), 2);

    // The loop flips to Disconnected right after failing the exchanges
    for _ in 0..100 {
        if device.state() == ConnectionState::Disconnected {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("state never reached Disconnected");
}

#[tokio::test]
async fn get_many_sends_sid_key_set() {
    let (device, mut mock) = connect().await;

    let serve = async {
        let req = mock.recv_coap().await;
        assert_eq!(req.code, Code::GET);
        assert_eq!(
            req.content_format(),
            Some(content_format::YANG_IDENTIFIERS_CBOR)
        );
        // Payload is a CBOR array of the two SIDs
        let table = SidTable::embedded();
        let keys = cbor::decode(&req.payload, &table).unwrap();
        let sids: Vec<i128> = keys
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_int().unwrap())
            .collect();
        assert_eq!(sids, vec![1000, 29304]);

        let body = YangValue::map(vec![
            YangValue::entry("SID:1000", YangValue::map(vec![])),
            YangValue::entry("SID:29304", YangValue::text("cafe")),
        ]);
        let resp = response_for(
            &req,
            Code::CONTENT,
            encode(&body),
            Some(content_format::YANG_DATA_CBOR),
        );
        mock.send_coap(&resp).await;
    };

    let (value, ()) = tokio::join!(
        device.yang_get_many(&[
            "/ietf-interfaces:interfaces",
            "/ietf-constrained-yang-library:yang-library/checksum",
        ]),
        serve
    );
    let value = value.unwrap();
    // The SID keys resolve back through the table on decode
    assert!(value.get("/ietf-interfaces:interfaces").is_some());
    assert_eq!(
        value
            .get("/ietf-constrained-yang-library:yang-library/checksum")
            .unwrap()
            .as_text(),
        Some("cafe")
    );
    device.disconnect();
}

#[tokio::test]
async fn unknown_path_in_get_many_fails_before_the_wire() {
    let (device, _mock) = connect().await;
    let err = device
        .yang_get_many(&["/made-up:path"])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownSid(_)));
    device.disconnect();
}

#[tokio::test(start_paused = true)]
async fn ping_times_out_without_reply() {
    let (local, _remote) = pair();
    let client = CoapClient::new(Box::new(local), ClientConfig::default());
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, Error::PingTimeout));
    client.shutdown();
}
