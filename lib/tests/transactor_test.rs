mod common;

use bytes::Bytes;
use std::time::Duration;

use common::{addr, new_mock, no_reply, push_rule};
use stun3489::constants::METHOD_BINDING;
use stun3489::error::StunError;
use stun3489::header::{Header, MessageClass};
use stun3489::packet::Packet;
use stun3489::transactor::Transactor;

#[test]
pub fn test_degenerate_destination() {
    let (mock, state) = new_mock("192.168.1.2:4000");
    // 目的地址无效时连bind都不应该发生
    state.borrow_mut().fail_bind = true;

    let mut transactor = Transactor::new(mock, addr("0.0.0.0:0"));
    let request = transactor.new_binding_request(None);

    let result = transactor
        .send_request(&request, "0.0.0.0", 3478, Duration::from_millis(50))
        .unwrap();

    assert!(result.is_none());
    assert_eq!(state.borrow().bind_count, 0);
    assert!(state.borrow().sent.is_empty());
    assert!(!transactor
        .allocator()
        .is_outstanding(&request.header.trans_id));
}

#[test]
pub fn test_timeout() {
    let (mock, state) = new_mock("192.168.1.2:4000");
    push_rule(&state, no_reply());

    let mut transactor = Transactor::new(mock, addr("0.0.0.0:0"));
    let request = transactor.new_binding_request(None);

    let timeout = Duration::from_millis(40);
    match transactor.send_request(&request, "198.51.100.1", 3478, timeout) {
        Err(StunError::Timeout { elapsed, limit }) => {
            assert!(elapsed >= timeout);
            assert_eq!(limit, timeout);
        }
        v => panic!("expect Timeout, got {:?}", v),
    }

    assert_eq!(state.borrow().sent.len(), 1);
    assert!(!transactor
        .allocator()
        .is_outstanding(&request.header.trans_id));
}

#[test]
pub fn test_stray_datagrams_ignored() {
    let (mock, state) = new_mock("192.168.1.2:4000");

    // 一次发出四个包: 来源不对/trans id不对/非stun/正确
    push_rule(
        &state,
        Box::new(|data, dest| {
            let request = Packet::unpack(Bytes::copy_from_slice(data)).unwrap();

            let good = Packet::new(
                Header::for_method(
                    MessageClass::SuccessResponse,
                    METHOD_BINDING,
                    request.header.trans_id,
                ),
                vec![],
            );

            let mut bad_id = request.header.trans_id;
            bad_id[0] ^= 0xff;
            let bad = Packet::new(
                Header::for_method(MessageClass::SuccessResponse, METHOD_BINDING, bad_id),
                vec![],
            );

            vec![
                (good.pack(), addr("203.0.113.77:3478")),
                (bad.pack(), dest),
                (Bytes::from_static(b"junk"), dest),
                (good.pack(), dest),
            ]
        }),
    );

    let mut transactor = Transactor::new(mock, addr("0.0.0.0:0"));
    let request = transactor.new_binding_request(None);

    let response = transactor
        .send_request(&request, "198.51.100.1", 3478, Duration::from_millis(200))
        .unwrap()
        .expect("no response");

    assert_eq!(response.header.trans_id, request.header.trans_id);
    assert_eq!(response.class(), MessageClass::SuccessResponse);
    assert!(!transactor
        .allocator()
        .is_outstanding(&request.header.trans_id));

    // 只发了一次
    assert_eq!(state.borrow().sent.len(), 1);
    assert_eq!(state.borrow().sent[0].1, addr("198.51.100.1:3478"));
}
