use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use stun3489::attrs::address_attr::AddressAttr;
use stun3489::attrs::change_request::ChangeRequest;
use stun3489::attrs::errcode_attr::ErrcodeAttr;
use stun3489::attrs::unknown_attrs::UnknownAttrs;
use stun3489::attrs::RawAttr;
use stun3489::constants::*;
use stun3489::error::{StunError, PROTO_INVALID_STATE, PROTO_NO_HANDLER};
use stun3489::handlers::{AuthCheck, AuthOutcome, BindingHandler, SharedSecretHandler};
use stun3489::header::{Header, MessageClass, TransId};
use stun3489::packet::Packet;
use stun3489::router::{MessageHandler, MessageRouter};

const TRANS_ID: TransId = [7u8; TRANS_ID_LEN];

fn client_addr() -> SocketAddr {
    "203.0.113.9:6000".parse().unwrap()
}

fn source_addr() -> SocketAddr {
    "198.51.100.1:3478".parse().unwrap()
}

fn changed_addr() -> SocketAddr {
    "198.51.100.2:3479".parse().unwrap()
}

fn binding_request(attrs: Vec<RawAttr>) -> Packet {
    let header = Header::for_method(MessageClass::Request, METHOD_BINDING, TRANS_ID);
    Packet::new(header, attrs)
}

fn default_handler() -> BindingHandler {
    BindingHandler::new(changed_addr()).with_source_addr(source_addr())
}

fn errcode_of(response: &Packet) -> ErrcodeAttr {
    response
        .find_attr(ATTR_ERROR_CODE)
        .expect("no error-code")
        .clone()
        .try_into()
        .unwrap()
}

struct CountingHandler {
    hits: Arc<AtomicUsize>,
}

impl MessageHandler for CountingHandler {
    fn handle_message(
        &self,
        _request: &Packet,
        _client_addr: SocketAddr,
    ) -> Result<Option<Packet>, StunError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

struct RejectAll;

impl AuthCheck for RejectAll {
    fn validate(&self, _request: &Packet, _client_addr: SocketAddr) -> AuthOutcome {
        AuthOutcome::Rejected("not on the list".to_string())
    }
}

struct CountingAuth {
    hits: Arc<AtomicUsize>,
}

impl AuthCheck for CountingAuth {
    fn validate(&self, _request: &Packet, _client_addr: SocketAddr) -> AuthOutcome {
        self.hits.fetch_add(1, Ordering::SeqCst);
        AuthOutcome::Allowed
    }
}

#[test]
pub fn test_route_unhandled_method() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = MessageRouter::new().register_handler(
        METHOD_BINDING,
        Box::new(CountingHandler { hits: hits.clone() }),
    );

    // shared-secret没注册handler, 已注册的handler也不该被调用
    let header = Header::for_method(MessageClass::Request, METHOD_SHARED_SECRET, TRANS_ID);
    let request = Packet::new(header, vec![]);

    match router.route_message(&request, client_addr()) {
        Err(StunError::Protocol(e)) => {
            assert_eq!(e.code, PROTO_NO_HANDLER);
        }
        v => panic!("expect Protocol, got {:?}", v),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
pub fn test_route_rejects_non_request() {
    let router =
        MessageRouter::new().register_handler(METHOD_BINDING, Box::new(default_handler()));

    let header = Header::for_method(MessageClass::SuccessResponse, METHOD_BINDING, TRANS_ID);
    let request = Packet::new(header, vec![]);

    match router.route_message(&request, client_addr()) {
        Err(StunError::Protocol(e)) => {
            assert_eq!(e.code, PROTO_INVALID_STATE);
        }
        v => panic!("expect Protocol, got {:?}", v),
    }
}

#[test]
pub fn test_chained_registration() {
    let router = MessageRouter::new()
        .register_handler(METHOD_BINDING, Box::new(default_handler()))
        .register_handler(METHOD_SHARED_SECRET, Box::new(SharedSecretHandler));

    assert!(router.has_handler(METHOD_BINDING));
    assert!(router.has_handler(METHOD_SHARED_SECRET));
}

#[test]
pub fn test_binding_unknown_attrs() {
    let auth_hits = Arc::new(AtomicUsize::new(0));
    let handler = default_handler().with_auth(Box::new(CountingAuth {
        hits: auth_hits.clone(),
    }));

    // 两个0x8000以下的未识别类型, 一个可忽略类型
    let request = binding_request(vec![
        RawAttr::new(0x000c, Bytes::from_static(&[0, 0, 0, 1])),
        RawAttr::new(0x0020, Bytes::from_static(&[0, 0, 0, 2])),
        RawAttr::new(0x8022, Bytes::from_static(&[0, 0, 0, 3])),
    ]);

    let response = handler
        .handle_message(&request, client_addr())
        .unwrap()
        .expect("no response");

    assert_eq!(response.class(), MessageClass::ErrorResponse);
    assert_eq!(response.header.trans_id, TRANS_ID);
    assert_eq!(errcode_of(&response).code, ERROR_CODE_UNKNOWN_ATTRIBUTE);

    let unknown: UnknownAttrs = response
        .find_attr(ATTR_UNKNOWN_ATTRIBUTES)
        .expect("no unknown-attributes")
        .clone()
        .try_into()
        .unwrap();
    assert_eq!(unknown.types, vec![0x000c, 0x0020]);

    // 420时不走认证, 也不构造成功响应
    assert_eq!(auth_hits.load(Ordering::SeqCst), 0);
    assert!(response.find_attr(ATTR_MAPPED_ADDRESS).is_none());
}

#[test]
pub fn test_binding_auth_rejected() {
    let handler = default_handler().with_auth(Box::new(RejectAll));

    let request = binding_request(vec![]);
    let response = handler
        .handle_message(&request, client_addr())
        .unwrap()
        .expect("no response");

    assert_eq!(response.class(), MessageClass::ErrorResponse);

    let errcode = errcode_of(&response);
    assert_eq!(errcode.code, ERROR_CODE_UNAUTHORIZED);
    assert_eq!(errcode.msg, "not on the list");
}

#[test]
pub fn test_binding_success() {
    let handler = default_handler();

    let request = binding_request(vec![]);
    let response = handler
        .handle_message(&request, client_addr())
        .unwrap()
        .expect("no response");

    assert_eq!(response.class(), MessageClass::SuccessResponse);
    assert_eq!(response.method(), METHOD_BINDING);
    assert_eq!(response.header.trans_id, TRANS_ID);

    let mapped = response.find_address_attr(ATTR_MAPPED_ADDRESS).unwrap();
    assert_eq!(mapped.socket_addr(), Some(client_addr()));

    let source = response.find_address_attr(ATTR_SOURCE_ADDRESS).unwrap();
    assert_eq!(source.socket_addr(), Some(source_addr()));

    let changed = response.find_address_attr(ATTR_CHANGED_ADDRESS).unwrap();
    assert_eq!(changed.socket_addr(), Some(changed_addr()));

    assert!(response.find_attr(ATTR_REFLECTED_FROM).is_none());
}

#[test]
pub fn test_binding_no_source_addr() {
    // 不知道本地地址就不加source-address
    let handler = BindingHandler::new(changed_addr());

    let request = binding_request(vec![]);
    let response = handler
        .handle_message(&request, client_addr())
        .unwrap()
        .expect("no response");

    assert_eq!(response.class(), MessageClass::SuccessResponse);
    assert!(response.find_attr(ATTR_SOURCE_ADDRESS).is_none());
}

#[test]
pub fn test_binding_response_address_reflected() {
    let handler = default_handler();

    // response-address不改道, 只多带一个reflected-from
    let response_addr: SocketAddr = "192.0.2.50:9000".parse().unwrap();
    let request = binding_request(vec![AddressAttr::new(
        ATTR_RESPONSE_ADDRESS,
        response_addr,
    )
    .into()]);

    let response = handler
        .handle_message(&request, client_addr())
        .unwrap()
        .expect("no response");

    assert_eq!(response.class(), MessageClass::SuccessResponse);

    let reflected = response.find_address_attr(ATTR_REFLECTED_FROM).unwrap();
    assert_eq!(reflected.socket_addr(), Some(client_addr()));
}

#[test]
pub fn test_binding_change_request_ignored() {
    let handler = default_handler();

    // change标志只记日志, 响应照常构造
    let request = binding_request(vec![ChangeRequest::new(true, true).into()]);
    let response = handler
        .handle_message(&request, client_addr())
        .unwrap()
        .expect("no response");

    assert_eq!(response.class(), MessageClass::SuccessResponse);

    let source = response.find_address_attr(ATTR_SOURCE_ADDRESS).unwrap();
    assert_eq!(source.socket_addr(), Some(source_addr()));
}

#[test]
pub fn test_shared_secret_rejected() {
    let handler = SharedSecretHandler;

    let header = Header::for_method(MessageClass::Request, METHOD_SHARED_SECRET, TRANS_ID);
    let request = Packet::new(header, vec![]);

    let response = handler
        .handle_message(&request, client_addr())
        .unwrap()
        .expect("no response");

    assert_eq!(response.class(), MessageClass::ErrorResponse);
    assert_eq!(response.method(), METHOD_SHARED_SECRET);

    let errcode = errcode_of(&response);
    assert_eq!(errcode.code, ERROR_CODE_UNAUTHORIZED);
    assert!(errcode.msg.contains("tls"));
}
