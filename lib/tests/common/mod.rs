#![allow(dead_code)]

use bytes::Bytes;
use std::cell::RefCell;
use std::cmp;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use stun3489::attrs::address_attr::AddressAttr;
use stun3489::attrs::RawAttr;
use stun3489::constants::{ATTR_CHANGED_ADDRESS, ATTR_MAPPED_ADDRESS, METHOD_BINDING};
use stun3489::error::{StunError, TransportErr, TRANSPORT_BIND};
use stun3489::header::{Header, MessageClass};
use stun3489::packet::Packet;
use stun3489::transport::Transport;

// 脚本化的transport
// 每次send消耗一条规则, 规则决定回哪些包(含来源地址)
// recv从收件队列取, 队列空时小睡一下返回None

pub type ReplyRule = Box<dyn FnMut(&[u8], SocketAddr) -> Vec<(Bytes, SocketAddr)>>;

#[derive(Default)]
pub struct MockState {
    pub rules: VecDeque<ReplyRule>,
    pub sent: Vec<(Bytes, SocketAddr)>,
    pub bind_count: usize,
    pub fail_bind: bool,
    pub bound: bool,
    pub inbox: VecDeque<(Bytes, SocketAddr)>,
}

pub struct MockTransport {
    pub state: Rc<RefCell<MockState>>,
    pub local: SocketAddr,
}

pub fn new_mock(local: &str) -> (MockTransport, Rc<RefCell<MockState>>) {
    let state = Rc::new(RefCell::new(MockState::default()));
    let mock = MockTransport {
        state: state.clone(),
        local: addr(local),
    };

    (mock, state)
}

impl Transport for MockTransport {
    fn bind(&mut self, bind_addr: SocketAddr) -> Result<(), StunError> {
        let mut state = self.state.borrow_mut();
        if state.fail_bind {
            return Err(TransportErr::new(
                TRANSPORT_BIND,
                &bind_addr.ip().to_string(),
                bind_addr.port(),
                "mock bind fail",
            )
            .into());
        }

        state.bind_count += 1;
        state.bound = true;
        Ok(())
    }

    fn send(&mut self, data: &[u8], dest: SocketAddr) -> Result<usize, StunError> {
        let rule = {
            let mut state = self.state.borrow_mut();
            state.sent.push((Bytes::copy_from_slice(data), dest));
            state.rules.pop_front()
        };

        if let Some(mut rule) = rule {
            let replies = rule(data, dest);
            let mut state = self.state.borrow_mut();
            for v in replies {
                state.inbox.push_back(v);
            }
        }

        Ok(data.len())
    }

    fn recv(&mut self, timeout: Duration) -> Result<Option<(Bytes, SocketAddr)>, StunError> {
        let next = self.state.borrow_mut().inbox.pop_front();
        match next {
            Some(v) => Ok(Some(v)),
            None => {
                thread::sleep(cmp::min(timeout, Duration::from_millis(2)));
                Ok(None)
            }
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.state.borrow().bound.then_some(self.local)
    }

    fn last_error(&self) -> Option<String> {
        None
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.bound = false;
        state.inbox.clear();
    }
}

//--------------------------------------------------

pub fn addr(s: &str) -> SocketAddr {
    s.parse().expect("bad addr")
}

pub fn push_rule(state: &Rc<RefCell<MockState>>, rule: ReplyRule) {
    state.borrow_mut().rules.push_back(rule);
}

// 不回包
pub fn no_reply() -> ReplyRule {
    Box::new(|_, _| vec![])
}

// 用请求的trans id回一个binding成功响应, 来源就是发送目的地址
pub fn reply_rule(attrs: Vec<RawAttr>) -> ReplyRule {
    Box::new(move |data, dest| {
        let request = Packet::unpack(Bytes::copy_from_slice(data)).expect("bad request");
        let header = Header::for_method(
            MessageClass::SuccessResponse,
            METHOD_BINDING,
            request.header.trans_id,
        );
        let response = Packet::new(header, attrs.clone());

        vec![(response.pack(), dest)]
    })
}

pub fn mapped_changed(mapped: &str, changed: &str) -> Vec<RawAttr> {
    vec![
        AddressAttr::new(ATTR_MAPPED_ADDRESS, addr(mapped)).into(),
        AddressAttr::new(ATTR_CHANGED_ADDRESS, addr(changed)).into(),
    ]
}
