use crate::error::{ProtocolErr, StunError, PROTO_INVALID_STATE, PROTO_NO_HANDLER};
use crate::header::MessageClass;
use crate::packet::Packet;
use std::collections::HashMap;
use std::net::SocketAddr;

// method -> handler 的分发表
// 只接受request类报文
// 没注册handler算协议层故障, 由调用方决定怎么回

pub trait MessageHandler: Send + Sync {
    // 返回None表示不回包
    fn handle_message(
        &self,
        request: &Packet,
        client_addr: SocketAddr,
    ) -> Result<Option<Packet>, StunError>;
}

#[derive(Default)]
pub struct MessageRouter {
    handlers: HashMap<u16, Box<dyn MessageHandler>>,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    // 链式注册
    pub fn register_handler(mut self, method: u16, handler: Box<dyn MessageHandler>) -> Self {
        self.handlers.insert(method, handler);
        self
    }

    pub fn has_handler(&self, method: u16) -> bool {
        self.handlers.contains_key(&method)
    }

    pub fn route_message(
        &self,
        request: &Packet,
        client_addr: SocketAddr,
    ) -> Result<Option<Packet>, StunError> {
        if request.class() != MessageClass::Request {
            return Err(ProtocolErr::new(
                PROTO_INVALID_STATE,
                &format!("not a request, msg_type: {}", request.header.msg_type),
            )
            .into());
        }

        match self.handlers.get(&request.method()) {
            Some(v) => v.handle_message(request, client_addr),
            None => Err(ProtocolErr::new(
                PROTO_NO_HANDLER,
                &format!("no handler for method: {}", request.method()),
            )
            .into()),
        }
    }
}
