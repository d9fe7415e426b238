use crate::attrs::address_attr::AddressAttr;
use crate::attrs::change_request::ChangeRequest;
use crate::attrs::errcode_attr::ErrcodeAttr;
use crate::attrs::unknown_attrs::UnknownAttrs;
use crate::constants::*;
use crate::error::StunError;
use crate::header::{Header, MessageClass};
use crate::packet::Packet;
use crate::router::MessageHandler;
use log::{error, warn};
use std::net::SocketAddr;

// binding和shared-secret的默认handler

pub enum AuthOutcome {
    Allowed,
    Rejected(String),
}

// 可选的认证钩子
pub trait AuthCheck: Send + Sync {
    fn validate(&self, request: &Packet, client_addr: SocketAddr) -> AuthOutcome;
}

pub struct BindingHandler {
    // 服务器socket实际绑定的地址, 未知就不加source-address
    source_addr: Option<SocketAddr>,
    changed_addr: SocketAddr,
    auth: Option<Box<dyn AuthCheck>>,
}

impl BindingHandler {
    pub fn new(changed_addr: SocketAddr) -> Self {
        Self {
            source_addr: None,
            changed_addr,
            auth: None,
        }
    }

    pub fn with_source_addr(mut self, addr: SocketAddr) -> Self {
        self.source_addr = Some(addr);
        self
    }

    pub fn with_auth(mut self, auth: Box<dyn AuthCheck>) -> Self {
        self.auth = Some(auth);
        self
    }

    fn build_success(
        &self,
        request: &Packet,
        client_addr: SocketAddr,
    ) -> Result<Packet, StunError> {
        let header = Header::for_method(
            MessageClass::SuccessResponse,
            METHOD_BINDING,
            request.header.trans_id,
        );
        let mut response = Packet::new(header, vec![]);

        response.add_attr(AddressAttr::new(ATTR_MAPPED_ADDRESS, client_addr).into());
        if let Some(v) = self.source_addr {
            response.add_attr(AddressAttr::new(ATTR_SOURCE_ADDRESS, v).into());
        }
        response.add_attr(AddressAttr::new(ATTR_CHANGED_ADDRESS, self.changed_addr).into());

        // change标志只记日志, 响应仍从收包的地址发出
        // 暂不支持从alternate地址回包
        if let Some(attr) = request.find_attr(ATTR_CHANGE_REQUEST) {
            let flags: ChangeRequest = attr.clone().try_into()?;
            warn!(
                "change-request not support, ip:{} port:{}",
                flags.change_ip, flags.change_port
            );
        }

        // response-address只让响应多带一个reflected-from
        // 响应还是回给真实的发送方, 不改道
        if request.find_attr(ATTR_RESPONSE_ADDRESS).is_some() {
            response.add_attr(AddressAttr::new(ATTR_REFLECTED_FROM, client_addr).into());
        }

        Ok(response)
    }
}

impl MessageHandler for BindingHandler {
    fn handle_message(
        &self,
        request: &Packet,
        client_addr: SocketAddr,
    ) -> Result<Option<Packet>, StunError> {
        // 有未识别的必选属性时直接420, 不再走认证和成功路径
        let unknown = request.unknown_mandatory_attrs();
        if !unknown.is_empty() {
            let mut response =
                error_response(request, ERROR_CODE_UNKNOWN_ATTRIBUTE, "unknown attribute");
            response.add_attr(UnknownAttrs::new(unknown).into());
            return Ok(Some(response));
        }

        if let Some(auth) = &self.auth {
            if let AuthOutcome::Rejected(reason) = auth.validate(request, client_addr) {
                return Ok(Some(error_response(
                    request,
                    ERROR_CODE_UNAUTHORIZED,
                    &reason,
                )));
            }
        }

        // 协议类故障带原始信息转500, 其他故障不外泄细节
        match self.build_success(request, client_addr) {
            Ok(v) => Ok(Some(v)),
            Err(StunError::Protocol(e)) => Ok(Some(error_response(
                request,
                ERROR_CODE_SERVER_ERROR,
                &e.msg,
            ))),
            Err(e) => {
                error!("error, binding handler, {}, {:?}", client_addr, e);
                Ok(Some(error_response(
                    request,
                    ERROR_CODE_SERVER_ERROR,
                    "server error",
                )))
            }
        }
    }
}

// 只支持udp, shared-secret需要tls通道, 一律401
pub struct SharedSecretHandler;

impl MessageHandler for SharedSecretHandler {
    fn handle_message(
        &self,
        request: &Packet,
        _client_addr: SocketAddr,
    ) -> Result<Option<Packet>, StunError> {
        Ok(Some(error_response(
            request,
            ERROR_CODE_UNAUTHORIZED,
            "shared secret requires tls channel",
        )))
    }
}

pub fn error_response(request: &Packet, code: u16, reason: &str) -> Packet {
    let header = Header::for_method(
        MessageClass::ErrorResponse,
        request.method(),
        request.header.trans_id,
    );

    let mut response = Packet::new(header, vec![]);
    response.add_attr(ErrcodeAttr::new(code, reason).into());
    response
}
