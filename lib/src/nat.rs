use crate::constants::{ATTR_CHANGED_ADDRESS, ATTR_MAPPED_ADDRESS};
use crate::error::{ProtocolErr, StunError, PROTO_INCOMPLETE};
use crate::packet::Packet;
use crate::transactor::{canonical_ip, resolve_host, Transactor};
use crate::transport::Transport;
use log::debug;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

// rfc 3489, 10.1 的判定树
// 探测严格串行, 一个test(含超时)结束后才开始下一个

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NatType {
    OpenInternet,
    SymmetricFirewall,
    FullCone,
    RestrictedCone,
    PortRestrictedCone,
    Symmetric,
    UdpBlocked,
}

impl NatType {
    // 这类nat可以直接打洞
    pub fn traversable(&self) -> bool {
        matches!(
            self,
            NatType::OpenInternet
                | NatType::FullCone
                | NatType::RestrictedCone
                | NatType::PortRestrictedCone
        )
    }
}

#[derive(Debug, Clone)]
pub struct NatReport {
    pub nat_type: NatType,
    pub mapped_addr: Option<SocketAddr>,
    pub local_addr: Option<SocketAddr>,
}

pub struct NatClassifier<T: Transport> {
    transactor: Transactor<T>,
    timeout: Duration,
}

impl<T: Transport> NatClassifier<T> {
    pub fn new(transactor: Transactor<T>, timeout: Duration) -> Self {
        Self {
            transactor,
            timeout,
        }
    }

    pub fn classify(
        &mut self,
        server_host: &str,
        server_port: u16,
    ) -> Result<NatReport, StunError> {
        // changed-address兜底要用到主ip, 先解析一次
        // 后面的探测都传字面量ip
        let candidates = resolve_host(server_host, server_port)?;
        let primary_ip = canonical_ip(candidates[0]);
        let primary = SocketAddr::new(primary_ip, server_port);

        // test1: 到主地址的普通binding请求
        let request = self.transactor.new_binding_request(None);
        let response =
            match self
                .transactor
                .send_request(&request, server_host, server_port, self.timeout)
            {
                Ok(Some(v)) => v,
                // 无响应 => udp被挡
                Ok(None) => return Ok(blocked_report()),
                Err(StunError::Timeout { .. }) => return Ok(blocked_report()),
                // test1的解析/transport错误是致命的
                Err(e) => {
                    self.transactor.abandon(&request);
                    return Err(e);
                }
            };

        let local_addr = self.transactor.local_addr();

        let mapped = find_address(&response, ATTR_MAPPED_ADDRESS)?;
        let changed = find_address(&response, ATTR_CHANGED_ADDRESS)?;
        let changed = fix_degenerate(changed, primary_ip);

        debug!(
            "test1, local:{:?} mapped:{} changed:{}",
            local_addr, mapped, changed
        );

        let no_translation = match local_addr {
            Some(v) => addr_eq(mapped, v),
            None => false,
        };

        if no_translation {
            // test2: 到alternate地址的普通binding请求
            return match self.probe(changed, None) {
                Some(_) => Ok(report(NatType::OpenInternet, mapped, local_addr)),
                None => Ok(report(NatType::SymmetricFirewall, mapped, local_addr)),
            };
        }

        // 有nat
        if self.probe(changed, None).is_some() {
            return Ok(report(NatType::FullCone, mapped, local_addr));
        }

        // test1': 再发一次普通binding请求, 这次发给alternate地址
        let response = match self.probe(changed, None) {
            Some(v) => v,
            None => {
                return Err(ProtocolErr::new(
                    PROTO_INCOMPLETE,
                    "no response from alternate endpoint",
                )
                .into());
            }
        };
        let mapped2 = find_address(&response, ATTR_MAPPED_ADDRESS)?;
        debug!("test1', mapped:{} mapped2:{}", mapped, mapped2);

        if !addr_eq(mapped2, mapped) {
            return Ok(report(NatType::Symmetric, mapped, local_addr));
        }

        // test3: 回到主地址, 只带change port标志
        match self.probe(primary, Some((false, true))) {
            Some(_) => Ok(report(NatType::RestrictedCone, mapped, local_addr)),
            None => Ok(report(NatType::PortRestrictedCone, mapped, local_addr)),
        }
    }

    // 单个test的transport错误只算本test无响应, 不中断整个判定
    fn probe(&mut self, dest: SocketAddr, change_request: Option<(bool, bool)>) -> Option<Packet> {
        let request = self.transactor.new_binding_request(change_request);
        match self.transactor.send_request(
            &request,
            &dest.ip().to_string(),
            dest.port(),
            self.timeout,
        ) {
            Ok(v) => v,
            Err(StunError::Timeout { .. }) => None,
            Err(e) => {
                debug!("error, probe, {}, {:?}", dest, e);
                self.transactor.abandon(&request);
                None
            }
        }
    }
}

fn report(nat_type: NatType, mapped: SocketAddr, local_addr: Option<SocketAddr>) -> NatReport {
    NatReport {
        nat_type,
        mapped_addr: Some(mapped),
        local_addr,
    }
}

fn blocked_report() -> NatReport {
    NatReport {
        nat_type: NatType::UdpBlocked,
        mapped_addr: None,
        local_addr: None,
    }
}

// 响应里缺地址属性时判定无法继续, 不做静默兜底
fn find_address(response: &Packet, attr_type: u16) -> Result<SocketAddr, StunError> {
    let attr = response
        .find_address_attr(attr_type)
        .ok_or_else(|| ProtocolErr::new(PROTO_INCOMPLETE, &format!("no attr: {}", attr_type)))?;

    attr.socket_addr()
        .ok_or_else(|| ProtocolErr::new(PROTO_INCOMPLETE, &format!("bad attr: {}", attr_type)).into())
}

// 服务器返回0.0.0.0时用主地址的ip替换, 只保留alternate端口
fn fix_degenerate(changed: SocketAddr, primary_ip: IpAddr) -> SocketAddr {
    if changed.ip().is_unspecified() {
        return SocketAddr::new(primary_ip, changed.port());
    }

    changed
}

fn addr_eq(a: SocketAddr, b: SocketAddr) -> bool {
    canonical_ip(a.ip()) == canonical_ip(b.ip()) && a.port() == b.port()
}
