use crate::attrs::change_request::ChangeRequest;
use crate::constants::METHOD_BINDING;
use crate::error::{StunError, TransportErr, TRANSPORT_RESOLVE};
use crate::header::{Header, MessageClass};
use crate::packet::Packet;
use crate::transaction::TransactionAllocator;
use crate::transport::Transport;
use crate::util::print_bytes;
use log::debug;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::time::{Duration, Instant};

// 一次性的请求/响应交换
// 每次调用前先close再重新bind, 清掉旧的socket状态
// 单次发送, 循环接收直到匹配或者到deadline
// 来源ip或transaction id不匹配的包丢弃, 继续等

pub struct Transactor<T: Transport> {
    transport: T,
    allocator: TransactionAllocator,
    bind_addr: SocketAddr,
}

impl<T: Transport> Transactor<T> {
    pub fn new(transport: T, bind_addr: SocketAddr) -> Self {
        Self {
            transport,
            allocator: TransactionAllocator::new(),
            bind_addr,
        }
    }

    pub fn allocator(&self) -> &TransactionAllocator {
        &self.allocator
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn new_binding_request(&self, change_request: Option<(bool, bool)>) -> Packet {
        let trans_id = self.allocator.allocate();
        let header = Header::for_method(MessageClass::Request, METHOD_BINDING, trans_id);
        let mut request = Packet::new(header, vec![]);

        if let Some((change_ip, change_port)) = change_request {
            let attr = ChangeRequest::new(change_ip, change_port);
            request.add_attr(attr.into());
        }

        request
    }

    // 调用方放弃在途请求
    pub fn abandon(&self, request: &Packet) {
        self.allocator.release(&request.header.trans_id);
    }

    pub fn send_request(
        &mut self,
        request: &Packet,
        dest_host: &str,
        dest_port: u16,
        timeout: Duration,
    ) -> Result<Option<Packet>, StunError> {
        let candidates = resolve_host(dest_host, dest_port)?;
        let target_ip = canonical_ip(candidates[0]);

        // 0.0.0.0算无效目的地址, 不发包, 按无响应返回
        if target_ip.is_unspecified() {
            self.allocator.release(&request.header.trans_id);
            return Ok(None);
        }

        let target = SocketAddr::new(target_ip, dest_port);

        self.transport.close();
        self.transport.bind(self.bind_addr)?;

        let data = request.pack();
        debug!("request len: {}", data.len());
        debug!(
            "{:?} --> {}\n{}",
            self.transport.local_addr(),
            target,
            print_bytes(&data, " ", 8)
        );
        self.transport.send(&data, target)?;

        let started = Instant::now();
        loop {
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                self.allocator.release(&request.header.trans_id);
                return Err(StunError::Timeout {
                    elapsed,
                    limit: timeout,
                });
            }

            let remaining = timeout - elapsed;
            let (buf, remote_addr) = match self.transport.recv(remaining)? {
                Some(v) => v,
                None => continue,
            };

            if !source_matches(&candidates, remote_addr.ip()) {
                debug!("drop datagram, wrong source: {}", remote_addr);
                continue;
            }

            let response = match Packet::unpack(buf) {
                Ok(v) => v,
                Err(e) => {
                    debug!("drop datagram, {:?}", e);
                    continue;
                }
            };

            if response.header.trans_id != request.header.trans_id {
                debug!("drop datagram, wrong trans id, from: {}", remote_addr);
                continue;
            }

            debug!(
                "{:?} <-- {}, msg_type: {}",
                self.transport.local_addr(),
                remote_addr,
                response.header.msg_type
            );

            self.allocator.release(&request.header.trans_id);
            return Ok(Some(response));
        }
    }
}

// 域名解析成候选ip列表, 字面量ip直接返回
pub fn resolve_host(host: &str, port: u16) -> Result<Vec<IpAddr>, StunError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }

    match (host, port).to_socket_addrs() {
        Ok(iter) => {
            let ips: Vec<IpAddr> = iter.map(|v| v.ip()).collect();
            if ips.is_empty() {
                return Err(TransportErr::new(
                    TRANSPORT_RESOLVE,
                    host,
                    port,
                    "no address found",
                )
                .into());
            }
            Ok(ips)
        }
        Err(e) => {
            Err(TransportErr::new(TRANSPORT_RESOLVE, host, port, &format!("{}", e)).into())
        }
    }
}

// v4-mapped的v6地址还原成v4再比较
pub fn canonical_ip(ip: IpAddr) -> IpAddr {
    if let IpAddr::V6(v6) = ip {
        let seg = v6.segments();
        if seg[0..5] == [0, 0, 0, 0, 0] && seg[5] == 0xffff {
            let [a, b] = seg[6].to_be_bytes();
            let [c, d] = seg[7].to_be_bytes();
            return IpAddr::V4(Ipv4Addr::new(a, b, c, d));
        }
    }

    ip
}

fn source_matches(candidates: &[IpAddr], source: IpAddr) -> bool {
    let source = canonical_ip(source);
    candidates.iter().any(|v| canonical_ip(*v) == source)
}
