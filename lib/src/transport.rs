use crate::constants::{DEFAULT_BUFFER_SIZE, DEFAULT_TIMEOUT_MS};
use crate::error::{StunError, TransportErr, TRANSPORT_BIND, TRANSPORT_RECV, TRANSPORT_SEND};
use bytes::Bytes;
use log::debug;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

// udp收发的最小抽象
// recv在超时内没有数据时返回None, 不算错误

pub trait Transport {
    fn bind(&mut self, addr: SocketAddr) -> Result<(), StunError>;

    fn send(&mut self, data: &[u8], dest: SocketAddr) -> Result<usize, StunError>;

    fn recv(&mut self, timeout: Duration) -> Result<Option<(Bytes, SocketAddr)>, StunError>;

    fn local_addr(&self) -> Option<SocketAddr>;

    fn last_error(&self) -> Option<String>;

    fn close(&mut self);
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub bind_ip: IpAddr,
    pub bind_port: u16,
    pub buffer_size: usize,
    pub send_timeout: Duration,
    pub recv_timeout: Duration,
    pub retry_count: u32,
    pub retry_interval: Duration,
    pub blocking: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            bind_port: 0,
            buffer_size: DEFAULT_BUFFER_SIZE,
            send_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            recv_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry_count: 0,
            retry_interval: Duration::from_millis(100),
            blocking: true,
        }
    }
}

impl TransportConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.bind_port)
    }

    pub fn validate(&self) -> Result<(), StunError> {
        if self.buffer_size == 0 {
            return Err(StunError::InvalidArgument(format!(
                "buffer_size:{}",
                self.buffer_size
            )));
        }

        // 只支持阻塞模式
        if !self.blocking {
            return Err(StunError::InvalidArgument(
                "non-blocking mode not support".to_string(),
            ));
        }

        Ok(())
    }
}

pub struct UdpTransport {
    config: TransportConfig,
    socket: Option<UdpSocket>,
    last_error: Option<String>,
}

impl UdpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, StunError> {
        config.validate()?;

        Ok(Self {
            config,
            socket: None,
            last_error: None,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn record(&mut self, msg: String) -> String {
        self.last_error = Some(msg.clone());
        msg
    }
}

impl Transport for UdpTransport {
    fn bind(&mut self, addr: SocketAddr) -> Result<(), StunError> {
        match UdpSocket::bind(addr) {
            Ok(v) => {
                debug!("bound: {:?}", v.local_addr());
                self.socket = Some(v);
                Ok(())
            }
            Err(e) => {
                let msg = self.record(format!("{}", e));
                Err(TransportErr::new(TRANSPORT_BIND, &addr.ip().to_string(), addr.port(), &msg)
                    .into())
            }
        }
    }

    fn send(&mut self, data: &[u8], dest: SocketAddr) -> Result<usize, StunError> {
        let attempts = self.config.retry_count + 1;
        let retry_interval = self.config.retry_interval;

        let socket = match self.socket.as_ref() {
            Some(v) => v,
            None => {
                let msg = "not bound".to_string();
                self.last_error = Some(msg.clone());
                return Err(TransportErr::new(
                    TRANSPORT_SEND,
                    &dest.ip().to_string(),
                    dest.port(),
                    &msg,
                )
                .into());
            }
        };

        // 按配置重试, 调用方只看到最终结果
        let mut last = None;
        for i in 0..attempts {
            match socket.send_to(data, dest) {
                Ok(v) => {
                    return Ok(v);
                }
                Err(e) => {
                    debug!("error, send_to, {}, attempt:{}, {:?}", dest, i, e);
                    last = Some(format!("{}", e));
                }
            }
            if i + 1 < attempts {
                thread::sleep(retry_interval);
            }
        }

        let msg = self.record(last.unwrap_or_else(|| "send fail".to_string()));
        Err(TransportErr::new(TRANSPORT_SEND, &dest.ip().to_string(), dest.port(), &msg).into())
    }

    fn recv(&mut self, timeout: Duration) -> Result<Option<(Bytes, SocketAddr)>, StunError> {
        if timeout.is_zero() {
            return Ok(None);
        }

        let buffer_size = self.config.buffer_size;
        let socket = match self.socket.as_ref() {
            Some(v) => v,
            None => {
                let msg = "not bound".to_string();
                self.last_error = Some(msg.clone());
                return Err(TransportErr::new(TRANSPORT_RECV, "", 0, &msg).into());
            }
        };

        if let Err(e) = socket.set_read_timeout(Some(timeout)) {
            let msg = self.record(format!("{}", e));
            return Err(TransportErr::new(TRANSPORT_RECV, "", 0, &msg).into());
        }

        let mut buf = vec![0u8; buffer_size];
        match socket.recv_from(&mut buf) {
            Ok((len, remote_addr)) => {
                let data = Bytes::copy_from_slice(&buf[..len]);
                Ok(Some((data, remote_addr)))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Ok(None)
            }
            Err(e) => {
                let msg = self.record(format!("{}", e));
                Err(TransportErr::new(TRANSPORT_RECV, "", 0, &msg).into())
            }
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|v| v.local_addr().ok())
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn close(&mut self) {
        self.socket = None;
    }
}
