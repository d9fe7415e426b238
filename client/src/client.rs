use log::debug;
use std::net::IpAddr;
use std::time::Duration;

use stun3489::error::StunError;
use stun3489::nat::{NatClassifier, NatReport};
use stun3489::transactor::Transactor;
use stun3489::transport::{TransportConfig, UdpTransport};

// 组装transport+transactor+classifier, 跑一轮探测
// 探测是阻塞串行的, 占用当前线程直到判定结束

pub fn probe_nat(
    server: &str,
    port: u16,
    bind_ip: IpAddr,
    timeout: Duration,
) -> Result<NatReport, StunError> {
    let mut config = TransportConfig::default();
    config.bind_ip = bind_ip;
    config.recv_timeout = timeout;

    let bind_addr = config.bind_addr();
    debug!("bind: {}, server: {}:{}", bind_addr, server, port);

    let transport = UdpTransport::new(config)?;
    let transactor = Transactor::new(transport, bind_addr);
    let mut classifier = NatClassifier::new(transactor, timeout);

    classifier.classify(server, port)
}

pub fn print_report(report: &NatReport) {
    println!("nat type: {:?}", report.nat_type);
    println!("p2p ok: {}", report.nat_type.traversable());

    match report.mapped_addr {
        Some(v) => println!("mapped address: {}", v),
        None => println!("mapped address: -"),
    }
    match report.local_addr {
        Some(v) => println!("local address: {}", v),
        None => println!("local address: -"),
    }
}
