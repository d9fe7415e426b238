// ./stunserver --ip 1.2.3.4 --port 3478 --changed_ip 1.2.3.5 --changed_port 3479

use log::{debug, error, info};
use std::net::{IpAddr, SocketAddr};

use clap::builder::ValueParser;
use clap::{Arg, Command};
use tokio::sync::watch;

use server::server::Server;
use server::signal::wait_shutdown;

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn parse_ip(s: &str) -> Result<IpAddr, String> {
    let ip = match s.parse::<IpAddr>() {
        Ok(v) => v,
        Err(e) => {
            return Err(format!("{}", e));
        }
    };
    // 不能是 0.0.0.0
    match ip {
        IpAddr::V4(ip) => {
            let value = u32::from_be_bytes(ip.octets());
            if value == 0 {
                return Err("0.0.0.0 not allow".to_string());
            }
        }
        IpAddr::V6(_) => {
            return Err("ipv6 not support".to_string());
        }
    }

    Ok(ip)
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let app = Command::new(APP_NAME)
        .version(APP_VERSION)
        .about("a small stun server")
        .arg(
            Arg::new("ip")
                .long("ip")
                .takes_value(true)
                .required(true)
                .help("bind ip")
                .value_parser(ValueParser::new(parse_ip)),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .takes_value(true)
                .default_value("3478")
                .help("bind port")
                .value_parser(clap::value_parser!(u16).range(1..65535)),
        )
        .arg(
            Arg::new("changed_ip")
                .long("changed_ip")
                .takes_value(true)
                .required(true)
                .help("alternate ip reported in changed-address")
                .value_parser(ValueParser::new(parse_ip)),
        )
        .arg(
            Arg::new("changed_port")
                .long("changed_port")
                .takes_value(true)
                .default_value("3479")
                .help("alternate port reported in changed-address")
                .value_parser(clap::value_parser!(u16).range(1..65535)),
        )
        .get_matches();

    //
    let ip: IpAddr = *app.get_one("ip").expect("wrong ip");
    let port: u16 = *app.get_one("port").expect("wrong port");

    let changed_ip: IpAddr = *app.get_one("changed_ip").expect("wrong changed_ip");
    let changed_port: u16 = *app.get_one("changed_port").expect("wrong changed_port");

    if ip == changed_ip && port == changed_port {
        panic!("error, changed address equal bind address");
    }

    debug!("ip:{}:{}  changed:{}:{}", ip, port, changed_ip, changed_port);

    let bind_addr = SocketAddr::new(ip, port);
    let changed_addr = SocketAddr::new(changed_ip, changed_port);

    let (signal_tx, signal_rx) = watch::channel(0_u8);

    let _signal_handle = tokio::spawn(async move {
        wait_shutdown().await;
        match signal_tx.send(1) {
            Ok(_) => {}
            Err(e) => {
                error!("error, {:?}", e);
            }
        };
    });

    let server = match Server::new(bind_addr, changed_addr, signal_rx).await {
        Ok(v) => v,
        Err(e) => {
            panic!("error, {:?}", e);
        }
    };

    let server_handle = tokio::spawn(async move {
        server.run().await;
    });

    info!("start server ...");

    let _ = server_handle.await;

    println!("end.");
}
