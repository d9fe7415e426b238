use std::net::IpAddr;
use std::time::Duration;

use clap::{Arg, Command};
use log::{debug, error};

use client::client::{print_report, probe_nat};

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    env_logger::init();

    let app = Command::new(APP_NAME)
        .version(APP_VERSION)
        .about("a stun client for probing nat")
        .arg(
            Arg::new("server")
                .long("server")
                .takes_value(true)
                .required(true)
                .help("server host or ip"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .takes_value(true)
                .default_value("3478")
                .help("server port")
                .value_parser(clap::value_parser!(u16).range(1..65535)),
        )
        .arg(
            Arg::new("bind_ip")
                .long("bind_ip")
                .takes_value(true)
                .default_value("0.0.0.0")
                .help("local bind ip")
                .value_parser(clap::value_parser!(IpAddr)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .takes_value(true)
                .default_value("3000")
                .help("per test timeout, ms")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .get_matches();

    let server: &String = app.get_one("server").expect("wrong server");
    let port: u16 = *app.get_one("port").expect("wrong port");
    let bind_ip: IpAddr = *app.get_one("bind_ip").expect("wrong bind_ip");
    let timeout: u64 = *app.get_one("timeout").expect("wrong timeout");

    debug!("server: {}:{}, timeout: {}ms", server, port, timeout);

    match probe_nat(server, port, bind_ip, Duration::from_millis(timeout)) {
        Ok(v) => {
            print_report(&v);
        }
        Err(e) => {
            error!("error, probe_nat, {:?}", e);
            println!("probe fail: {:?}", e);
            std::process::exit(1);
        }
    }
}
