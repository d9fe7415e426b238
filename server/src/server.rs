/*
绑定1个 socket
一个mpsc 收集数据, 记录源地址, 数据buf=32k
处理完成后从同一个socket发回 (不支持change标志换源地址)
一个退出watch
外部reactor可以绕过run, 直接驱动Responder
*/

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::watch::Receiver as WatchReceiver;

use bytes::Bytes;
use log::{debug, error};

use stun3489::constants::{ERROR_CODE_BAD_REQUEST, METHOD_BINDING, METHOD_SHARED_SECRET};
use stun3489::error::{StunError, PROTO_NO_HANDLER};
use stun3489::handlers::{error_response, BindingHandler, SharedSecretHandler};
use stun3489::packet::Packet;
use stun3489::router::MessageRouter;
use stun3489::util::print_bytes;

// remote addr, recv data
type SocketInput = (SocketAddr, Bytes);

// 解码 -> 分发 -> 编码
// 不关心由哪种循环驱动
pub struct Responder {
    router: MessageRouter,
}

impl Responder {
    pub fn new(local_addr: SocketAddr, changed_addr: SocketAddr) -> Self {
        let router = MessageRouter::new()
            .register_handler(
                METHOD_BINDING,
                Box::new(BindingHandler::new(changed_addr).with_source_addr(local_addr)),
            )
            .register_handler(METHOD_SHARED_SECRET, Box::new(SharedSecretHandler));

        Self { router }
    }

    pub fn with_router(router: MessageRouter) -> Self {
        Self { router }
    }

    pub fn respond(&self, buf: Bytes, remote_addr: SocketAddr) -> Option<Bytes> {
        let request = match Packet::unpack(buf) {
            Ok(v) => v,
            Err(e) => {
                error!("parse error, from remote:{}, {:?}", remote_addr, e);
                return None;
            }
        };

        if let Some(e) = request.validate() {
            error!("validate error, from remote:{}, {:?}", remote_addr, e);

            let response = error_response(&request, ERROR_CODE_BAD_REQUEST, "bad request");
            return Some(response.pack());
        }

        match self.router.route_message(&request, remote_addr) {
            Ok(Some(response)) => Some(response.pack()),
            Ok(None) => None,
            // method没注册handler时回400
            Err(StunError::Protocol(e)) if e.code == PROTO_NO_HANDLER => {
                error!("no handler, from remote:{}, {}", remote_addr, e.msg);

                let response = error_response(&request, ERROR_CODE_BAD_REQUEST, "bad request");
                Some(response.pack())
            }
            Err(e) => {
                error!("route error, from remote:{}, {:?}", remote_addr, e);
                None
            }
        }
    }
}

//--------------------------------------------------

pub struct Server {
    responder: Arc<Responder>,
    socket: Arc<UdpSocket>,
    signal_rx: WatchReceiver<u8>,
    queue_tx: Arc<Sender<SocketInput>>,
    queue_rx: Receiver<SocketInput>,
}

impl Server {
    pub async fn new(
        bind_addr: SocketAddr,
        changed_addr: SocketAddr,
        signal_rx: WatchReceiver<u8>,
    ) -> io::Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await?;
        let local_addr = socket.local_addr()?;
        debug!("listening: {:?}", local_addr);

        let (queue_tx, queue_rx) = mpsc::channel::<SocketInput>(100);

        let server = Self {
            responder: Arc::new(Responder::new(local_addr, changed_addr)),
            socket: Arc::new(socket),
            signal_rx,
            queue_tx: Arc::new(queue_tx),
            queue_rx,
        };
        Ok(server)
    }

    pub async fn run(self) {
        let mut handles = vec![];

        let socket = self.socket.clone();
        let sender = self.queue_tx.clone();
        let signal_rx = self.signal_rx.clone();

        let h = tokio::spawn(async move {
            recv_udp(socket, sender, signal_rx).await;
        });
        handles.push(h);

        let h = tokio::spawn(async move {
            process_udp(self.queue_rx, self.signal_rx, self.socket, self.responder).await;
        });
        handles.push(h);

        for v in handles {
            let _ = v.await;
        }
    }
}

//--------------------------------------------------

async fn recv_udp(
    socket: Arc<UdpSocket>,
    sender: Arc<Sender<SocketInput>>,
    mut signal_rx: WatchReceiver<u8>,
) {
    let mut buf = vec![0u8; 32 * 1024];

    loop {
        tokio::select! {
            Ok((len,remote_addr)) = socket.recv_from(&mut buf) => {
                let data = Bytes::copy_from_slice(&buf[..len]);

                debug!("recv len: {}", data.len());
                debug!("<--- {}\n{}",remote_addr,print_bytes(&data," ",8));

                match sender.send((remote_addr,data)).await {
                    Ok(_) => {}
                    Err(e) => {
                        error!("error, recv_udp, {:?}",e);
                    }
                };
            },
             _ = signal_rx.changed() => {
                debug!("recv signal, recv_udp will exit.");
                break;
            }
        }
    }
}

async fn process_udp(
    mut receiver: Receiver<SocketInput>,
    mut signal_rx: WatchReceiver<u8>,
    socket: Arc<UdpSocket>,
    responder: Arc<Responder>,
) {
    loop {
        tokio::select! {
            Some(input) = receiver.recv() => {
               process_one(input,&socket,&responder).await;
            },
             _ = signal_rx.changed() => {
                debug!("recv signal, process_input will exit.");
                break;
            }
        }
    }
}

async fn process_one(input: SocketInput, socket: &UdpSocket, responder: &Responder) {
    let (remote_addr, buf) = input;

    let data = match responder.respond(buf, remote_addr) {
        Some(v) => v,
        None => {
            return;
        }
    };

    match socket.send_to(&data, remote_addr).await {
        Ok(v) => {
            debug!("---> {}\n{}", remote_addr, print_bytes(&data, " ", 8));
            debug!("sent: {}", v);
        }
        Err(e) => {
            error!("error, ---> {}, {:?}", remote_addr, e);
        }
    };
}
