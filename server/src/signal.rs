use log::debug;

// 等到ctrl_c或者SIGTERM就返回, 由main把退出信号广播出去

#[cfg(windows)]
pub async fn wait_shutdown() {
    match tokio::signal::ctrl_c().await {
        Ok(_) => {
            debug!("recv ctrl_c, stunserver shutdown")
        }
        Err(e) => {
            debug!("error, ctrl_c, {:?}", e);
        }
    }
}

#[cfg(unix)]
pub async fn wait_shutdown() {
    use tokio::signal::unix::SignalKind;

    async fn terminate() -> std::io::Result<()> {
        let mut signal = match tokio::signal::unix::signal(SignalKind::terminate()) {
            Ok(v) => v,
            Err(e) => {
                debug!("error, signal, {:?}", e);
                return Err(e);
            }
        };

        let _ = signal.recv().await;
        Ok(())
    }

    tokio::select! {
        s = terminate() => {
            debug!("recv terminate signal, stunserver shutdown, {:?}",s);
        },
        s = tokio::signal::ctrl_c() => {
            debug!("recv ctrl_c signal, stunserver shutdown, {:?}",s);
        }
    }
}
