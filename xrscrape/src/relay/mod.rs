//! Local port forwarding through a bastion host.
//!
//! ```text
//! [shell] -> [127.0.0.1:local_port] -> [direct-tcpip on bastion] -> [target:22]
//! ```
//!
//! The bastion connection is established eagerly so that an unreachable
//! bastion or bad credentials fail [`Relay::open`] rather than the first
//! connection through the relay.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace, warn};
use secrecy::SecretString;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};

use crate::error::{RelayError, Result};
use crate::transport::{AuthMethod, HostKeyVerification, SshConfig, SshTransport};

/// Where to listen and what to forward to.
#[derive(Debug)]
pub struct RelayConfig {
    pub bastion_host: String,
    pub bastion_port: u16,
    pub bastion_user: String,
    pub bastion_password: SecretString,

    /// Target as seen from the bastion.
    pub target_host: String,
    pub target_port: u16,

    /// Local listener address. Port 0 picks an ephemeral port.
    pub bind_addr: String,
    pub local_port: u16,

    /// Bound on the bastion connect and authentication.
    pub timeout: Duration,

    pub host_key_verification: HostKeyVerification,
}

impl RelayConfig {
    /// Relay to `target_host:22` on an ephemeral loopback port.
    pub fn new(
        bastion_host: impl Into<String>,
        bastion_user: impl Into<String>,
        bastion_password: SecretString,
        target_host: impl Into<String>,
    ) -> Self {
        Self {
            bastion_host: bastion_host.into(),
            bastion_port: 22,
            bastion_user: bastion_user.into(),
            bastion_password,
            target_host: target_host.into(),
            target_port: 22,
            bind_addr: "127.0.0.1".to_string(),
            local_port: 0,
            timeout: Duration::from_secs(30),
            host_key_verification: HostKeyVerification::default(),
        }
    }

    fn listen_addr(&self) -> std::result::Result<SocketAddr, RelayError> {
        let ip: IpAddr = self
            .bind_addr
            .parse()
            .map_err(|_| RelayError::InvalidBindAddress(self.bind_addr.clone()))?;
        Ok(SocketAddr::new(ip, self.local_port))
    }
}

/// Open relay. Closing consumes it.
pub struct Relay {
    local_addr: SocketAddr,
    target: String,
    transport: Arc<SshTransport>,
    accept_loop: JoinHandle<()>,
}

impl Relay {
    /// Connect to the bastion, bind the local listener and start forwarding.
    pub async fn open(config: RelayConfig) -> Result<Self> {
        let listen_addr = config.listen_addr()?;
        let RelayConfig {
            bastion_host,
            bastion_port,
            bastion_user,
            bastion_password,
            target_host,
            target_port,
            timeout,
            host_key_verification,
            ..
        } = config;

        let mut ssh = SshConfig::with_password(&bastion_host, bastion_port, bastion_user, bastion_password);
        ssh.timeout = timeout;
        ssh.host_key_verification = host_key_verification;

        let transport = SshTransport::connect(&ssh)
            .await
            .map_err(|source| RelayError::Bastion {
                host: bastion_host.clone(),
                port: bastion_port,
                source,
            })?;
        let transport = Arc::new(transport);

        let listener = TcpListener::bind(listen_addr)
            .await
            .map_err(|source| RelayError::Bind { addr: listen_addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| RelayError::Bind { addr: listen_addr, source })?;

        let target = format!("{target_host}:{target_port}");
        info!("relay {local_addr} -> {bastion_host}:{bastion_port} -> {target}");

        let accept_loop = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&transport),
            target_host,
            target_port,
        ));

        Ok(Self {
            local_addr,
            target,
            transport,
            accept_loop,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn local_port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Whether the bastion connection and the accept loop are still running.
    pub fn is_alive(&self) -> bool {
        self.transport.is_alive() && !self.accept_loop.is_finished()
    }

    /// Stop accepting, drop live forwards and disconnect from the bastion.
    pub async fn close(self) -> Result<()> {
        debug!("closing relay {} -> {}", self.local_addr, self.target);
        self.accept_loop.abort();
        self.transport.close().await?;
        Ok(())
    }
}

async fn accept_loop(
    listener: TcpListener,
    transport: Arc<SshTransport>,
    target_host: String,
    target_port: u16,
) {
    // Dropped with this task on abort, which aborts every forward it holds.
    let mut forwards = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    trace!("relay accepted {peer}");
                    forwards.spawn(forward(
                        stream,
                        peer,
                        Arc::clone(&transport),
                        target_host.clone(),
                        target_port,
                    ));
                }
                Err(e) => {
                    warn!("relay accept failed: {e}");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            },
            Some(_) = forwards.join_next(), if !forwards.is_empty() => {}
        }
    }
}

async fn forward(
    mut stream: TcpStream,
    peer: SocketAddr,
    transport: Arc<SshTransport>,
    target_host: String,
    target_port: u16,
) {
    let channel = match transport
        .open_direct_tcpip(&target_host, target_port, &peer.ip().to_string(), peer.port())
        .await
    {
        Ok(channel) => channel,
        Err(e) => {
            warn!("relay could not reach {target_host}:{target_port} for {peer}: {e}");
            return;
        }
    };

    let mut remote = channel.into_stream();
    match tokio::io::copy_bidirectional(&mut stream, &mut remote).await {
        Ok((sent, received)) => debug!("relay {peer} closed: {sent} bytes out, {received} bytes in"),
        Err(e) => debug!("relay {peer} ended: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RelayConfig::new("bastion.example.net", "ops", "pw".into(), "10.0.0.1");
        assert_eq!(config.bastion_port, 22);
        assert_eq!(config.target_port, 22);
        assert_eq!(config.local_port, 0);
        assert_eq!(config.listen_addr().unwrap(), "127.0.0.1:0".parse().unwrap());
    }

    #[test]
    fn test_invalid_bind_address() {
        let mut config = RelayConfig::new("bastion", "ops", "pw".into(), "10.0.0.1");
        config.bind_addr = "localhost:x".into();
        assert!(matches!(
            config.listen_addr(),
            Err(RelayError::InvalidBindAddress(addr)) if addr == "localhost:x"
        ));
    }

    #[tokio::test]
    async fn test_unreachable_bastion_is_relay_error() {
        // Port 1 on loopback refuses connections.
        let mut config = RelayConfig::new("127.0.0.1", "ops", "pw".into(), "10.0.0.1");
        config.bastion_port = 1;
        config.timeout = Duration::from_secs(5);
        let err = Relay::open(config).await.err().unwrap();
        assert!(matches!(err, crate::Error::Relay(RelayError::Bastion { port: 1, .. })));
    }
}
