use anyhow::{Context, Result};
use meshroom_core::IceServerConfig;
use std::env;
use std::net::SocketAddr;

const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    /// Handed to every client in its `ice-config` frame.
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ice_servers: IceServerConfig::default_stun(),
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        let bind = env::var("MESHROOM_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_owned());
        let bind_addr = bind
            .parse()
            .with_context(|| format!("MESHROOM_BIND is not a socket address: {bind}"))?;

        let mut ice_servers = IceServerConfig::default_stun();
        if let Ok(turn_url) = env::var("TURN_URL") {
            ice_servers.push(IceServerConfig {
                urls: vec![turn_url],
                username: env::var("TURN_USERNAME").ok(),
                credential: env::var("TURN_CREDENTIAL").ok(),
            });
        }

        Ok(Self {
            bind_addr,
            ice_servers,
        })
    }
}
