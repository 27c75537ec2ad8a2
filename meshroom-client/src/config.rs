use meshroom_core::IceServerConfig;

/// Client-side settings for one room session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket URL of the relay, e.g. `ws://localhost:3000/ws`.
    pub relay_url: String,
    /// Used until the relay sends its own `ice-config`.
    pub ice_servers: Vec<IceServerConfig>,
}

impl SessionConfig {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            ice_servers: IceServerConfig::default_stun(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new("ws://127.0.0.1:3000/ws")
    }
}
