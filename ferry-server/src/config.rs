use ferry_core::IceServerConfig;
use ferry_core::utils::DEFAULT_STUN_ADDR;
use std::net::SocketAddr;
use std::time::Duration;

/// Relay limits and listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub max_connections_per_ip: usize,
    pub max_users_per_room: usize,
    pub max_rooms: usize,
    pub max_room_id_len: usize,
    /// A socket that sends nothing for this long is closed.
    pub idle_timeout: Duration,
    /// Handed to every client on connect.
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_connections_per_ip: 10,
            max_users_per_room: 50,
            max_rooms: 1000,
            max_room_id_len: 64,
            idle_timeout: Duration::from_secs(300),
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned()],
                username: None,
                credential: None,
            }],
        }
    }
}
