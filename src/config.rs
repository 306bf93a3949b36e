//! # config — อ่าน Config จาก Environment Variables
//!
//! | Variable       | Default   | Description                              |
//! |----------------|-----------|------------------------------------------|
//! | `HOST`         | `0.0.0.0` | Bind host                                |
//! | `PORT`         | `3000`    | Listen port                              |
//! | `EVENT_BUFFER` | `256`     | Monitor broadcast channel capacity       |

use std::net::{IpAddr, SocketAddr};

use anyhow::{ensure, Context};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// จำนวน Event ที่ค้างใน broadcast channel ได้ก่อน client ที่อ่านช้าจะ lag
    pub event_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source (env in production,
    /// a closure over a map in tests).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host_str = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host_str
            .trim()
            .parse()
            .with_context(|| format!("HOST must be an IP address, got '{host_str}'"))?;

        let port = match lookup("PORT") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a number in 0-65535, got '{v}'"))?,
            None => DEFAULT_PORT,
        };

        let event_buffer: usize = match lookup("EVENT_BUFFER") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("EVENT_BUFFER must be a number, got '{v}'"))?,
            None => DEFAULT_EVENT_BUFFER,
        };
        ensure!(event_buffer > 0, "EVENT_BUFFER must be greater than zero");

        Ok(Self { host, port, event_buffer })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
