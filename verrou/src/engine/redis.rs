use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client, Script};

use crate::{engine::Engine, error::Result};

// GET, compare and DEL in one server-side round trip. Two separate calls
// would race with expiry between them.
const RELEASE_SCRIPT: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
else
    return 0
end";

/// Redis lock backend over a multiplexed connection manager.
#[derive(Clone)]
pub struct Redis {
    connection: ConnectionManager,
}

impl Redis {
    /// Connects and verifies the server is reachable.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)?;
        let mut connection = client.get_connection_manager().await?;

        let _: () = redis::cmd("PING").query_async(&mut connection).await?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl Engine for Redis {
    async fn acquire(&self, key: &str, token: &str, ttl: Duration) -> Result<bool> {
        let mut connection = self.connection.clone();

        let set: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut connection)
            .await?;

        Ok(set.is_some())
    }

    async fn release(&self, key: &str, token: &str) -> Result<bool> {
        let mut connection = self.connection.clone();

        let deleted: i64 = Script::new(RELEASE_SCRIPT)
            .key(key)
            .arg(token)
            .invoke_async(&mut connection)
            .await?;

        Ok(deleted == 1)
    }

    async fn clear(&self, key: &str) -> Result<()> {
        let mut connection = self.connection.clone();

        let _: () = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut connection)
            .await?;

        Ok(())
    }
}
