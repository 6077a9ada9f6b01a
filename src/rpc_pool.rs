use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use tonic::transport::{Channel, Endpoint};

type Dialer =
    Box<dyn Fn(String) -> BoxFuture<'static, Result<Channel, tonic::transport::Error>> + Send + Sync>;

/// One channel per RPC server address, dialed on first use and reused by
/// every later caller. Dialing is pluggable so tests can count and fake it.
pub struct Pool {
    conns: Mutex<HashMap<String, Channel>>,
    dialer: Dialer,
}

impl Pool {
    /// A pool that dials plaintext (the addresses in write plans are bare
    /// host:port) and connects lazily, so transport errors surface on the
    /// first call rather than here.
    pub fn new() -> Self {
        Self::with_dialer(Box::new(|address| {
            Box::pin(async move {
                let endpoint = Endpoint::from_shared(format!("http://{address}"))?
                    .connect_timeout(Duration::from_secs(5));
                Ok(endpoint.connect_lazy())
            })
        }))
    }

    pub fn with_dialer(dialer: Dialer) -> Self {
        Self {
            conns: Mutex::new(HashMap::new()),
            dialer,
        }
    }

    /// Returns the cached channel for `address`, dialing it first if needed.
    /// Channels are concurrency-safe and cheap to clone.
    pub async fn get_conn(&self, address: &str) -> Result<Channel, tonic::transport::Error> {
        if let Some(conn) = self.conns.lock().unwrap().get(address) {
            return Ok(conn.clone());
        }

        let conn = (self.dialer)(address.to_owned()).await?;

        // Two callers may race the first dial; the first insert wins so every
        // caller ends up sharing a single channel.
        let mut conns = self.conns.lock().unwrap();
        Ok(conns.entry(address.to_owned()).or_insert(conn).clone())
    }

    /// Drops every cached channel. tonic channels release their transport on
    /// drop and expose no fallible close step.
    pub fn close(&self) {
        self.conns.lock().unwrap().clear();
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let conns = self.conns.lock().unwrap();
        f.debug_struct("Pool").field("conns", &conns.len()).finish()
    }
}
