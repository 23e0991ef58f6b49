//! Typed client handles over a managed channel.

use std::sync::Arc;

use tracing::debug;

use crate::channel::Channel;
use crate::config::ClientConfig;
use crate::proto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::status::RpcError;

/// A typed client plus the channel it calls through.
///
/// `close` must be called exactly once to release the transport; all calls
/// made after that fail.
pub struct RpcClient<T> {
    pub api: T,
    channel: Arc<Channel>,
}

impl<T> RpcClient<T> {
    /// Release the underlying channel.
    pub fn close(&self) -> Result<(), RpcError> {
        self.channel.close()
    }
}

/// Build a managed connection to a remote service and wrap it in a typed
/// client produced by `maker`.
///
/// Generic over the client type so one builder serves every downstream;
/// `maker` receives the shared channel and constructs the service-specific
/// API surface.
pub fn connect<T>(
    cfg: &ClientConfig,
    maker: impl FnOnce(Arc<Channel>) -> T,
) -> Result<RpcClient<T>, RpcError> {
    let channel = Arc::new(Channel::connect(cfg)?);

    debug!(address = %cfg.address, retries = cfg.retries, "rpc channel established");

    Ok(RpcClient {
        api: maker(channel.clone()),
        channel,
    })
}

/// Typed client for the auth service.
pub struct AuthClient {
    channel: Arc<Channel>,
}

impl AuthClient {
    pub fn new(channel: Arc<Channel>) -> Self {
        Self { channel }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, RpcError> {
        self.channel.unary("v1/auth/login", request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, RpcError> {
        self.channel.unary("v1/auth/register", request).await
    }
}
