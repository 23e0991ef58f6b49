//! Managed outbound channel with the fixed interceptor pipeline.
//!
//! Every unary call goes through **retry ∘ logging ∘ transport**, in that
//! order. Logging is the innermost stage, so each physical attempt is
//! independently logged: a call that succeeds on its third attempt leaves
//! three payload-sent records, not one. Callers and tests must expect this;
//! it is a design choice, not an accident of construction.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::{ClientConfig, RetryPolicy};
use crate::status::{Code, RpcError};
use crate::transport::{HttpTransport, Transport};

/// A long-lived connection to one downstream service.
///
/// Safe for concurrent use by many callers after construction. Retries and
/// backoff sleeps run serially inside each logical call's own task; nothing
/// is spawned in the background, so dropping the call future cancels any
/// in-flight attempt and pending sleep.
pub struct Channel {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    timeout: std::time::Duration,
    closed: AtomicBool,
}

impl Channel {
    /// Build a channel over the production HTTP transport.
    pub fn connect(cfg: &ClientConfig) -> Result<Self, RpcError> {
        let transport = HttpTransport::new(cfg)?;
        let policy = RetryPolicy::default().with_retries(cfg.retries);

        Ok(Self::with_transport(Arc::new(transport), policy, cfg.timeout()))
    }

    /// Build a channel over an arbitrary transport (fault injection, tests).
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        policy: RetryPolicy,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            transport,
            policy,
            timeout,
            closed: AtomicBool::new(false),
        }
    }

    /// Release the channel. Further calls fail with `Cancelled`; a second
    /// close is an error (no revival, no double release).
    pub fn close(&self) -> Result<(), RpcError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(RpcError::new(Code::Cancelled, "channel already closed"));
        }
        debug!("channel closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Issue a unary call through the interceptor pipeline.
    pub async fn unary<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, RpcError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_value(request)
            .map_err(|e| RpcError::new(Code::Internal, format!("encode failed: {e}")))?;

        let value = self.retrying_call(method, &body).await?;

        serde_json::from_value(value)
            .map_err(|e| RpcError::new(Code::Internal, format!("decode failed: {e}")))
    }

    /// Retry stage: re-issues the logged call on retryable status classes,
    /// with exponential backoff, up to the configured budget. Non-retryable
    /// classes and budget exhaustion surface the last error unchanged.
    async fn retrying_call(&self, method: &str, body: &Value) -> Result<Value, RpcError> {
        let mut attempt: u32 = 0;

        loop {
            if self.is_closed() {
                return Err(RpcError::new(Code::Cancelled, "channel is closed"));
            }

            match self.logged_call(method, body, attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if self.policy.should_retry(e.code) && attempt < self.policy.retries => {
                    let delay = self.policy.backoff(attempt);
                    debug!(
                        method,
                        attempt,
                        code = %e.code,
                        delay_ms = delay.as_millis() as u64,
                        "retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Logging stage: closest to the wire, so every physical attempt is
    /// recorded. Applies the per-attempt deadline around the transport.
    async fn logged_call(
        &self,
        method: &str,
        body: &Value,
        attempt: u32,
    ) -> Result<Value, RpcError> {
        debug!(method, attempt, "payload sent");

        let result = match tokio::time::timeout(self.timeout, self.transport.send(method, body))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(RpcError::new(
                Code::DeadlineExceeded,
                format!("deadline of {:?} exceeded", self.timeout),
            )),
        };

        match &result {
            Ok(_) => debug!(method, attempt, "payload received"),
            Err(e) => debug!(method, attempt, code = %e.code, "call failed"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::fmt;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    /// Fails with `code` for the first `failures` attempts, then succeeds.
    struct ScriptedTransport {
        code: Code,
        failures: u32,
        attempts: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(code: Code, failures: u32) -> Arc<Self> {
            Arc::new(Self {
                code,
                failures,
                attempts: AtomicU32::new(0),
            })
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, _method: &str, _body: &Value) -> Result<Value, RpcError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(RpcError::new(self.code, "scripted failure"))
            } else {
                Ok(serde_json::json!({"ok": true}))
            }
        }
    }

    fn test_channel(transport: Arc<dyn Transport>, retries: u32) -> Channel {
        let policy = RetryPolicy::default()
            .with_retries(retries)
            .with_backoff_base(Duration::from_millis(1));
        Channel::with_transport(transport, policy, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn retryable_failure_is_retried_until_success() {
        let transport = ScriptedTransport::new(Code::NotFound, 2);
        let channel = test_channel(transport.clone(), 3);

        let value: Value = channel.unary("test/method", &serde_json::json!({})).await.unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test]
    async fn retry_budget_exhaustion_surfaces_last_error() {
        let transport = ScriptedTransport::new(Code::Aborted, u32::MAX);
        let channel = test_channel(transport.clone(), 2);

        let err = channel
            .unary::<_, Value>("test/method", &serde_json::json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.code, Code::Aborted);
        // retries + 1 physical attempts.
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test]
    async fn non_retryable_failure_is_attempted_once() {
        let transport = ScriptedTransport::new(Code::Internal, u32::MAX);
        let channel = test_channel(transport.clone(), 5);

        let err = channel
            .unary::<_, Value>("test/method", &serde_json::json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.code, Code::Internal);
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn fewer_failures_than_budget_uses_minimum_attempts() {
        // N consecutive failures with budget > N: exactly N+1 attempts.
        let transport = ScriptedTransport::new(Code::DeadlineExceeded, 1);
        let channel = test_channel(transport.clone(), 10);

        let _: Value = channel.unary("test/method", &serde_json::json!({})).await.unwrap();
        assert_eq!(transport.attempts(), 2);
    }

    /// Collects event messages so the per-attempt log cadence can be
    /// asserted on directly.
    #[derive(Clone, Default)]
    struct CapturedMessages(Arc<Mutex<Vec<String>>>);

    impl CapturedMessages {
        fn count(&self, message: &str) -> usize {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.as_str() == message)
                .count()
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for CapturedMessages {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            struct MessageVisitor(Option<String>);

            impl Visit for MessageVisitor {
                fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                    if field.name() == "message" {
                        self.0 = Some(format!("{value:?}"));
                    }
                }
            }

            let mut visitor = MessageVisitor(None);
            event.record(&mut visitor);
            if let Some(message) = visitor.0 {
                self.0.lock().unwrap().push(message);
            }
        }
    }

    #[tokio::test]
    async fn each_physical_attempt_emits_one_send_record() {
        let messages = CapturedMessages::default();
        let subscriber = tracing_subscriber::registry().with(messages.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let transport = ScriptedTransport::new(Code::NotFound, 2);
        let channel = test_channel(transport.clone(), 3);

        let _: Value = channel.unary("test/method", &serde_json::json!({})).await.unwrap();

        // Logging sits inside retry, so success on the third attempt leaves
        // three send records, two failure records, and one receive record.
        assert_eq!(transport.attempts(), 3);
        assert_eq!(messages.count("payload sent"), 3);
        assert_eq!(messages.count("call failed"), 2);
        assert_eq!(messages.count("payload received"), 1);
    }

    struct HangingTransport;

    #[async_trait]
    impl Transport for HangingTransport {
        async fn send(&self, _method: &str, _body: &Value) -> Result<Value, RpcError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    #[tokio::test]
    async fn per_attempt_deadline_maps_to_deadline_exceeded() {
        let policy = RetryPolicy::default()
            .with_retries(1)
            .with_backoff_base(Duration::from_millis(1));
        let channel =
            Channel::with_transport(Arc::new(HangingTransport), policy, Duration::from_millis(10));

        let err = channel
            .unary::<_, Value>("test/method", &serde_json::json!({}))
            .await
            .unwrap_err();

        // DeadlineExceeded is retryable, so the budget was spent first.
        assert_eq!(err.code, Code::DeadlineExceeded);
    }

    #[tokio::test]
    async fn closed_channel_rejects_calls() {
        let transport = ScriptedTransport::new(Code::NotFound, 0);
        let channel = test_channel(transport.clone(), 3);

        channel.close().unwrap();

        let err = channel
            .unary::<_, Value>("test/method", &serde_json::json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.code, Code::Cancelled);
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn double_close_is_an_error() {
        let transport = ScriptedTransport::new(Code::NotFound, 0);
        let channel = test_channel(transport, 0);

        channel.close().unwrap();
        assert!(channel.close().is_err());
    }
}
