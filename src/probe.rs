//! Probe executor - performs one bounded HTTP request per check
//!
//! ## Timing telemetry
//!
//! Each probe builds its own client with two hooks that record latency samples:
//!
//! - a DNS resolver wrapper, timing hostname resolution
//! - a connector layer, timing connection establishment (TCP, plus the TLS
//!   handshake for https targets, which the client performs inside the same
//!   connector)
//!
//! Time to response headers is measured around the request itself. The body
//! is never read, so the probe ends when the headers arrive and that sample is
//! also the total elapsed time of a successful probe. Samples are logged at
//! DEBUG level and never influence the verdict.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tower::{Layer, Service};
use tracing::{debug, instrument, trace};

use crate::check::Check;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Latency samples collected while probing. Any sample may be missing when
/// the phase did not happen (pinned IP, failed connection, timeout).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeTimings {
    pub dns: Option<Duration>,
    pub connect: Option<Duration>,
    /// From sending the request to receiving the response headers. Equal to
    /// the probe's total elapsed time, since the body is not read.
    pub first_byte: Option<Duration>,
}

/// Verdict and telemetry of a single probe
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub success: bool,
    pub status: Option<u16>,
    pub elapsed: Duration,
    pub timings: ProbeTimings,
    pub error: Option<String>,
}

impl ProbeOutcome {
    fn failed(elapsed: Duration, timings: ProbeTimings, error: String) -> Self {
        ProbeOutcome {
            success: false,
            status: None,
            elapsed,
            timings,
            error: Some(error),
        }
    }
}

/// Executes one probe against a check.
///
/// Implementations must absorb transport failures and report them as
/// `success == false`; nothing a remote endpoint does may surface as an error.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, check: &Check) -> ProbeOutcome;
}

/// A probe is up when the endpoint answered 200 before the deadline
pub fn classify(status: u16, elapsed: Duration, timeout: Duration) -> bool {
    status == 200 && elapsed < timeout
}

/// HTTP prober with a fixed per-request deadline
#[derive(Debug, Clone)]
pub struct HttpProber {
    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build a single-use client wired to `timings`.
    ///
    /// Pooling is disabled so every probe opens (and measures) a fresh
    /// connection. Redirects are not followed: a redirect is not a 200.
    fn build_client(
        &self,
        check: &Check,
        timings: &Arc<TimingRecorder>,
    ) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .dns_resolver(Arc::new(TimedResolver {
                timings: Arc::clone(timings),
            }))
            .connector_layer(TimedConnectLayer {
                timings: Arc::clone(timings),
            });

        if let (Some(ip), Some(host)) = (check.ip, check.url.host_str()) {
            builder = builder.resolve(host, SocketAddr::new(ip, 0));
        }

        builder.build()
    }
}

#[async_trait]
impl Prober for HttpProber {
    #[instrument(skip_all, fields(check = %check.name))]
    async fn probe(&self, check: &Check) -> ProbeOutcome {
        debug!("sending {} {}", check.method, check.url);

        let timings = Arc::new(TimingRecorder::default());
        let client = match self.build_client(check, &timings) {
            Ok(client) => client,
            Err(e) => {
                return ProbeOutcome::failed(
                    Duration::ZERO,
                    ProbeTimings::default(),
                    format!("failed to build HTTP client: {e}"),
                );
            }
        };

        let mut request = client
            .request(check.method.clone(), check.url.clone())
            .headers(check.headers.clone());
        if let Some(body) = check.body.as_ref().filter(|_| check.sends_body()) {
            request = request.body(body.clone());
        }

        let start = Instant::now();
        let response = tokio::time::timeout(self.timeout, request.send()).await;
        let elapsed = start.elapsed();

        let outcome = match response {
            Ok(Ok(response)) => {
                timings.record(|t| t.first_byte = Some(elapsed));
                let status = response.status().as_u16();
                ProbeOutcome {
                    success: classify(status, elapsed, self.timeout),
                    status: Some(status),
                    elapsed,
                    timings: timings.snapshot(),
                    error: None,
                }
            }
            Ok(Err(e)) => ProbeOutcome::failed(
                elapsed,
                timings.snapshot(),
                format!("request failed: {e}"),
            ),
            Err(_) => ProbeOutcome::failed(
                elapsed,
                timings.snapshot(),
                format!("no response within {:?}", self.timeout),
            ),
        };

        debug!(
            dns = ?outcome.timings.dns,
            connect = ?outcome.timings.connect,
            first_byte = ?outcome.timings.first_byte,
            tls = check.url.scheme() == "https",
            "probe timings"
        );
        match &outcome.error {
            Some(error) => debug!(success = false, elapsed = ?outcome.elapsed, "{error}"),
            None => debug!(
                success = outcome.success,
                status = ?outcome.status,
                elapsed = ?outcome.elapsed,
                "probe finished"
            ),
        }

        outcome
    }
}

/// Shared sink for the samples of one probe
#[derive(Debug, Default)]
struct TimingRecorder {
    samples: Mutex<ProbeTimings>,
}

impl TimingRecorder {
    fn record(&self, update: impl FnOnce(&mut ProbeTimings)) {
        if let Ok(mut samples) = self.samples.lock() {
            update(&mut samples);
        }
    }

    fn snapshot(&self) -> ProbeTimings {
        self.samples
            .lock()
            .map(|samples| *samples)
            .unwrap_or_default()
    }
}

/// System resolver that records how long resolution took
struct TimedResolver {
    timings: Arc<TimingRecorder>,
}

impl Resolve for TimedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let timings = Arc::clone(&self.timings);
        Box::pin(async move {
            let start = Instant::now();
            let addrs: Vec<SocketAddr> = tokio::net::lookup_host((name.as_str(), 0))
                .await?
                .collect();
            let took = start.elapsed();
            trace!("resolved {} in {took:?}", name.as_str());
            timings.record(|t| t.dns = Some(took));

            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok::<Addrs, BoxError>(addrs)
        })
    }
}

/// Connector layer that records how long establishing a connection took
#[derive(Clone)]
struct TimedConnectLayer {
    timings: Arc<TimingRecorder>,
}

impl<S> Layer<S> for TimedConnectLayer {
    type Service = TimedConnect<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimedConnect {
            inner,
            timings: Arc::clone(&self.timings),
        }
    }
}

#[derive(Clone)]
struct TimedConnect<S> {
    inner: S,
    timings: Arc<TimingRecorder>,
}

impl<S, R> Service<R> for TimedConnect<S>
where
    S: Service<R> + 'static,
    S::Future: Send + 'static,
    S::Response: 'static,
    S::Error: 'static,
    R: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: R) -> Self::Future {
        let timings = Arc::clone(&self.timings);
        let start = Instant::now();
        let connecting = self.inner.call(req);

        Box::pin(async move {
            let connection = connecting.await;
            if connection.is_ok() {
                let took = start.elapsed();
                trace!("connected in {took:?}");
                timings.record(|t| t.connect = Some(took));
            }
            connection
        })
    }
}
