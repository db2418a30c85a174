//! `SessionKeeper` builder and engine loop.
//!
//! This is the entry point for running a keeper. It ties together all the
//! layers: transport → protocol → cipher → session → beat, and owns the
//! select loop that multiplexes probe beats, heartbeat beats, and
//! cancellation.

use std::time::Duration;

use portkeep_beat::BeatScheduler;
use portkeep_cipher::{CipherSuite, PlainSuite};
use portkeep_protocol::{Codec, PortalResponse, XmlCodec};
use portkeep_session::{generate_run_tag, KeeperConfig, Session, SessionPhase};
use portkeep_transport::{HttpTransport, RequestExecutor, TransportOptions};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, trace, warn, Instrument};

use crate::handshake::{self, AuthOutcome};
use crate::policy::{self, Containment, Op};
use crate::KeeperError;

/// The well-known probe endpoint. A `204 No Content` from here means the
/// network is open; a redirect means a portal is interposing itself.
pub const PROBE_URL: &str = "http://connect.rom.miui.com/generate_204";

/// Heartbeat cadence used when the auth reply does not advertise one. The
/// first heartbeat reply replaces it.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Deadline on the terminate POST, so logout can never stall shutdown.
pub const LOGOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// What one probe discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeOutcome {
    /// 204: traffic flows, nothing to do.
    Open,
    /// A portal interposed itself; a handshake was attempted.
    Portal,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for a keeper on the default stack.
///
/// # Example
///
/// ```rust,no_run
/// use portkeep::prelude::*;
///
/// # async fn run(config: KeeperConfig) -> Result<(), KeeperError> {
/// let mut keeper = KeeperBuilder::new(config).build()?;
/// keeper.run().await;
/// # Ok(())
/// # }
/// ```
pub struct KeeperBuilder {
    config: KeeperConfig,
    request_timeout: Option<Duration>,
}

impl KeeperBuilder {
    /// Creates a builder for `config`.
    pub fn new(config: KeeperConfig) -> Self {
        Self {
            config,
            request_timeout: None,
        }
    }

    /// Bounds every portal request instead of trusting the LAN to answer.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds a keeper with the reqwest transport, the XML codec, and the
    /// plain cipher suite.
    ///
    /// # Errors
    ///
    /// Fails when the config has empty credentials or the HTTP client
    /// cannot be constructed. Both are fatal: no keeper is created.
    pub fn build(self) -> Result<SessionKeeper<HttpTransport, XmlCodec, PlainSuite>, KeeperError> {
        let options = TransportOptions {
            bind_interface: self.config.bind_interface.clone(),
            proxy_url: self.config.proxy_url.clone(),
            timeout: self.request_timeout,
        };
        let executor = match HttpTransport::new(options) {
            Ok(executor) => executor,
            Err(err) => {
                let err = KeeperError::from(err);
                policy::apply(Op::Construct, &err);
                return Err(err);
            }
        };
        SessionKeeper::with_parts(self.config, executor, XmlCodec, PlainSuite)
    }
}

// ---------------------------------------------------------------------------
// SessionKeeper
// ---------------------------------------------------------------------------

/// The session engine: one keeper per portal session, driven by
/// [`run()`](Self::run).
///
/// The keeper exclusively owns its [`Session`]; the only external control
/// surface is the [`CancellationToken`]. Everything the loop does funnels
/// through one task, so no field needs a lock.
pub struct SessionKeeper<E: RequestExecutor, C: Codec, S: CipherSuite> {
    config: KeeperConfig,
    executor: E,
    codec: C,
    suite: S,
    session: Session,
    run_tag: String,
    cancel: CancellationToken,
    /// Paces probes: poll interval normally, retry interval after a failed
    /// probe, disabled when the retry policy is "never".
    pacer: BeatScheduler,
    /// Armed only while a session is live, at the portal-advertised cadence.
    heartbeat: BeatScheduler,
}

impl<E, C, S> SessionKeeper<E, C, S>
where
    E: RequestExecutor,
    C: Codec,
    S: CipherSuite,
{
    /// Creates a new builder.
    pub fn builder(config: KeeperConfig) -> KeeperBuilder {
        KeeperBuilder::new(config)
    }

    /// Assembles a keeper from explicitly chosen parts.
    ///
    /// This is the constructor for custom stacks: a different executor, a
    /// different wire format, or a real cipher suite.
    ///
    /// # Errors
    ///
    /// Fails when the config does not validate.
    pub fn with_parts(
        config: KeeperConfig,
        executor: E,
        codec: C,
        suite: S,
    ) -> Result<Self, KeeperError> {
        let config = match config.validated() {
            Ok(config) => config,
            Err(err) => {
                let err = KeeperError::from(err);
                policy::apply(Op::Construct, &err);
                return Err(err);
            }
        };
        let session = Session::new(&config);

        Ok(Self {
            config,
            executor,
            codec,
            suite,
            session,
            run_tag: generate_run_tag(),
            cancel: CancellationToken::new(),
            pacer: BeatScheduler::disabled("probe"),
            heartbeat: BeatScheduler::disabled("heartbeat"),
        })
    }

    /// A handle that stops the keeper when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Read-only view of the session this keeper maintains.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.session.phase
    }

    /// Whether the probe pacer has a scheduled beat.
    pub fn pacer_armed(&self) -> bool {
        self.pacer.is_armed()
    }

    /// Whether the heartbeat has a scheduled beat.
    pub fn heartbeat_armed(&self) -> bool {
        self.heartbeat.is_armed()
    }

    /// The heartbeat cadence currently in effect, if any.
    pub fn heartbeat_period(&self) -> Option<Duration> {
        self.heartbeat.period()
    }

    /// Runs the keeper until its token is cancelled.
    ///
    /// Probes immediately, then multiplexes pacer beats, heartbeat beats,
    /// and cancellation. On the way out, for any reason, both schedulers
    /// are stopped and logout runs exactly once. A keeper that has logged
    /// out refuses to run again.
    pub async fn run(&mut self) {
        if self.session.phase.is_terminal() {
            warn!("keeper already logged out, refusing to run again");
            return;
        }

        let span = info_span!(
            "keeper",
            tag = %self.run_tag,
            user = %self.config.username,
            bind = self.config.bind_display(),
        );
        self.run_inner().instrument(span).await;
    }

    async fn run_inner(&mut self) {
        info!(
            poll_ms = self.config.check_interval_ms,
            retry_ms = self.config.retry_interval_ms,
            "session keeper started"
        );

        // First probe fires right away; failures only affect pacing.
        self.probe_and_pace().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("cancellation requested");
                    break;
                }
                _ = self.pacer.wait_for_beat() => {
                    self.probe_and_pace().await;
                }
                beat = self.heartbeat.wait_for_beat() => {
                    match self.send_heartbeat().await {
                        Ok(()) => info!(beat = beat.beat, "heartbeat sent"),
                        Err(err) => {
                            policy::apply(Op::Heartbeat, &err);
                        }
                    }
                }
            }
        }

        self.heartbeat.disarm();
        self.pacer.disarm();
        self.logout().await;
        self.session.set_phase(SessionPhase::LoggedOut);
        info!("session keeper stopped");
    }

    /// One probe cycle: check the network, then schedule the next probe.
    ///
    /// The pacer re-arms with the poll interval after any answered probe and
    /// with the retry interval after a failed one. A "never retry" interval
    /// leaves the pacer disabled, and the keeper waits for cancellation.
    async fn probe_and_pace(&mut self) {
        let outcome = match self.check_network().await {
            Ok(outcome) => outcome,
            Err(err) => {
                if policy::apply(Op::Probe, &err) == Containment::LogAndRetryNextBeat {
                    self.pacer.rearm(self.config.retry_interval());
                }
                return;
            }
        };
        if outcome == ProbeOutcome::Open {
            trace!("probe answered, network open");
        }
        self.pacer.rearm(self.config.poll_interval());
    }

    /// Probes the well-known endpoint and reacts to what it says.
    ///
    /// A redirect disarms the heartbeat before anything else: the moment a
    /// portal interposes itself, the old grant is stale and heartbeats to it
    /// are noise, even if the handshake that follows fails.
    async fn check_network(&mut self) -> Result<ProbeOutcome, KeeperError> {
        let reply = self.executor.get(PROBE_URL).await?;

        if reply.is_no_content() {
            return Ok(ProbeOutcome::Open);
        }

        if reply.is_redirect() {
            self.heartbeat.disarm();
            let location = reply.location.ok_or(KeeperError::MissingLocation)?;
            let target = handshake::parse_redirect(&location)?;
            info!(origin = %target.origin, "authentication required");
            self.handle_redirect(target).await;
            return Ok(ProbeOutcome::Portal);
        }

        Err(KeeperError::UnexpectedStatus(reply.status))
    }

    /// Attempts the handshake. A failed handshake is contained here: the
    /// session stays unauthenticated and the next probe retries.
    async fn handle_redirect(&mut self, target: handshake::RedirectTarget) {
        self.session.set_phase(SessionPhase::Authenticating);
        let result = handshake::authenticate(
            &self.executor,
            &self.codec,
            &self.suite,
            &self.config,
            &self.session,
            target,
        )
        .await;

        match result {
            Ok(outcome) => self.commit(outcome),
            Err(err) => {
                policy::apply(Op::Authenticate, &err);
                self.session.set_phase(SessionPhase::Unauthenticated);
            }
        }
    }

    /// Applies a successful handshake to the session in one move and arms
    /// the heartbeat.
    fn commit(&mut self, outcome: AuthOutcome) {
        if let Some(ip) = outcome.user_ip {
            self.session.user_ip = ip;
        }
        if let Some(ip) = outcome.ac_ip {
            self.session.ac_ip = ip;
        }
        self.session.ticket = Some(outcome.ticket);
        self.session.algo_id = outcome.algo_id;
        self.session.endpoints = Some(outcome.endpoints);
        self.session.cipher = Some(outcome.cipher);
        self.session.set_phase(SessionPhase::Authenticated);

        let interval = outcome
            .heartbeat_interval
            .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL);
        self.heartbeat.rearm(interval);
        info!(interval_secs = interval.as_secs(), "authentication finished");
    }

    /// One heartbeat: seal and POST the state document, read the verdict,
    /// adopt the advertised cadence.
    ///
    /// Any failure leaves the previous cadence in effect: the scheduler
    /// already re-armed itself when the beat fired, so "keep the old
    /// cadence" is simply "change nothing".
    async fn send_heartbeat(&mut self) -> Result<(), KeeperError> {
        let document = self.session.state_document()?;
        let sealed = self.session.cipher()?.seal(&self.codec.encode(&document)?)?;
        let url = self.session.endpoints()?.keepalive.clone();

        let reply = self.executor.post(&url, &sealed).await?;
        if !reply.is_success() {
            return Err(KeeperError::UnexpectedStatus(reply.status));
        }

        let opened = self.session.cipher()?.open(&reply.body)?;
        let response: PortalResponse = self.codec.decode(&opened)?;
        if !response.is_success() {
            return Err(KeeperError::PortalRejected(
                response.message_or_default().to_owned(),
            ));
        }

        let interval_secs = response.interval_secs()?;
        self.heartbeat.rearm_secs(interval_secs);
        debug!(interval_secs, "heartbeat acknowledged");
        Ok(())
    }

    /// Best-effort teardown; every failure is contained.
    async fn logout(&self) {
        if let Err(err) = self.try_logout().await {
            policy::apply(Op::Logout, &err);
        }
    }

    /// Tells the portal the session is over, when there is one to end.
    ///
    /// Skips the terminate POST when the network is already closed off (the
    /// probe no longer answers 204) or the session never authenticated.
    async fn try_logout(&self) -> Result<(), KeeperError> {
        let reply = self.executor.get(PROBE_URL).await?;
        if !reply.is_no_content() {
            debug!(status = reply.status, "no open session, skipping logout");
            return Ok(());
        }
        if self.session.cipher.is_none() {
            debug!("never authenticated, skipping logout");
            return Ok(());
        }

        let document = self.session.state_document()?;
        let sealed = self.session.cipher()?.seal(&self.codec.encode(&document)?)?;
        let url = self.session.endpoints()?.terminate.clone();
        self.executor
            .post_with_timeout(&url, &sealed, LOGOUT_TIMEOUT)
            .await?;
        info!("logout request sent");
        Ok(())
    }
}
