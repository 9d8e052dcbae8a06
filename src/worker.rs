use std::time::Duration;

use log::info;
use tokio::select;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::error::Error;
use crate::logfile::{RecordFormat, TransitionLog, hms};
use crate::probe::{Classification, Probe, TcpProber};
use crate::tracker::{Tracker, Transition};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Externally visible view of the tracker: the last confirmed state and when
/// it was confirmed. Published once per tick; a pending candidate is never
/// shown, and lifecycle log markers never appear here.
#[derive(Debug, Clone)]
pub enum StatusSnapshot {
    /// The initial probe has not completed yet.
    Starting,
    Confirmed {
        state: Classification,
        since: Instant,
    },
}

/// Control surface over a running monitor.
///
/// Display glue (a tray icon, a status line) reads [`Monitor::snapshot`];
/// stop sources (menu action, ctrl-c, an OS shutdown notification) call
/// [`Monitor::request_stop`] from whatever thread they live on. Neither side
/// touches the tracker itself.
pub struct Monitor {
    token: CancellationToken,
    status: watch::Receiver<StatusSnapshot>,
    task: JoinHandle<Result<(), Error>>,
}

impl Monitor {
    /// Spawns the tick loop against the configured target. The initial probe
    /// runs inside the task, so this returns immediately.
    pub fn start(settings: Settings) -> Result<Monitor, Error> {
        let host = settings.target.host();
        let log = TransitionLog::for_host(&settings.log_dir, &host)?;
        info!(
            "monitoring {host} (debounce {}s), logging to {}",
            settings.window.as_secs(),
            log.path().display()
        );

        let token = CancellationToken::new();
        let (tx, rx) = watch::channel(StatusSnapshot::Starting);
        let prober = TcpProber::new(settings.target);
        let task = tokio::spawn(run(prober, log, settings.window, token.clone(), tx));

        Ok(Monitor {
            token,
            status: rx,
            task,
        })
    }

    /// Last confirmed state label and whole seconds spent in it. Before the
    /// initial probe completes, the label is `Starting`.
    #[must_use]
    pub fn snapshot(&self) -> (String, u64) {
        match &*self.status.borrow() {
            StatusSnapshot::Starting => ("Starting".to_string(), 0),
            StatusSnapshot::Confirmed { state, since } => {
                (state.to_string(), since.elapsed().as_secs())
            }
        }
    }

    /// Signals the tick loop to flush its final record and exit. Idempotent
    /// and callable from any thread.
    pub fn request_stop(&self) {
        self.token.cancel();
    }

    /// Waits for the tick loop to finish. Log-write failures surface here.
    pub async fn join(&mut self) -> Result<(), Error> {
        (&mut self.task).await?
    }
}

/// The tick loop: probe, debounce, log, publish, once per second, until the
/// token fires. Generic over the probe and the record format so tests can
/// script classification sequences.
async fn run<P, F>(
    mut prober: P,
    mut log: TransitionLog<F>,
    window: Duration,
    token: CancellationToken,
    status: watch::Sender<StatusSnapshot>,
) -> Result<(), Error>
where
    P: Probe,
    F: RecordFormat,
{
    // The very first classification is confirmed as-is, preceded by the
    // Started marker; this anchors the state clock before the loop begins.
    let first = prober.check().await;
    info!("initial state: {first}");
    log.append(&Transition {
        from: Classification::Started,
        held: Duration::ZERO,
        to: first.clone(),
    })?;
    let mut tracker = Tracker::new(first, Instant::now(), window);
    publish(&status, &tracker);

    let mut ticker = time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        select! {
            () = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let seen = prober.check().await;
        if let Some(transition) = tracker.observe(seen, Instant::now()) {
            info!(
                "{} -> {} after {}",
                transition.from,
                transition.to,
                hms(transition.held)
            );
            log.append(&transition)?;
        }
        publish(&status, &tracker);
    }

    // Shutdown bypasses the debounce window; a pending candidate is
    // discarded, not confirmed.
    let last = tracker.finish(Instant::now());
    info!("stopped; {} held {}", last.from, hms(last.held));
    log.append(&last)?;
    Ok(())
}

fn publish(status: &watch::Sender<StatusSnapshot>, tracker: &Tracker) {
    status.send_replace(StatusSnapshot::Confirmed {
        state: tracker.confirmed().clone(),
        since: tracker.state_start(),
    });
}
