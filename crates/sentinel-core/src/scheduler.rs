//! Daemon scheduler
//!
//! Runs a job once at startup, then every `frequency_days` days at a fixed
//! local time. The loop polls the clock once per `poll_interval` and runs the
//! job inline, so two runs never overlap. Shutdown is observed between polls.

use crate::config::ScheduleConfig;
use crate::notification::{NotificationDecision, NotificationGate};
use crate::ports::activity::{ActivityCollectorPort, DateSpan, DateSpanError};
use crate::subscription::{SubscriptionError, SubscriptionStore};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Default interval between clock checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Errors that can occur during scheduler operations
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Schedule values are unusable
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Subscription list could not be read
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    /// Fetch window could not be built
    #[error(transparent)]
    DateSpan(#[from] DateSpanError),

    /// Scheduler is already running
    #[error("Scheduler is already running")]
    AlreadyRunning,
}

/// "Every N days at HH:MM"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    frequency_days: u32,
    at: NaiveTime,
}

impl DailySchedule {
    /// # Errors
    /// Returns `SchedulerError::InvalidSchedule` when `frequency_days` is 0
    pub fn new(frequency_days: u32, at: NaiveTime) -> Result<Self, SchedulerError> {
        if frequency_days == 0 {
            return Err(SchedulerError::InvalidSchedule(
                "frequency_days must be >= 1".to_string(),
            ));
        }
        Ok(Self { frequency_days, at })
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self, SchedulerError> {
        let at = config
            .execution_time()
            .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;
        Self::new(config.frequency_days, at)
    }

    pub fn frequency_days(&self) -> u32 {
        self.frequency_days
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// The first trigger time strictly after `now`
    ///
    /// Today's slot if it is still ahead, otherwise the slot `frequency_days`
    /// days from today.
    pub fn next_run_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today_slot = now.date().and_time(self.at);
        if today_slot > now {
            today_slot
        } else {
            today_slot + ChronoDuration::days(i64::from(self.frequency_days))
        }
    }
}

/// Tally of one job run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobOutcome {
    pub processed: usize,
    pub failed: usize,
}

/// Work executed by the daemon on each trigger
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &str;

    /// Runs once for the given local date
    async fn run(&self, today: NaiveDate) -> Result<JobOutcome, SchedulerError>;
}

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Blocking poll loop around a [`ScheduledJob`]
pub struct DaemonScheduler<J: ScheduledJob> {
    job: Arc<J>,
    schedule: DailySchedule,
    poll_interval: Duration,
    clock: Clock,
    running: AtomicBool,
    runs: AtomicU64,
}

impl<J: ScheduledJob> DaemonScheduler<J> {
    pub fn new(job: Arc<J>, schedule: DailySchedule) -> Self {
        Self {
            job,
            schedule,
            poll_interval: DEFAULT_POLL_INTERVAL,
            clock: Arc::new(|| Local::now().naive_local()),
            running: AtomicBool::new(false),
            runs: AtomicU64::new(0),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Replaces the local wall clock
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Number of completed job runs
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }

    /// Runs until `shutdown` resolves
    ///
    /// # Errors
    /// Returns `SchedulerError::AlreadyRunning` if the loop is already active
    pub async fn run<F>(&self, shutdown: F) -> Result<(), SchedulerError>
    where
        F: Future<Output = ()>,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }
        tokio::pin!(shutdown);

        info!(
            job = self.job.name(),
            frequency_days = self.schedule.frequency_days(),
            at = %self.schedule.at().format("%H:%M"),
            "Scheduler started"
        );

        let startup = (self.clock)();
        self.execute(startup.date()).await;
        let mut next_run = self.schedule.next_run_after(startup);
        info!(next_run = %next_run, "Next scheduled run");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Received stop signal, shutting down scheduler");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {
                    let now = (self.clock)();
                    if now >= next_run {
                        self.execute(now.date()).await;
                        next_run = self.schedule.next_run_after(now);
                        info!(next_run = %next_run, "Next scheduled run");
                    }
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(runs = self.runs(), "Scheduler stopped");
        Ok(())
    }

    async fn execute(&self, today: NaiveDate) {
        info!(job = self.job.name(), date = %today, "Running scheduled job");
        match self.job.run(today).await {
            Ok(outcome) => {
                info!(
                    job = self.job.name(),
                    processed = outcome.processed,
                    failed = outcome.failed,
                    "Scheduled job finished"
                );
            }
            Err(e) => {
                error!(job = self.job.name(), error = %e, "Scheduled job failed");
            }
        }
        self.runs.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fetches every subscription and sends notifications for meaningful activity
pub struct NotificationJob {
    subscriptions: SubscriptionStore,
    collector: Arc<dyn ActivityCollectorPort>,
    gate: NotificationGate,
    frequency_days: u32,
}

impl NotificationJob {
    /// `frequency_days` is also the length of the fetched span
    pub fn new(
        subscriptions: SubscriptionStore,
        collector: Arc<dyn ActivityCollectorPort>,
        gate: NotificationGate,
        frequency_days: u32,
    ) -> Self {
        Self {
            subscriptions,
            collector,
            gate,
            frequency_days,
        }
    }
}

#[async_trait]
impl ScheduledJob for NotificationJob {
    fn name(&self) -> &str {
        "notification"
    }

    async fn run(&self, today: NaiveDate) -> Result<JobOutcome, SchedulerError> {
        let repos = self.subscriptions.list()?;
        let span = DateSpan::ending_on(today, self.frequency_days)?;
        let mut outcome = JobOutcome::default();

        if repos.is_empty() {
            warn!(path = %self.subscriptions.path().display(), "No subscriptions to process");
        }

        for repo in &repos {
            match self.collector.fetch(repo, span).await {
                Ok(snapshot) => {
                    if let NotificationDecision::Suppressed =
                        self.gate.process(repo, &span, &snapshot).await
                    {
                        info!(repo = %repo, "Nothing to report");
                    }
                    outcome.processed += 1;
                }
                Err(e) => {
                    error!(repo = %repo, error = %e, "Failed to fetch updates");
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}
