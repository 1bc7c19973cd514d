//! End-to-End Tests for GitHub Sentinel
//!
//! These tests drive the complete report pipeline through the public
//! sentinel-core API, with hand-written fakes standing in for GitHub, the
//! LLM provider and the notifier:
//! - Export cache and AI report layout on disk
//! - Skipping AI analysis for periods without activity
//! - Configuration handling
//! - Subscriptions and the scheduled notification job
//!
//! Tests that talk to live services are marked with `#[ignore]` and can be
//! run explicitly with `cargo test -- --ignored`.

use async_trait::async_trait;
use chrono::NaiveDate;
use sentinel_core::{
    AIError, ActivityCollectorPort, ActivitySnapshot, AiReportStore, ChatPrompt, CommitRecord,
    DateSpan, ExportCacheStore, FetchError, FetchPolicy, LlmProviderPort, ProbeOutcome,
    ProviderKind, ReportKind, ReportOrchestrator, RepositoryRef,
};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Test environment that creates an isolated Sentinel data directory
struct TestEnv {
    #[allow(dead_code)]
    temp_dir: TempDir,
    data_dir: PathBuf,
    config_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join(".sentinel");
        let config_path = data_dir.join("config.toml");

        fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        Self {
            temp_dir,
            data_dir,
            config_path,
        }
    }

    fn write_config(&self, content: &str) {
        fs::write(&self.config_path, content).expect("Failed to write config");
    }

    fn default_config(&self) -> String {
        format!(
            r#"[storage]
data_dir = "{}"

[llm]
provider = "ollama"
ollama_model = "llama3.1"
max_tokens = 800

[schedule]
frequency_days = 7
execution_time = "09:30"
"#,
            self.data_dir.display()
        )
    }

    fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("reports").join("exports")
    }

    fn ai_reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports").join("ai_reports")
    }

    fn orchestrator(
        &self,
        provider: Arc<FakeProvider>,
        collector: Arc<FakeCollector>,
    ) -> ReportOrchestrator {
        ReportOrchestrator::new(
            ExportCacheStore::new(self.exports_dir()),
            AiReportStore::new(self.ai_reports_dir()),
            provider,
        )
        .with_collector(collector)
    }
}

// ============================================================================
// Fakes
// ============================================================================

/// Provider that counts calls and echoes a fixed report
struct FakeProvider {
    calls: AtomicUsize,
    prompts: Mutex<Vec<ChatPrompt>>,
    fail: bool,
}

impl FakeProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProviderPort for FakeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model(&self) -> &str {
        "llama3.1"
    }

    async fn probe(&self) -> ProbeOutcome {
        ProbeOutcome::available("fake provider is up")
    }

    async fn complete(&self, prompt: &ChatPrompt, _max_tokens: u32) -> Result<String, AIError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());
        if self.fail {
            return Err(AIError::ConnectionFailed("connection refused".to_string()));
        }
        Ok("# AI Progress Report\n\nTwo commits landed.".to_string())
    }
}

/// Collector serving canned snapshots by repository name
struct FakeCollector {
    snapshots: HashMap<String, ActivitySnapshot>,
    calls: AtomicUsize,
}

impl FakeCollector {
    fn new(snapshots: Vec<(&str, ActivitySnapshot)>) -> Arc<Self> {
        Arc::new(Self {
            snapshots: snapshots
                .into_iter()
                .map(|(name, snapshot)| (name.to_string(), snapshot))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActivityCollectorPort for FakeCollector {
    async fn fetch(
        &self,
        repo: &RepositoryRef,
        _span: DateSpan,
    ) -> Result<ActivitySnapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .get(repo.as_str())
            .cloned()
            .ok_or_else(|| FetchError::NotFound(repo.to_string()))
    }
}

fn repo(name: &str) -> RepositoryRef {
    RepositoryRef::new(name).unwrap()
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn two_commits() -> ActivitySnapshot {
    ActivitySnapshot::new(
        vec![
            CommitRecord {
                sha: "1a2b3c4d5e6f7a8b".to_string(),
                message: "Add widget factory".to_string(),
                author: "alice".to_string(),
                timestamp: None,
            },
            CommitRecord {
                sha: "9f8e7d6c5b4a3f2e".to_string(),
                message: "Fix widget sizing".to_string(),
                author: "bob".to_string(),
                timestamp: None,
            },
        ],
        vec![],
        vec![],
    )
}

// ============================================================================
// Report pipeline
// ============================================================================

mod report_pipeline {
    use super::*;

    /// Test: Activity is exported, classified as meaningful and analyzed
    #[tokio::test]
    async fn test_meaningful_activity_is_analyzed() {
        let env = TestEnv::new();
        let provider = FakeProvider::new();
        let collector = FakeCollector::new(vec![("acme/widgets", two_commits())]);
        let orchestrator = env.orchestrator(provider.clone(), collector.clone());
        let span = DateSpan::single(march(1));

        let outcome = orchestrator
            .generate_report(&repo("acme/widgets"), &span, &FetchPolicy::Unconditional)
            .await
            .unwrap();

        assert_eq!(outcome.kind, ReportKind::Generated);
        assert!(outcome.fetched);
        assert_eq!(provider.calls(), 1);
        assert_eq!(collector.calls(), 1);
        assert!(outcome.path.ends_with("acme_widgets/2024-03-01_report.md"));
        assert_eq!(
            outcome.cache_path,
            env.exports_dir().join("acme_widgets").join("2024-03-01.md")
        );

        let cache = fs::read_to_string(&outcome.cache_path).unwrap();
        let commits_section = cache
            .split("## Commits")
            .nth(1)
            .and_then(|rest| rest.split("## Issues").next())
            .unwrap();
        assert_eq!(
            commits_section.lines().filter(|l| l.starts_with("- `")).count(),
            2
        );

        let prompt = provider.prompts.lock().unwrap()[0].clone();
        assert!(prompt.messages.last().unwrap().content.contains("Add widget factory"));

        let saved = fs::read_to_string(&outcome.path).unwrap();
        assert_eq!(saved, "# AI Progress Report\n\nTwo commits landed.");
    }

    /// Test: A period with no activity skips the provider entirely
    #[tokio::test]
    async fn test_empty_period_skips_ai_analysis() {
        let env = TestEnv::new();
        let provider = FakeProvider::new();
        let collector = FakeCollector::new(vec![("acme/widgets", ActivitySnapshot::empty())]);
        let orchestrator = env.orchestrator(provider.clone(), collector);
        let span = DateSpan::single(march(1));

        let outcome = orchestrator
            .generate_report(&repo("acme/widgets"), &span, &FetchPolicy::Unconditional)
            .await
            .unwrap();

        assert_eq!(outcome.kind, ReportKind::Skipped);
        assert_eq!(provider.calls(), 0);
        assert!(outcome.text.contains("No meaningful activity detected"));
        assert!(fs::read_to_string(&outcome.path)
            .unwrap()
            .contains("No meaningful activity detected"));

        let cache = fs::read_to_string(&outcome.cache_path).unwrap();
        assert!(cache.starts_with("# No Activity Report"));
    }

    /// Test: Cached artifacts are reused without fetching
    #[tokio::test]
    async fn test_second_report_reuses_export_cache() {
        let env = TestEnv::new();
        let provider = FakeProvider::new();
        let collector = FakeCollector::new(vec![("acme/widgets", two_commits())]);
        let orchestrator = env.orchestrator(provider.clone(), collector.clone());
        let span = DateSpan::single(march(1));

        orchestrator
            .generate_report(&repo("acme/widgets"), &span, &FetchPolicy::Unconditional)
            .await
            .unwrap();
        let second = orchestrator
            .generate_report(&repo("acme/widgets"), &span, &FetchPolicy::Unconditional)
            .await
            .unwrap();

        assert!(!second.fetched);
        assert_eq!(collector.calls(), 1);
        assert_eq!(provider.calls(), 2);
    }

    /// Test: Provider failures are written into the report
    #[tokio::test]
    async fn test_generation_failure_is_persisted() {
        let env = TestEnv::new();
        let provider = FakeProvider::failing();
        let collector = FakeCollector::new(vec![("acme/widgets", two_commits())]);
        let orchestrator = env.orchestrator(provider, collector);
        let span = DateSpan::single(march(1));

        let outcome = orchestrator
            .generate_report(&repo("acme/widgets"), &span, &FetchPolicy::Unconditional)
            .await
            .unwrap();

        assert_eq!(outcome.kind, ReportKind::GenerationFailed);
        let saved = fs::read_to_string(&outcome.path).unwrap();
        assert!(saved.starts_with("Error generating response with ollama LLM:"));
        assert!(saved.contains("connection refused"));
    }

    /// Test: Multi-day spans get their own artifact names
    #[tokio::test]
    async fn test_multi_day_span_layout() {
        let env = TestEnv::new();
        let collector = FakeCollector::new(vec![("acme/my-lib", two_commits())]);
        let orchestrator = env.orchestrator(FakeProvider::new(), collector);
        let span = DateSpan::ending_on(march(7), 7).unwrap();

        let outcome = orchestrator
            .generate_report(&repo("acme/my-lib"), &span, &FetchPolicy::Unconditional)
            .await
            .unwrap();

        assert!(outcome
            .cache_path
            .ends_with("acme_my_lib/2024-03-07_7days.md"));
        assert!(outcome.path.ends_with("acme_my_lib/2024-03-07_7days_report.md"));
        let cache = fs::read_to_string(&outcome.cache_path).unwrap();
        assert!(cache.contains("2024-03-01 to 2024-03-07"));
    }

    /// Test: One failing repository does not stop the batch
    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let env = TestEnv::new();
        let collector = FakeCollector::new(vec![
            ("acme/widgets", two_commits()),
            ("acme/gadgets", ActivitySnapshot::empty()),
        ]);
        let orchestrator = env.orchestrator(FakeProvider::new(), collector);

        let summary = orchestrator
            .run_batch(
                &[repo("acme/widgets"), repo("acme/unknown"), repo("acme/gadgets")],
                &DateSpan::single(march(1)),
                &FetchPolicy::Unconditional,
            )
            .await;

        assert_eq!(summary.tally(), "2 of 3 succeeded");
        let failed: Vec<String> = summary.failures().map(|(r, _)| r.to_string()).collect();
        assert_eq!(failed, vec!["acme/unknown"]);
    }
}

// ============================================================================
// Configuration
// ============================================================================

mod configuration {
    use super::*;
    use sentinel_core::{
        load_config_from_path, resolve_provider, Config, Credentials, ProviderChoice,
    };

    /// Test: Configuration defaults
    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert_eq!(config.llm.provider, ProviderChoice::Auto);
        assert_eq!(config.llm.max_tokens, 1500);
        assert_eq!(config.schedule.frequency_days, 1);
        assert_eq!(config.schedule.execution_time, "08:00");
        assert!(config.reports.enabled);
        assert!(config.notification.webhook_url.is_none());
    }

    /// Test: Configuration loads from TOML file
    #[test]
    fn test_config_loads_from_file() {
        let env = TestEnv::new();
        env.write_config(&env.default_config());

        let config = load_config_from_path(&env.config_path).unwrap();

        assert_eq!(config.storage.data_dir, env.data_dir);
        assert_eq!(config.llm.provider, ProviderChoice::Ollama);
        assert_eq!(config.llm.max_tokens, 800);
        assert_eq!(config.schedule.frequency_days, 7);
        assert_eq!(config.storage.export_cache_dir(), env.exports_dir());
    }

    /// Test: Missing file is created with defaults
    #[test]
    fn test_missing_config_is_created() {
        let env = TestEnv::new();
        assert!(!env.config_path.exists());

        let config = load_config_from_path(&env.config_path).unwrap();

        assert!(env.config_path.exists());
        assert_eq!(config, Config::default());
    }

    /// Test: Invalid TOML is an error
    #[test]
    fn test_invalid_toml_is_rejected() {
        let env = TestEnv::new();
        env.write_config("this is not valid toml {{{{");

        assert!(load_config_from_path(&env.config_path).is_err());
    }

    /// Test: Unknown provider names fail at load time
    #[test]
    fn test_unknown_provider_is_rejected() {
        let env = TestEnv::new();
        env.write_config("[llm]\nprovider = \"claude\"\n");

        assert!(load_config_from_path(&env.config_path).is_err());
    }

    /// Test: Invalid schedule values fail validation
    #[test]
    fn test_invalid_schedule_is_rejected() {
        let env = TestEnv::new();
        env.write_config("[schedule]\nfrequency_days = 0\n");
        assert!(load_config_from_path(&env.config_path).is_err());

        env.write_config("[schedule]\nexecution_time = \"8 o'clock\"\n");
        assert!(load_config_from_path(&env.config_path).is_err());
    }

    /// Test: Ollama needs no credential; explicit cloud providers do
    #[test]
    fn test_provider_resolution() {
        let env = TestEnv::new();
        env.write_config(&env.default_config());
        let config = load_config_from_path(&env.config_path).unwrap();

        let resolved = resolve_provider(&config.llm, &Credentials::default()).unwrap();
        assert_eq!(resolved.kind(), ProviderKind::Ollama);
        assert_eq!(resolved.model(), "llama3.1");

        let mut llm = config.llm.clone();
        llm.provider = ProviderChoice::OpenAi;
        assert!(resolve_provider(&llm, &Credentials::default()).is_err());
    }
}

// ============================================================================
// Subscriptions and scheduled notifications
// ============================================================================

mod notifications {
    use super::*;
    use chrono::{NaiveDateTime, NaiveTime};
    use sentinel_core::{
        DaemonScheduler, DailySchedule, NotificationGate, NotificationJob, NotifierPort,
        SubscriptionStore,
    };

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl NotifierPort for RecordingNotifier {
        async fn notify(&self, report: &str, repo: &RepositoryRef) {
            self.sent
                .lock()
                .unwrap()
                .push((repo.to_string(), report.to_string()));
        }
    }

    /// Test: Subscriptions persist across store instances
    #[test]
    fn test_subscriptions_persist() {
        let env = TestEnv::new();
        let path = env.data_dir.join("subscriptions.json");

        let store = SubscriptionStore::new(&path);
        store.add(&repo("acme/widgets")).unwrap();
        store.add(&repo("acme/gadgets")).unwrap();
        store.remove(&repo("acme/widgets")).unwrap();

        let reopened = SubscriptionStore::new(&path);
        assert_eq!(reopened.list().unwrap(), vec![repo("acme/gadgets")]);
    }

    /// Test: The daemon runs its job at startup and notifies only active repositories
    #[tokio::test]
    async fn test_daemon_startup_run_notifies_active_repositories() {
        let env = TestEnv::new();
        let subscriptions = SubscriptionStore::new(env.data_dir.join("subscriptions.json"));
        subscriptions.add(&repo("acme/widgets")).unwrap();
        subscriptions.add(&repo("acme/gadgets")).unwrap();
        subscriptions.add(&repo("acme/broken")).unwrap();

        let collector = FakeCollector::new(vec![
            ("acme/widgets", two_commits()),
            ("acme/gadgets", ActivitySnapshot::empty()),
        ]);
        let notifier = Arc::new(RecordingNotifier::default());
        let job = NotificationJob::new(
            subscriptions,
            collector.clone(),
            NotificationGate::new(notifier.clone()),
            1,
        );

        let schedule = DailySchedule::new(1, NaiveTime::from_hms_opt(8, 0, 0).unwrap()).unwrap();
        let now: NaiveDateTime = march(1).and_hms_opt(12, 0, 0).unwrap();
        let scheduler = DaemonScheduler::new(Arc::new(job), schedule).with_clock(move || now);

        scheduler.run(std::future::ready(())).await.unwrap();

        assert_eq!(scheduler.runs(), 1);
        assert_eq!(collector.calls(), 3);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "acme/widgets");
        assert!(sent[0].1.contains("## Recent Commits (2)"));
        assert!(!env.exports_dir().exists());
    }
}

// ============================================================================
// Live services
// ============================================================================

mod live {
    use super::*;

    /// Test: A real Ollama server answers the probe
    #[tokio::test]
    #[ignore = "Requires a running Ollama server"]
    async fn test_ollama_probe() {
        let adapter = sentinel_adapters::OllamaAdapter::new(
            sentinel_adapters::ai::DEFAULT_OLLAMA_API_URL,
            "llama3.1",
        )
        .unwrap();
        let outcome = adapter.probe().await;
        assert!(outcome.available, "{}", outcome.message);
    }
}
