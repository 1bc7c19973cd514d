//! Sentinel Core - Domain logic for GitHub Sentinel
//!
//! This crate contains the activity model, the export cache and report stores,
//! the report pipeline and the port definitions, following the Hexagonal
//! Architecture pattern. Network access lives in `sentinel-adapters`.

pub mod api_key;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod notification;
pub mod orchestrator;
pub mod ports;
pub mod prompt;
pub mod report_store;
pub mod scheduler;
pub mod subscription;

// Re-export primary types for convenient access
pub use api_key::{
    auto_select, provider_guidance, resolve_provider, Credentials, ProviderConfig, ProviderKind,
    SecretApiKey, DEEPSEEK_API_KEY_ENV, GITHUB_TOKEN_ENV, OPENAI_API_KEY_ENV,
};
pub use cache::{render_markdown, ExportCacheStore};
pub use classifier::{Classify, RenderedMarkdown};
pub use config::{
    get_default_config_path, load_config, load_config_from_path, Config, GitHubConfig, LlmConfig,
    NotificationConfig, ProviderChoice, ReportsConfig, ScheduleConfig, StorageConfig,
};
pub use directory::DirectoryManager;
pub use error::{ConfigError, SentinelError, StorageError};
pub use logging::{init_logger, LogLevel, LoggerConfig, LoggerError, LoggerGuard};
pub use notification::{render_notification_report, NotificationDecision, NotificationGate};
pub use orchestrator::{
    export_activity, export_all, render_skipped_report, BatchItem, BatchSummary, FetchConfirmation,
    FetchPolicy, ReportError, ReportKind, ReportOrchestrator, ReportOutcome,
};
pub use ports::activity::{
    ActivitySnapshot, ActivitySummary, CommitRecord, DateSpan, DateSpanError, FetchError,
    IssueRecord, PullRequestRecord, RepositoryRef,
};
pub use ports::ai::{AIError, ChatMessage, ChatPrompt, ChatRole, Generation, ProbeOutcome};
pub use ports::{ActivityCollectorPort, LlmProviderPort, NotifierPort};
pub use prompt::PromptBuilder;
pub use report_store::AiReportStore;
pub use scheduler::{
    DailySchedule, DaemonScheduler, JobOutcome, NotificationJob, ScheduledJob, SchedulerError,
};
pub use subscription::{SubscriptionError, SubscriptionStore};
