//! Port definitions for Hexagonal Architecture
//!
//! These traits define the boundaries between the core domain and external adapters.

pub mod activity;
pub mod ai;
pub mod notify;

pub use activity::ActivityCollectorPort;
pub use ai::LlmProviderPort;
pub use notify::NotifierPort;
