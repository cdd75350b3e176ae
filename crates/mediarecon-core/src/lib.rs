pub mod catalog;
pub mod clients;
pub mod config;
pub mod cooldown;
pub mod engine;
pub mod error;
pub mod matching;
pub mod parse;
pub mod quality;
pub mod reconcile;
pub mod scanner;
pub mod storage;

pub use config::{load_configuration, AppConfig};
pub use engine::{CycleReport, PollEngine, SchedulerState};
pub use error::Error;
pub use reconcile::{AuditReport, CategoryReconciler, CategoryReport, Reconciler};
