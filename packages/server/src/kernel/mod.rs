//! Kernel module - server infrastructure and dependencies.

pub mod chat_webhook;
pub mod deps;
pub mod pipeline_clients;
pub mod scheduled_tasks;
pub mod sendgrid_client;
pub mod task_ledger;
pub mod test_dependencies;
pub mod traits;

pub use chat_webhook::ReqwestChatWebhook;
pub use deps::ServerDeps;
pub use pipeline_clients::{HttpJobEnricher, HttpJobIngestor, NoopJobEnricher, NoopJobIngestor};
pub use scheduled_tasks::{TaskOrchestrator, TaskState};
pub use sendgrid_client::{NoopEmailSender, SendGridMailer};
pub use task_ledger::{TaskName, TaskRun};
pub use test_dependencies::TestDependencies;
pub use traits::*;
