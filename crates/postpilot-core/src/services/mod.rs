//! Application services - the post lifecycle and credit engine.

mod accounts;
mod credentials;
mod orchestrator;
mod publisher;
mod quota;

#[cfg(test)]
mod fakes;

pub use accounts::{Account, AccountService};
pub use credentials::{AuthorizationRequest, CredentialService};
pub use orchestrator::{DEFAULT_VERSION_CAP, EditOrchestrator};
pub use publisher::{PublishReceipt, PublishService};
pub use quota::{QuotaLedger, QuotaStatus};
