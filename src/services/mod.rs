pub mod bootstrap;
pub mod ledger_service;
pub mod locks;
pub mod provisioning;
pub mod registry;

pub use bootstrap::{bootstrap, SeedUser};
pub use ledger_service::{LedgerError, LedgerService, MutationResult, PageLimits};
pub use locks::{LockTimeout, TenantLocks};
pub use provisioning::{ProvisionError, Provisioner, TemplateProvisioner};
pub use registry::{TableRegistry, UserRegistry};
