//! Storage reachability check.

use super::CheckResult;
use crate::services::storage::Storage;

/// List the source root once.
pub async fn check(storage: &dyn Storage, root: &str) -> CheckResult {
    let name = format!("Storage ({})", storage.name());
    match storage.list(root).await {
        Ok(entries) => CheckResult::ok(&name, &format!("{} entries in {}", entries.len(), root)),
        Err(e) => CheckResult::fail(
            &name,
            &format!("cannot list {}: {}", root, e),
            "Check --source-root and that the remote is mounted",
        ),
    }
}
