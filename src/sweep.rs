//! Removal of objects left behind by acceptance tests.
//!
//! Test objects are recognised by the [`TEST_PREFIX`] on their names.
//! Devices go first, with volumes force-detached, so their projects can be
//! deleted afterwards.

use tracing::{info, warn};

use crate::error::ProviderError;
use crate::metal::MetalClient;

/// Name prefix of objects created by acceptance tests.
pub const TEST_PREFIX: &str = "tfacc-";

/// Outcome of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Devices deleted.
    pub devices_deleted: usize,
    /// Projects deleted.
    pub projects_deleted: usize,
    /// Deletions that failed.
    pub failures: usize,
}

impl SweepReport {
    fn record(&mut self, result: Result<(), ProviderError>, kind: &str, id: &str) -> bool {
        match result {
            Ok(()) => true,
            Err(e) if e.is_not_found() => true,
            Err(e) => {
                warn!(kind, id, error = %e, "sweep could not delete object");
                self.failures += 1;
                false
            },
        }
    }
}

/// Delete every test device and test project visible to the token.
///
/// Only listing projects can fail the sweep; individual deletions are
/// logged and counted.
pub async fn sweep(client: &MetalClient) -> Result<SweepReport, ProviderError> {
    let mut report = SweepReport::default();
    let projects = client.list_projects().await?;

    for project in projects.iter().filter(|p| p.name.starts_with(TEST_PREFIX)) {
        let devices = match client.list_devices(&project.id).await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(project = %project.id, error = %e, "sweep could not list devices");
                report.failures += 1;
                continue;
            },
        };

        for device in devices.iter().filter(|d| d.hostname.starts_with(TEST_PREFIX)) {
            let result = client.delete_device(&device.id, true).await;
            if report.record(result, "device", &device.id) {
                info!(device = %device.id, hostname = %device.hostname, "swept device");
                report.devices_deleted += 1;
            }
        }

        let result = client.delete_project(&project.id).await;
        if report.record(result, "project", &project.id) {
            info!(project = %project.id, name = %project.name, "swept project");
            report.projects_deleted += 1;
        }
    }

    Ok(report)
}
