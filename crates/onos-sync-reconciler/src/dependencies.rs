use onos_sync_core::RecordId;
use onos_sync_storage::{AppFilter, ModelStore, StorageError};
use tracing::debug;

/// True when every named dependency is an app of the same service whose
/// last reconciliation succeeded. Evaluated fresh on every call.
pub async fn dependencies_satisfied(
    store: &dyn ModelStore,
    service: RecordId,
    dependencies: &[&str],
) -> Result<bool, StorageError> {
    for dependency in dependencies {
        let filter = AppFilter::new()
            .with_app_id(*dependency)
            .with_owner(service)
            .with_deleted(false);
        let found = store.filter_apps(&filter).await?;
        match found.as_slice() {
            [app] if app.status.is_ok() => {}
            [_] => {
                debug!(dependency = %dependency, "Dependency not installed yet");
                return Ok(false);
            }
            _ => {
                debug!(dependency = %dependency, matches = found.len(), "Dependency not resolvable");
                return Ok(false);
            }
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use onos_sync_core::{AppRecord, CallerId, ControllerService};
    use onos_sync_db_memory::InMemoryModelStore;
    use onos_sync_storage::AppField;

    async fn seeded() -> (InMemoryModelStore, RecordId) {
        let store = InMemoryModelStore::new();
        let caller = CallerId::new("admin@opencord.org");
        let onos = store
            .create_service(ControllerService::new("onos", "onos-url"), Some(&caller))
            .await
            .unwrap();
        let mut openflow = store
            .create_app(
                AppRecord::new("openflow", "org.onosproject.openflow", onos.id),
                Some(&caller),
            )
            .await
            .unwrap();
        openflow.status.mark_ok();
        store
            .persist_app(&openflow, &[AppField::Status])
            .await
            .unwrap();
        store
            .create_app(
                AppRecord::new("segmentrouting", "org.onosproject.segmentrouting", onos.id),
                Some(&caller),
            )
            .await
            .unwrap();
        (store, onos.id)
    }

    #[tokio::test]
    async fn test_empty_list_is_satisfied() {
        let (store, onos) = seeded().await;
        assert!(dependencies_satisfied(&store, onos, &[]).await.unwrap());
    }

    #[tokio::test]
    async fn test_installed_dependency() {
        let (store, onos) = seeded().await;
        assert!(
            dependencies_satisfied(&store, onos, &["org.onosproject.openflow"])
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_pending_or_unknown_dependency() {
        let (store, onos) = seeded().await;
        assert!(
            !dependencies_satisfied(
                &store,
                onos,
                &["org.onosproject.openflow", "org.onosproject.segmentrouting"]
            )
            .await
            .unwrap()
        );
        assert!(
            !dependencies_satisfied(&store, onos, &["org.opencord.missing"])
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_other_service_apps_do_not_count() {
        let (store, _) = seeded().await;
        let other = store
            .create_service(
                ControllerService::new("onos-voltha", "onos-voltha"),
                Some(&CallerId::new("admin@opencord.org")),
            )
            .await
            .unwrap();
        assert!(
            !dependencies_satisfied(&store, other.id, &["org.onosproject.openflow"])
                .await
                .unwrap()
        );
    }
}
