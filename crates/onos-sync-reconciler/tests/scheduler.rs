mod common;

use std::time::Duration;

use common::{Harness, VROUTER, call};
use onos_sync_core::{
    AppRecord, Attribute, AttributeOwner, BackendCode, BusMessage, events::POD_DETAILS_TOPIC,
};
use onos_sync_reconciler::{EventInvalidator, PassReport, RESYNC_MESSAGE};
use onos_sync_storage::{AppField, AttributeField, ModelStore};
use serde_json::json;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_bundled(h: &Harness, app_id: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/onos/v1/applications/{app_id}/active")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/onos/v1/applications/{app_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "1.13.1"})))
        .mount(&h.server)
        .await;
}

#[tokio::test]
async fn test_dependency_chain_converges_over_passes() {
    let h = Harness::start().await;
    mount_bundled(&h, VROUTER).await;
    mount_bundled(&h, "org.onosproject.openflow").await;

    // created first, so it is visited before its dependency
    let vrouter = h
        .add_app(
            AppRecord::new("vrouter", VROUTER, h.service.id)
                .with_dependencies("org.onosproject.openflow"),
        )
        .await;
    let openflow = h
        .add_app(AppRecord::new("openflow", "org.onosproject.openflow", h.service.id))
        .await;

    let scheduler = h.scheduler();
    let first = scheduler.run_pass().await.unwrap();
    assert_eq!(
        first,
        PassReport {
            converged: 2,
            deferred: 1,
            failed: 0,
            purged: 0
        }
    );
    let pending = h.store.get_app(vrouter.id).await.unwrap().unwrap();
    assert_eq!(pending.status.code, BackendCode::Pending);
    assert_eq!(pending.status.failures, 0);
    assert!(pending.status.message.contains("dependencies are not met"));
    assert!(h.store.get_app(openflow.id).await.unwrap().unwrap().status.is_ok());

    let second = scheduler.run_pass().await.unwrap();
    assert_eq!(second.converged, 1);
    let installed = h.store.get_app(vrouter.id).await.unwrap().unwrap();
    assert!(installed.status.is_ok());
    assert_eq!(installed.version.as_deref(), Some("1.13.1"));

    assert!(scheduler.run_pass().await.unwrap().is_idle());
}

#[tokio::test]
async fn test_failure_backs_off() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/onos/v1/applications/org.onosproject.openflow/active"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&h.server)
        .await;

    let app = h
        .add_app(AppRecord::new("openflow", "org.onosproject.openflow", h.service.id))
        .await;
    let scheduler = h.scheduler();

    let report = scheduler.run_pass().await.unwrap();
    assert_eq!(report.failed, 1);
    let failed = h.store.get_app(app.id).await.unwrap().unwrap();
    assert_eq!(failed.status.code, BackendCode::Error);
    assert_eq!(failed.status.failures, 1);
    assert!(failed.status.message.contains("boom"));
    assert!(failed.status.next_attempt.is_some());

    // not due yet, so no new attempt
    let before = h.calls().await.len();
    assert!(scheduler.run_pass().await.unwrap().is_idle());
    assert_eq!(h.calls().await.len(), before);
}

#[tokio::test]
async fn test_deleted_records_are_torn_down_leaf_first_and_purged() {
    let h = Harness::start().await;
    Mock::given(method("DELETE"))
        .and(path("/onos/v1/network/configuration/apps/org.opencord.olt"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/onos/v1/applications/org.opencord.olt/active"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    let mut app = h
        .add_app(AppRecord::new("olt", "org.opencord.olt", h.service.id))
        .await;
    let mut attribute = h
        .add_attribute(Attribute::new(
            AttributeOwner::App(app.id),
            "/onos/v1/network/configuration/apps/org.opencord.olt",
            "{}",
        ))
        .await;
    h.service_ok().await;

    attribute.deleted = true;
    attribute.status.mark_ok();
    h.store
        .persist_attribute(&attribute, &[AttributeField::Deleted, AttributeField::Status])
        .await
        .unwrap();
    app.deleted = true;
    h.store
        .persist_app(&app, &[AppField::Deleted])
        .await
        .unwrap();

    let report = h.scheduler().run_pass().await.unwrap();
    assert_eq!(report.purged, 2);
    assert_eq!(
        h.calls().await,
        vec![
            call("DELETE", "/onos/v1/network/configuration/apps/org.opencord.olt"),
            call("DELETE", "/onos/v1/applications/org.opencord.olt/active"),
        ]
    );
    assert!(h.store.get_app(app.id).await.unwrap().is_none());
    assert!(h.store.get_attribute(attribute.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_teardown_keeps_record() {
    let h = Harness::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;

    let mut app = h
        .add_app(AppRecord::new("olt", "org.opencord.olt", h.service.id))
        .await;
    h.service_ok().await;
    app.deleted = true;
    app.status.mark_ok();
    h.store
        .persist_app(&app, &[AppField::Deleted, AppField::Status])
        .await
        .unwrap();

    let report = h.scheduler().run_pass().await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.purged, 0);
    let kept = h.store.get_app(app.id).await.unwrap().unwrap();
    assert_eq!(kept.status.code, BackendCode::Error);
}

#[tokio::test]
async fn test_pod_event_triggers_resync() {
    let h = Harness::start().await;
    mount_bundled(&h, "org.onosproject.openflow").await;
    h.add_app(AppRecord::new("openflow", "org.onosproject.openflow", h.service.id))
        .await;

    let scheduler = h.scheduler();
    scheduler.run_pass().await.unwrap();
    assert!(scheduler.run_pass().await.unwrap().is_idle());

    let invalidator = EventInvalidator::new(h.store.clone());
    let report = invalidator
        .process_event(&BusMessage::new(
            POD_DETAILS_TOPIC,
            r#"{"status": "created", "labels": {"xos_service": "ONOS"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(report.services, 1);
    assert_eq!(report.apps, 1);
    let dirty = h.store.get_service(h.service.id).await.unwrap().unwrap();
    assert_eq!(dirty.status.message, RESYNC_MESSAGE);

    let again = scheduler.run_pass().await.unwrap();
    assert_eq!(again.converged, 2);
}

#[tokio::test]
async fn test_resync_requested_mid_sync_is_kept() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/onos/v1/applications/org.onosproject.openflow/active"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/onos/v1/applications/org.onosproject.openflow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "1.13.1"})))
        .mount(&h.server)
        .await;
    let app = h
        .add_app(AppRecord::new("openflow", "org.onosproject.openflow", h.service.id))
        .await;

    let scheduler = h.scheduler();
    let invalidator = EventInvalidator::new(h.store.clone());
    let pod_created = async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        invalidator
            .process_event(&BusMessage::new(
                POD_DETAILS_TOPIC,
                r#"{"status": "created", "labels": {"xos_service": "ONOS"}}"#,
            ))
            .await
            .unwrap()
    };
    let (report, dirtied) = tokio::join!(scheduler.run_pass(), pod_created);
    assert_eq!(report.unwrap().converged, 2);
    assert_eq!(dirtied.apps, 1);

    let after = h.store.get_app(app.id).await.unwrap().unwrap();
    assert!(after.status.is_dirty());
    assert_eq!(after.status.message, RESYNC_MESSAGE);
    // the version read back is still recorded
    assert_eq!(after.version.as_deref(), Some("1.13.1"));

    let again = scheduler.run_pass().await.unwrap();
    assert_eq!(again.converged, 2);
    assert!(h.store.get_app(app.id).await.unwrap().unwrap().status.is_ok());
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let h = Harness::start().await;
    let scheduler = h.scheduler();
    let (tx, rx) = watch::channel(false);

    let stop = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
    };
    tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(scheduler.run(Duration::from_millis(10), rx), stop);
    })
    .await
    .expect("scheduler must stop");

    let service = h.store.get_service(h.service.id).await.unwrap().unwrap();
    assert!(service.status.is_ok());
}
