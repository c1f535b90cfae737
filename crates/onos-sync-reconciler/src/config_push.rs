//! Pushing and removing attribute configuration on a controller.

use std::collections::{BTreeMap, BTreeSet};

use onos_sync_core::{
    Attribute, AttributeKind, ControllerService, RecordKind, parse_component_config,
};
use onos_sync_gateway::{Endpoint, OnosClient};
use onos_sync_storage::ModelStore;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::local_files::LocalConfigWriter;
use crate::outcome::SyncError;

#[derive(Debug, Clone)]
pub struct ConfigPusher {
    client: OnosClient,
    files: LocalConfigWriter,
}

impl ConfigPusher {
    pub fn new(client: OnosClient, files: LocalConfigWriter) -> Self {
        Self { client, files }
    }

    pub fn client(&self) -> &OnosClient {
        &self.client
    }

    pub fn files(&self) -> &LocalConfigWriter {
        &self.files
    }

    /// Applies one attribute against `service`. `owner_name` names the
    /// directory local files land in.
    pub async fn push(
        &self,
        store: &dyn ModelStore,
        service: &ControllerService,
        owner_name: &str,
        attribute: &Attribute,
    ) -> Result<(), SyncError> {
        let endpoint = Endpoint::for_service(service);
        match parse_kind(attribute)? {
            AttributeKind::RestConfig { path } => {
                let value = parse_json(attribute)?;
                info!(attribute = %attribute.name, service = %service.name, "Adding config");
                self.client
                    .push_config(&endpoint, &path, &value)
                    .await
                    .map_err(|e| SyncError::remote(RecordKind::Attribute, attribute.id, e))
            }
            AttributeKind::ComponentConfig => {
                let mut params = store.attribute_dict(attribute.owner).await?;
                params.insert("rest_hostname".into(), service.rest_hostname.clone());
                params.insert("rest_port".into(), service.rest_port.to_string());

                for (component, settings) in render_components(attribute, &params)? {
                    info!(component = %component, service = %service.name, "Adding component config");
                    self.client
                        .push_component_config(&endpoint, &component, &Value::Object(settings))
                        .await
                        .map_err(|e| SyncError::remote(RecordKind::Attribute, attribute.id, e))?;
                }
                Ok(())
            }
            AttributeKind::LocalConfig { file } => {
                let written = self
                    .files
                    .write(service, owner_name, attribute, &file)
                    .await?;
                if written.is_none() {
                    debug!(attribute = %attribute.name, "No local files for this service, skipping");
                }
                Ok(())
            }
        }
    }

    /// Mirrors [`ConfigPusher::push`].
    pub async fn remove(
        &self,
        service: &ControllerService,
        owner_name: &str,
        attribute: &Attribute,
    ) -> Result<(), SyncError> {
        let endpoint = Endpoint::for_service(service);
        match parse_kind(attribute)? {
            AttributeKind::RestConfig { path } => {
                info!(attribute = %attribute.name, service = %service.name, "Deleting config");
                self.client
                    .delete_config(&endpoint, &path)
                    .await
                    .map_err(|e| SyncError::remote(RecordKind::Attribute, attribute.id, e))
            }
            AttributeKind::ComponentConfig => {
                let settings = parse_component_config(&attribute.name, &attribute.value)
                    .map_err(|e| SyncError::from_core(RecordKind::Attribute, attribute.id, e))?;
                let components: BTreeSet<String> =
                    settings.into_iter().map(|s| s.component).collect();
                for component in components {
                    info!(component = %component, service = %service.name, "Deleting component config");
                    self.client
                        .delete_component_config(&endpoint, &component)
                        .await
                        .map_err(|e| SyncError::remote(RecordKind::Attribute, attribute.id, e))?;
                }
                Ok(())
            }
            AttributeKind::LocalConfig { file } => {
                self.files.remove(service, owner_name, attribute, &file).await
            }
        }
    }
}

fn parse_kind(attribute: &Attribute) -> Result<AttributeKind, SyncError> {
    AttributeKind::parse(&attribute.name)
        .map_err(|e| SyncError::from_core(RecordKind::Attribute, attribute.id, e))
}

fn parse_json(attribute: &Attribute) -> Result<Value, SyncError> {
    serde_json::from_str(&attribute.value).map_err(|e| {
        SyncError::validation(
            RecordKind::Attribute,
            attribute.id,
            format!("value of '{}' is not valid JSON: {e}", attribute.name),
        )
    })
}

/// Groups rendered settings per component.
fn render_components(
    attribute: &Attribute,
    params: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, Map<String, Value>>, SyncError> {
    let settings = parse_component_config(&attribute.name, &attribute.value)
        .map_err(|e| SyncError::from_core(RecordKind::Attribute, attribute.id, e))?;

    let mut components: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
    for setting in settings {
        let rendered = setting
            .render(params)
            .map_err(|e| SyncError::from_core(RecordKind::Attribute, attribute.id, e))?;
        components
            .entry(setting.component)
            .or_default()
            .insert(setting.key, Value::String(rendered));
    }
    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use onos_sync_core::{AttributeOwner, RecordId};

    #[test]
    fn test_render_components_groups_by_component() {
        let attribute = Attribute::new(
            AttributeOwner::App(RecordId(2)),
            "component_config",
            r#"{"org.onosproject.xosclient.impl.XosClient": {"user": "<xos_user>", "port": 8181},
                "org.opencord.cordvtn.impl.CordVtn": {"privateGatewayMac": "00:00:00:00:00:01"}}"#,
        );
        let mut params = BTreeMap::new();
        params.insert("xos_user".to_string(), "admin@opencord.org".to_string());

        let components = render_components(&attribute, &params).unwrap();
        assert_eq!(components.len(), 2);
        let xos = &components["org.onosproject.xosclient.impl.XosClient"];
        assert_eq!(xos["user"], Value::String("admin@opencord.org".into()));
        assert_eq!(xos["port"], Value::String("8181".into()));
    }

    #[test]
    fn test_invalid_json_is_validation_failure() {
        let attribute = Attribute::new(
            AttributeOwner::App(RecordId(2)),
            "/onos/v1/network/configuration/",
            "not json",
        );
        let err = parse_json(&attribute).unwrap_err();
        assert!(!err.is_retryable());
    }
}
