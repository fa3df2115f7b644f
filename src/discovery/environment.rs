//! Environment Resolver
//!
//! Maps an id-or-name reference to a canonical [`EnvironmentDescriptor`].
//! The id wins whenever both are given; a name must match exactly one
//! environment. Create, read and delete all resolve through here so the same
//! pair of environments is addressed for a relationship's whole life.

use crate::controlplane::client::wire::{
    ManagedFileSystemWire, WorkingEnvironmentListWire, WorkingEnvironmentWire,
};
use crate::domain::model::{EnvironmentDescriptor, EnvironmentRef, MANAGED_FILE_SYSTEM_PREFIX};
use crate::domain::ports::{ApiHost, ApiRequest, ControlPlaneTransportRef};
use crate::error::{Error, Result};
use tracing::debug;
use urlencoding::encode;

const ENVIRONMENTS_PATH: &str = "/occm/api/working-environments";
const MANAGED_FILE_SYSTEMS_PATH: &str = "/fsx-ontap/working-environments";

/// Resolves environment references against the control plane
pub struct EnvironmentResolver {
    transport: ControlPlaneTransportRef,
}

impl EnvironmentResolver {
    pub fn new(transport: ControlPlaneTransportRef) -> Self {
        Self { transport }
    }

    /// Resolve a reference; `workspace_id` scopes managed file-system lookups
    pub async fn resolve(
        &self,
        reference: &EnvironmentRef,
        workspace_id: Option<&str>,
    ) -> Result<EnvironmentDescriptor> {
        let descriptor = match (reference.id(), reference.name()) {
            (Some(id), _) => self.resolve_by_id(id, workspace_id).await?,
            (None, Some(name)) => self.resolve_by_name(name, workspace_id).await?,
            (None, None) => {
                return Err(Error::MissingReference {
                    kind: "environment".to_string(),
                })
            }
        };

        debug!(
            "Resolved environment {} -> {} ({}, svm {})",
            reference, descriptor.id, descriptor.category, descriptor.svm_name
        );
        Ok(descriptor)
    }

    async fn resolve_by_id(
        &self,
        id: &str,
        workspace_id: Option<&str>,
    ) -> Result<EnvironmentDescriptor> {
        let operation = "resolve environment by id";

        let request = if id.starts_with(MANAGED_FILE_SYSTEM_PREFIX) {
            let workspace = workspace_id.ok_or_else(|| {
                Error::Configuration(format!(
                    "managed file system {} can only be resolved within a workspace",
                    id
                ))
            })?;
            ApiRequest::get(format!(
                "{}/{}/{}",
                MANAGED_FILE_SYSTEMS_PATH,
                encode(workspace),
                encode(id)
            ))
            .on(ApiHost::Services)
        } else {
            ApiRequest::get(format!("{}/{}", ENVIRONMENTS_PATH, encode(id)))
        };

        let response = self.transport.call(request).await?;
        if response.status == 404 {
            return Err(Error::EnvironmentNotFound {
                reference: format!("id={}", id),
            });
        }
        let response = response.ensure_success(operation)?;

        let descriptor = if id.starts_with(MANAGED_FILE_SYSTEM_PREFIX) {
            response
                .json::<ManagedFileSystemWire>(operation)?
                .into_descriptor(operation, response.status)?
        } else {
            response
                .json::<WorkingEnvironmentWire>(operation)?
                .into_descriptor(operation, response.status)?
        };

        if descriptor.id != id {
            return Err(Error::EnvironmentNotFound {
                reference: format!("id={}", id),
            });
        }
        Ok(descriptor)
    }

    async fn resolve_by_name(
        &self,
        name: &str,
        workspace_id: Option<&str>,
    ) -> Result<EnvironmentDescriptor> {
        let operation = "resolve environment by name";

        let response = self
            .transport
            .call(ApiRequest::get(ENVIRONMENTS_PATH))
            .await?
            .ensure_success(operation)?;
        let mut candidates = response
            .json::<WorkingEnvironmentListWire>(operation)?
            .into_descriptors(operation, response.status)?;

        if let Some(workspace) = workspace_id {
            let response = self
                .transport
                .call(
                    ApiRequest::get(format!("{}/{}", MANAGED_FILE_SYSTEMS_PATH, encode(workspace)))
                        .on(ApiHost::Services),
                )
                .await?
                .ensure_success(operation)?;
            for fs in response.json::<Vec<ManagedFileSystemWire>>(operation)? {
                candidates.push(fs.into_descriptor(operation, response.status)?);
            }
        }

        select_by_name(candidates, name)
    }
}

/// Pick the single environment carrying `name`
pub fn select_by_name(
    candidates: Vec<EnvironmentDescriptor>,
    name: &str,
) -> Result<EnvironmentDescriptor> {
    let mut matches: Vec<EnvironmentDescriptor> =
        candidates.into_iter().filter(|c| c.name == name).collect();

    match matches.len() {
        0 => Err(Error::EnvironmentNotFound {
            reference: format!("name={}", name),
        }),
        1 => Ok(matches.remove(0)),
        n => Err(Error::AmbiguousReference {
            kind: "environment".to_string(),
            name: name.to_string(),
            matches: n,
        }),
    }
}
