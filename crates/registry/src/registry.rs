//! The component registry document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::component::{ComponentRecord, ComponentType};
use crate::error::{Error, Result};
use crate::state::ComponentState;

/// Current schema version written into new documents.
pub const SCHEMA_VERSION: u32 = 1;

/// Metadata for a cluster the deployment spans.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClusterMetadata {
    /// The cluster reference components point at.
    pub name: String,

    /// API endpoint for the cluster, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
}

/// The authoritative inventory of deployed components.
///
/// The document is read in full, mutated in memory, and written back in
/// full; exclusive access is the lease holder's responsibility. Records
/// live in one ordered map per component type, keyed by id.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ComponentRegistry {
    schema_version: u32,
    version: u64,
    clusters: BTreeMap<String, ClusterMetadata>,
    consensus_nodes: BTreeMap<u32, ComponentRecord>,
    mirror_nodes: BTreeMap<u32, ComponentRecord>,
    mirror_node_explorers: BTreeMap<u32, ComponentRecord>,
    relays: BTreeMap<u32, ComponentRecord>,
    haproxies: BTreeMap<u32, ComponentRecord>,
    envoy_proxies: BTreeMap<u32, ComponentRecord>,
    block_nodes: BTreeMap<u32, ComponentRecord>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    /// Creates an empty registry at the current schema version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            version: 0,
            clusters: BTreeMap::new(),
            consensus_nodes: BTreeMap::new(),
            mirror_nodes: BTreeMap::new(),
            mirror_node_explorers: BTreeMap::new(),
            relays: BTreeMap::new(),
            haproxies: BTreeMap::new(),
            envoy_proxies: BTreeMap::new(),
            block_nodes: BTreeMap::new(),
        }
    }

    /// The schema version this document was written with.
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// The document version, incremented on every persisted mutation.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Increments the document version. Called by the transaction
    /// manager just before persisting.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Registers (or replaces) cluster metadata.
    pub fn register_cluster(&mut self, metadata: ClusterMetadata) {
        self.clusters.insert(metadata.name.clone(), metadata);
    }

    /// Looks up cluster metadata by reference.
    #[must_use]
    pub fn cluster(&self, name: &str) -> Option<&ClusterMetadata> {
        self.clusters.get(name)
    }

    /// All registered clusters, keyed by reference.
    #[must_use]
    pub const fn clusters(&self) -> &BTreeMap<String, ClusterMetadata> {
        &self.clusters
    }

    fn bucket(&self, component_type: ComponentType) -> &BTreeMap<u32, ComponentRecord> {
        match component_type {
            ComponentType::ConsensusNode => &self.consensus_nodes,
            ComponentType::MirrorNode => &self.mirror_nodes,
            ComponentType::MirrorNodeExplorer => &self.mirror_node_explorers,
            ComponentType::Relay => &self.relays,
            ComponentType::HaProxy => &self.haproxies,
            ComponentType::EnvoyProxy => &self.envoy_proxies,
            ComponentType::BlockNode => &self.block_nodes,
        }
    }

    fn bucket_mut(&mut self, component_type: ComponentType) -> &mut BTreeMap<u32, ComponentRecord> {
        match component_type {
            ComponentType::ConsensusNode => &mut self.consensus_nodes,
            ComponentType::MirrorNode => &mut self.mirror_nodes,
            ComponentType::MirrorNodeExplorer => &mut self.mirror_node_explorers,
            ComponentType::Relay => &mut self.relays,
            ComponentType::HaProxy => &mut self.haproxies,
            ComponentType::EnvoyProxy => &mut self.envoy_proxies,
            ComponentType::BlockNode => &mut self.block_nodes,
        }
    }

    fn check_cluster(&self, record: &ComponentRecord) -> Result<()> {
        let cluster = &record.base().cluster;
        if self.clusters.contains_key(cluster) {
            Ok(())
        } else {
            Err(Error::UnknownCluster(cluster.clone()))
        }
    }

    /// Adds a new record.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AlreadyExists`] if the id is taken within
    /// the type, or [`Error::UnknownCluster`] if the record references
    /// an unregistered cluster.
    pub fn add(&mut self, record: ComponentRecord) -> Result<()> {
        self.check_cluster(&record)?;

        let component_type = record.component_type();
        let id = record.id();
        let bucket = self.bucket_mut(component_type);
        if bucket.contains_key(&id) {
            return Err(Error::AlreadyExists { component_type, id });
        }

        bucket.insert(id, record);
        Ok(())
    }

    /// Removes a record, returning it.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if no such record exists.
    pub fn remove(&mut self, component_type: ComponentType, id: u32) -> Result<ComponentRecord> {
        self.bucket_mut(component_type)
            .remove(&id)
            .ok_or(Error::NotFound { component_type, id })
    }

    /// Replaces an existing record with an updated one of the same type
    /// and id.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if the record does not exist, or
    /// [`Error::UnknownCluster`] if the update references an
    /// unregistered cluster.
    pub fn edit(&mut self, record: ComponentRecord) -> Result<()> {
        self.check_cluster(&record)?;

        let component_type = record.component_type();
        let id = record.id();
        let bucket = self.bucket_mut(component_type);
        if !bucket.contains_key(&id) {
            return Err(Error::NotFound { component_type, id });
        }

        bucket.insert(id, record);
        Ok(())
    }

    /// Retrieves a record by type and id.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if no such record exists.
    pub fn get(&self, component_type: ComponentType, id: u32) -> Result<&ComponentRecord> {
        self.bucket(component_type)
            .get(&id)
            .ok_or(Error::NotFound { component_type, id })
    }

    /// Applies a lifecycle state change to a consensus-phase component,
    /// enforcing the legal-successor table.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if the record does not exist, or
    /// [`Error::IllegalTransition`] if the lifecycle forbids the move.
    pub fn change_state(
        &mut self,
        component_type: ComponentType,
        id: u32,
        to: ComponentState,
    ) -> Result<()> {
        let record = self
            .bucket_mut(component_type)
            .get_mut(&id)
            .ok_or(Error::NotFound { component_type, id })?;

        let from = record.state();
        if !from.can_transition_to(to) {
            return Err(Error::IllegalTransition {
                component_type,
                id,
                from,
                to,
            });
        }

        record.base_mut().state = to;
        Ok(())
    }

    /// The next unused id for a type: one past the highest existing id,
    /// or the base id when none exist. Pure: the id is consumed only
    /// when a record carrying it is added.
    #[must_use]
    pub fn new_component_id(&self, component_type: ComponentType) -> u32 {
        self.bucket(component_type)
            .keys()
            .next_back()
            .map_or(ComponentType::BASE_ID, |max| max + 1)
    }

    /// All records of a type, in id order.
    pub fn components_of(
        &self,
        component_type: ComponentType,
    ) -> impl Iterator<Item = &ComponentRecord> {
        self.bucket(component_type).values()
    }

    /// Total number of records across all types.
    #[must_use]
    pub fn len(&self) -> usize {
        [
            ComponentType::ConsensusNode,
            ComponentType::MirrorNode,
            ComponentType::MirrorNodeExplorer,
            ComponentType::Relay,
            ComponentType::HaProxy,
            ComponentType::EnvoyProxy,
            ComponentType::BlockNode,
        ]
        .iter()
        .map(|t| self.bucket(*t).len())
        .sum()
    }

    /// Whether the registry holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
