//! The sanctioned constructor path for new component records.
//!
//! Factory methods pull the next id from the registry and stamp the
//! type's initial lifecycle state. They do not insert: allocation stays
//! idempotent until the caller adds the returned record inside a
//! transaction.

use crate::component::{
    BaseComponent, BlockNodeComponent, ComponentRecord, ComponentType, ConsensusNodeComponent,
    EnvoyProxyComponent, HaProxyComponent, MirrorNodeComponent, MirrorNodeExplorerComponent,
    RelayComponent,
};
use crate::error::{Error, Result};
use crate::registry::ComponentRegistry;
use crate::state::ComponentState;

/// Builds new component records against an existing registry.
#[derive(Clone, Copy, Debug, Default)]
pub struct ComponentFactory;

impl ComponentFactory {
    fn base(
        registry: &ComponentRegistry,
        component_type: ComponentType,
        cluster: &str,
        namespace: &str,
    ) -> Result<BaseComponent> {
        if registry.cluster(cluster).is_none() {
            return Err(Error::UnknownCluster(cluster.to_string()));
        }

        Ok(BaseComponent {
            id: registry.new_component_id(component_type),
            cluster: cluster.to_string(),
            namespace: namespace.to_string(),
            state: ComponentState::initial_for(component_type),
        })
    }

    fn check_consensus_nodes(registry: &ComponentRegistry, ids: &[u32]) -> Result<()> {
        for &id in ids {
            registry.get(ComponentType::ConsensusNode, id)?;
        }
        Ok(())
    }

    /// Creates a new consensus node record in the `Requested` state.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownCluster`] if the cluster reference is
    /// not registered.
    pub fn new_consensus_node(
        registry: &ComponentRegistry,
        cluster: &str,
        namespace: &str,
    ) -> Result<ComponentRecord> {
        Ok(ComponentRecord::ConsensusNode(ConsensusNodeComponent {
            base: Self::base(registry, ComponentType::ConsensusNode, cluster, namespace)?,
        }))
    }

    /// Creates a new mirror node record.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownCluster`] if the cluster reference is
    /// not registered.
    pub fn new_mirror_node(
        registry: &ComponentRegistry,
        cluster: &str,
        namespace: &str,
    ) -> Result<ComponentRecord> {
        Ok(ComponentRecord::MirrorNode(MirrorNodeComponent {
            base: Self::base(registry, ComponentType::MirrorNode, cluster, namespace)?,
        }))
    }

    /// Creates a new mirror node explorer record.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownCluster`] if the cluster reference is
    /// not registered.
    pub fn new_mirror_node_explorer(
        registry: &ComponentRegistry,
        cluster: &str,
        namespace: &str,
    ) -> Result<ComponentRecord> {
        Ok(ComponentRecord::MirrorNodeExplorer(
            MirrorNodeExplorerComponent {
                base: Self::base(
                    registry,
                    ComponentType::MirrorNodeExplorer,
                    cluster,
                    namespace,
                )?,
            },
        ))
    }

    /// Creates a new relay record serving the given consensus nodes.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownCluster`] if the cluster reference is
    /// not registered, or [`Error::NotFound`] if any served node id
    /// does not exist.
    pub fn new_relay(
        registry: &ComponentRegistry,
        cluster: &str,
        namespace: &str,
        consensus_node_ids: Vec<u32>,
    ) -> Result<ComponentRecord> {
        Self::check_consensus_nodes(registry, &consensus_node_ids)?;

        Ok(ComponentRecord::Relay(RelayComponent {
            base: Self::base(registry, ComponentType::Relay, cluster, namespace)?,
            consensus_node_ids,
        }))
    }

    /// Creates a new HAProxy record fronting the given consensus node.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownCluster`] if the cluster reference is
    /// not registered, or [`Error::NotFound`] if the fronted node does
    /// not exist.
    pub fn new_haproxy(
        registry: &ComponentRegistry,
        cluster: &str,
        namespace: &str,
        consensus_node_id: u32,
    ) -> Result<ComponentRecord> {
        Self::check_consensus_nodes(registry, &[consensus_node_id])?;

        Ok(ComponentRecord::HaProxy(HaProxyComponent {
            base: Self::base(registry, ComponentType::HaProxy, cluster, namespace)?,
            consensus_node_id,
        }))
    }

    /// Creates a new Envoy proxy record fronting the given consensus
    /// node.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownCluster`] if the cluster reference is
    /// not registered, or [`Error::NotFound`] if the fronted node does
    /// not exist.
    pub fn new_envoy_proxy(
        registry: &ComponentRegistry,
        cluster: &str,
        namespace: &str,
        consensus_node_id: u32,
    ) -> Result<ComponentRecord> {
        Self::check_consensus_nodes(registry, &[consensus_node_id])?;

        Ok(ComponentRecord::EnvoyProxy(EnvoyProxyComponent {
            base: Self::base(registry, ComponentType::EnvoyProxy, cluster, namespace)?,
            consensus_node_id,
        }))
    }

    /// Creates a new block node record.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownCluster`] if the cluster reference is
    /// not registered.
    pub fn new_block_node(
        registry: &ComponentRegistry,
        cluster: &str,
        namespace: &str,
    ) -> Result<ComponentRecord> {
        Ok(ComponentRecord::BlockNode(BlockNodeComponent {
            base: Self::base(registry, ComponentType::BlockNode, cluster, namespace)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ClusterMetadata;

    fn registry_with_cluster() -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        registry.register_cluster(ClusterMetadata {
            name: "cluster-1".to_string(),
            api_endpoint: None,
        });
        registry
    }

    #[test]
    fn test_new_consensus_node_starts_requested() {
        let registry = registry_with_cluster();

        let record = ComponentFactory::new_consensus_node(&registry, "cluster-1", "ns1").unwrap();
        assert_eq!(record.id(), 0);
        assert_eq!(record.state(), ComponentState::Requested);
    }

    #[test]
    fn test_auxiliary_components_start_deployed() {
        let registry = registry_with_cluster();

        let record = ComponentFactory::new_mirror_node(&registry, "cluster-1", "ns1").unwrap();
        assert_eq!(record.state(), ComponentState::Deployed);
    }

    #[test]
    fn test_ids_advance_only_after_add() {
        let mut registry = registry_with_cluster();

        let first = ComponentFactory::new_consensus_node(&registry, "cluster-1", "ns1").unwrap();
        let again = ComponentFactory::new_consensus_node(&registry, "cluster-1", "ns1").unwrap();
        assert_eq!(first.id(), again.id());

        registry.add(first).unwrap();
        let next = ComponentFactory::new_consensus_node(&registry, "cluster-1", "ns1").unwrap();
        assert_eq!(next.id(), 1);
    }

    #[test]
    fn test_relay_requires_existing_nodes() {
        let mut registry = registry_with_cluster();

        let err =
            ComponentFactory::new_relay(&registry, "cluster-1", "ns1", vec![0]).unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 0, .. }));

        let node = ComponentFactory::new_consensus_node(&registry, "cluster-1", "ns1").unwrap();
        registry.add(node).unwrap();

        let relay = ComponentFactory::new_relay(&registry, "cluster-1", "ns1", vec![0]).unwrap();
        assert_eq!(relay.state(), ComponentState::Deployed);
    }

    #[test]
    fn test_unknown_cluster_rejected() {
        let registry = ComponentRegistry::new();

        let err = ComponentFactory::new_block_node(&registry, "cluster-1", "ns1").unwrap_err();
        assert!(matches!(err, Error::UnknownCluster(_)));
    }

    #[test]
    fn test_proxy_names_follow_node_alias() {
        let mut registry = registry_with_cluster();
        let node = ComponentFactory::new_consensus_node(&registry, "cluster-1", "ns1").unwrap();
        registry.add(node).unwrap();

        let proxy = ComponentFactory::new_haproxy(&registry, "cluster-1", "ns1", 0).unwrap();
        assert_eq!(proxy.name(), "haproxy-node0");
    }
}
