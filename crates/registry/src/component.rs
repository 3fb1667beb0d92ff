//! Typed component records.
//!
//! Every deployed unit shares a base shape (id, cluster, namespace,
//! state); type-specific attributes live on the per-type structs, and
//! [`ComponentRecord`] is the tagged union the registry stores and
//! hands out.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::ComponentState;

/// The kinds of component the registry tracks.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    /// A ledger consensus node.
    ConsensusNode,

    /// The mirror node ingesting the ledger's record stream.
    MirrorNode,

    /// The mirror node's explorer frontend.
    MirrorNodeExplorer,

    /// A JSON-RPC relay serving one or more consensus nodes.
    Relay,

    /// An HAProxy fronting a consensus node.
    HaProxy,

    /// An Envoy proxy fronting a consensus node.
    EnvoyProxy,

    /// A block node serving the block stream.
    BlockNode,
}

impl ComponentType {
    /// The base id for the first component of this type.
    pub const BASE_ID: u32 = 0;

    /// The deterministic name prefix for this type.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::ConsensusNode => "node",
            Self::MirrorNode => "mirror-node",
            Self::MirrorNodeExplorer => "explorer",
            Self::Relay => "relay",
            Self::HaProxy => "haproxy",
            Self::EnvoyProxy => "envoy-proxy",
            Self::BlockNode => "block-node",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Fields shared by every component record.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BaseComponent {
    /// Id, unique per component type within a registry.
    pub id: u32,

    /// Reference into the registry's cluster map.
    pub cluster: String,

    /// Namespace the component is deployed into.
    pub namespace: String,

    /// Current lifecycle state.
    pub state: ComponentState,
}

/// A ledger consensus node.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ConsensusNodeComponent {
    /// Shared component fields.
    #[serde(flatten)]
    pub base: BaseComponent,
}

/// The mirror node.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MirrorNodeComponent {
    /// Shared component fields.
    #[serde(flatten)]
    pub base: BaseComponent,
}

/// The mirror node explorer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MirrorNodeExplorerComponent {
    /// Shared component fields.
    #[serde(flatten)]
    pub base: BaseComponent,
}

/// A JSON-RPC relay, recording which consensus nodes it serves.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RelayComponent {
    /// Shared component fields.
    #[serde(flatten)]
    pub base: BaseComponent,

    /// Ids of the consensus nodes this relay serves.
    pub consensus_node_ids: Vec<u32>,
}

/// An HAProxy instance fronting one consensus node.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HaProxyComponent {
    /// Shared component fields.
    #[serde(flatten)]
    pub base: BaseComponent,

    /// Id of the consensus node this proxy fronts.
    pub consensus_node_id: u32,
}

/// An Envoy proxy fronting one consensus node.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EnvoyProxyComponent {
    /// Shared component fields.
    #[serde(flatten)]
    pub base: BaseComponent,

    /// Id of the consensus node this proxy fronts.
    pub consensus_node_id: u32,
}

/// A block node.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BlockNodeComponent {
    /// Shared component fields.
    #[serde(flatten)]
    pub base: BaseComponent,
}

/// A component record of any type.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ComponentRecord {
    /// A consensus node record.
    ConsensusNode(ConsensusNodeComponent),

    /// A mirror node record.
    MirrorNode(MirrorNodeComponent),

    /// A mirror node explorer record.
    MirrorNodeExplorer(MirrorNodeExplorerComponent),

    /// A relay record.
    Relay(RelayComponent),

    /// An HAProxy record.
    HaProxy(HaProxyComponent),

    /// An Envoy proxy record.
    EnvoyProxy(EnvoyProxyComponent),

    /// A block node record.
    BlockNode(BlockNodeComponent),
}

impl ComponentRecord {
    /// The shared fields of this record.
    #[must_use]
    pub const fn base(&self) -> &BaseComponent {
        match self {
            Self::ConsensusNode(c) => &c.base,
            Self::MirrorNode(c) => &c.base,
            Self::MirrorNodeExplorer(c) => &c.base,
            Self::Relay(c) => &c.base,
            Self::HaProxy(c) => &c.base,
            Self::EnvoyProxy(c) => &c.base,
            Self::BlockNode(c) => &c.base,
        }
    }

    /// Mutable access to the shared fields of this record.
    pub fn base_mut(&mut self) -> &mut BaseComponent {
        match self {
            Self::ConsensusNode(c) => &mut c.base,
            Self::MirrorNode(c) => &mut c.base,
            Self::MirrorNodeExplorer(c) => &mut c.base,
            Self::Relay(c) => &mut c.base,
            Self::HaProxy(c) => &mut c.base,
            Self::EnvoyProxy(c) => &mut c.base,
            Self::BlockNode(c) => &mut c.base,
        }
    }

    /// This record's id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.base().id
    }

    /// This record's component type.
    #[must_use]
    pub const fn component_type(&self) -> ComponentType {
        match self {
            Self::ConsensusNode(_) => ComponentType::ConsensusNode,
            Self::MirrorNode(_) => ComponentType::MirrorNode,
            Self::MirrorNodeExplorer(_) => ComponentType::MirrorNodeExplorer,
            Self::Relay(_) => ComponentType::Relay,
            Self::HaProxy(_) => ComponentType::HaProxy,
            Self::EnvoyProxy(_) => ComponentType::EnvoyProxy,
            Self::BlockNode(_) => ComponentType::BlockNode,
        }
    }

    /// This record's current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ComponentState {
        self.base().state
    }

    /// The deterministic rendered name for this record.
    ///
    /// Proxy names embed the alias of the consensus node they front, so
    /// re-computing a topology yields identical names.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::HaProxy(c) => format!(
                "{}-{}{}",
                ComponentType::HaProxy.prefix(),
                ComponentType::ConsensusNode.prefix(),
                c.consensus_node_id
            ),
            Self::EnvoyProxy(c) => format!(
                "{}-{}{}",
                ComponentType::EnvoyProxy.prefix(),
                ComponentType::ConsensusNode.prefix(),
                c.consensus_node_id
            ),
            other => format!("{}{}", other.component_type().prefix(), other.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(id: u32) -> BaseComponent {
        BaseComponent {
            id,
            cluster: "cluster-1".to_string(),
            namespace: "ns1".to_string(),
            state: ComponentState::Requested,
        }
    }

    #[test]
    fn test_names_are_deterministic() {
        let node = ComponentRecord::ConsensusNode(ConsensusNodeComponent { base: base(3) });
        assert_eq!(node.name(), "node3");

        let proxy = ComponentRecord::HaProxy(HaProxyComponent {
            base: base(0),
            consensus_node_id: 3,
        });
        assert_eq!(proxy.name(), "haproxy-node3");

        let envoy = ComponentRecord::EnvoyProxy(EnvoyProxyComponent {
            base: base(1),
            consensus_node_id: 2,
        });
        assert_eq!(envoy.name(), "envoy-proxy-node2");
    }

    #[test]
    fn test_tagged_json_round_trip() {
        let relay = ComponentRecord::Relay(RelayComponent {
            base: BaseComponent {
                id: 0,
                cluster: "cluster-1".to_string(),
                namespace: "ns1".to_string(),
                state: ComponentState::Deployed,
            },
            consensus_node_ids: vec![0, 1, 2],
        });

        let json = serde_json::to_string(&relay).unwrap();
        assert!(json.contains("\"type\":\"relay\""));

        let parsed: ComponentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(relay, parsed);
    }
}
