//! Weighted load-balancer endpoint groups.
//!
//! Plain-data endpoint assignments built from node weights. A weight of 0
//! means "unweighted" and is left unset rather than written out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Weight value meaning "no weight set".
pub const NO_WEIGHT: u32 = 0;

/// A reachable `address:port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    pub port: u16,
}

impl Address {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Full address string.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// A single backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LbEndpoint {
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancing_weight: Option<u32>,
}

/// A group of endpoints sharing one locality weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalityLbEndpoints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    pub lb_endpoints: Vec<LbEndpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancing_weight: Option<u32>,
}

/// Endpoint assignment for one upstream cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterLoadAssignment {
    pub cluster_name: String,
    pub endpoints: Vec<LocalityLbEndpoints>,
}

fn weight_or_none(weight: u32) -> Option<u32> {
    (weight != NO_WEIGHT).then_some(weight)
}

/// Endpoint with its weight set, unless `weight` is 0.
pub fn weighted_lb_endpoint(weight: u32, addr: Address) -> LbEndpoint {
    LbEndpoint {
        address: addr,
        load_balancing_weight: weight_or_none(weight),
    }
}

pub fn lb_endpoint(addr: Address) -> LbEndpoint {
    weighted_lb_endpoint(NO_WEIGHT, addr)
}

/// One unweighted locality holding an endpoint per address.
pub fn endpoints(addrs: impl IntoIterator<Item = Address>) -> Vec<LocalityLbEndpoints> {
    weighted_endpoints(NO_WEIGHT, addrs)
}

/// One locality holding an endpoint per address.
///
/// The weight applies to the locality as a whole; the endpoints inside
/// are unweighted.
pub fn weighted_endpoints(weight: u32, addrs: impl IntoIterator<Item = Address>) -> Vec<LocalityLbEndpoints> {
    vec![LocalityLbEndpoints {
        locality: None,
        lb_endpoints: addrs.into_iter().map(lb_endpoint).collect(),
        load_balancing_weight: weight_or_none(weight),
    }]
}

/// Assignment with a single locality of the supplied addresses.
pub fn cluster_load_assignment(name: &str, addrs: Vec<Address>) -> ClusterLoadAssignment {
    let endpoints = if addrs.is_empty() {
        Vec::new()
    } else {
        endpoints(addrs)
    };
    ClusterLoadAssignment {
        cluster_name: name.to_string(),
        endpoints,
    }
}

/// Backend addresses grouped by the node they run on.
#[derive(Debug, Clone, Default)]
pub struct NodeEndpoints {
    by_node: BTreeMap<String, Vec<Address>>,
}

impl NodeEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: impl Into<String>, addr: Address) {
        self.by_node.entry(node.into()).or_default().push(addr);
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    /// Build an assignment with one locality per node, weighted by `weight_of`.
    ///
    /// Localities are ordered by node name so repeated builds compare equal.
    pub fn build(&self, cluster_name: &str, weight_of: impl Fn(&str) -> u32) -> ClusterLoadAssignment {
        let endpoints = self
            .by_node
            .iter()
            .flat_map(|(node, addrs)| {
                weighted_endpoints(weight_of(node.as_str()), addrs.iter().cloned())
                    .into_iter()
                    .map(move |mut group| {
                        group.locality = Some(node.clone());
                        group
                    })
            })
            .collect();

        ClusterLoadAssignment {
            cluster_name: cluster_name.to_string(),
            endpoints,
        }
    }
}

impl<N: Into<String>> FromIterator<(N, Address)> for NodeEndpoints {
    fn from_iter<I: IntoIterator<Item = (N, Address)>>(iter: I) -> Self {
        let mut endpoints = NodeEndpoints::new();
        for (node, addr) in iter {
            endpoints.insert(node, addr);
        }
        endpoints
    }
}
