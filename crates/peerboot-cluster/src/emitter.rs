//! Bootstrap parameters for the consensus process

use peerboot_core::ReconciliationResult;

pub const NAME_KEY: &str = "ETCD_NAME";
pub const INITIAL_CLUSTER_STATE_KEY: &str = "ETCD_INITIAL_CLUSTER_STATE";
pub const INITIAL_CLUSTER_KEY: &str = "ETCD_INITIAL_CLUSTER";

/// Named startup parameters, in a fixed order
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BootstrapParams {
    entries: Vec<(&'static str, String)>,
}

impl BootstrapParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Map a reconciliation result onto the consensus process' parameters
pub fn emit(result: &ReconciliationResult) -> BootstrapParams {
    BootstrapParams {
        entries: vec![
            (NAME_KEY, result.self_name.clone()),
            (INITIAL_CLUSTER_STATE_KEY, result.cluster_state.to_string()),
            (INITIAL_CLUSTER_KEY, result.initial_cluster.join(",")),
        ],
    }
}
