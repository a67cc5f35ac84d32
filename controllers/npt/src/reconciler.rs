//! NetworkMap reconciler: turns spec entries into NETMAP rules.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ipnet::Ipv6Net;
use tracing::{info, warn};

use api::{NetMap, NetMapStatus, NetworkMap, NetworkPointer};
use ip6tables::Ip6TablesClientTrait;
use machinery::controller::{ReconcileError, ReconcileResult, Reconciler};
use machinery::state::Client;

use crate::error::NptError;
use crate::netif;

/// Ensures private networks are mapped to public networks via Network
/// Prefix Translation.
pub struct NptReconciler {
    client: Arc<dyn Client>,
    ip6tables: Arc<dyn Ip6TablesClientTrait>,
    resync: Duration,
}

struct Rule {
    table: &'static str,
    chain: &'static str,
    spec: Vec<String>,
}

impl NptReconciler {
    pub fn new(
        client: Arc<dyn Client>,
        ip6tables: Arc<dyn Ip6TablesClientTrait>,
        resync: Duration,
    ) -> Self {
        Self {
            client,
            ip6tables,
            resync,
        }
    }

    /// Builds the rule set for every resolvable spec entry and records the
    /// resolved networks in the status. Entries that fail to resolve are
    /// logged and left out of the status; they do not fail the object.
    async fn rules(&self, netmap: &mut NetworkMap) -> Vec<Rule> {
        let mut rules = Vec::new();
        netmap.status.netmap.clear();

        let entries = netmap.spec.netmap.clone();
        for (index, entry) in entries.iter().enumerate() {
            match self.rules_for_entry(&netmap.spec.wan_interface, entry).await {
                Ok((inbound, outbound, status)) => {
                    rules.push(inbound);
                    rules.push(outbound);
                    netmap.status.netmap.push(status);
                }
                Err(err) => warn!("rule for spec.netmap[{index}]: {err}"),
            }
        }

        netmap.status.observed_generation = netmap.metadata.generation;
        rules
    }

    async fn rules_for_entry(
        &self,
        wan_interface: &str,
        entry: &NetMap,
    ) -> Result<(Rule, Rule, NetMapStatus), NptError> {
        let private = self.resolve(&entry.private).await?;
        let public = self.resolve(&entry.public).await?;

        let inbound = Rule {
            table: "nat",
            chain: "PREROUTING",
            spec: vec![
                "-i".to_string(),
                wan_interface.to_string(),
                "-d".to_string(),
                public.to_string(),
                "-j".to_string(),
                "NETMAP".to_string(),
                "--to".to_string(),
                private.to_string(),
            ],
        };
        let outbound = Rule {
            table: "nat",
            chain: "POSTROUTING",
            spec: vec![
                "-o".to_string(),
                wan_interface.to_string(),
                "-s".to_string(),
                private.to_string(),
                "-j".to_string(),
                "NETMAP".to_string(),
                "--to".to_string(),
                public.to_string(),
            ],
        };
        let status = NetMapStatus {
            private: private.to_string(),
            public: public.to_string(),
        };
        Ok((inbound, outbound, status))
    }

    async fn resolve(&self, pointer: &NetworkPointer) -> Result<Ipv6Net, NptError> {
        match pointer {
            NetworkPointer::Static(cidr) => cidr
                .parse::<Ipv6Net>()
                .map(|net| net.trunc())
                .map_err(|source| NptError::InvalidNetwork {
                    cidr: cidr.clone(),
                    source,
                }),
            NetworkPointer::Interface(name) => netif::interface_network(name).await,
        }
    }
}

#[async_trait]
impl Reconciler for NptReconciler {
    async fn reconcile(&self, key: &str) -> Result<ReconcileResult, ReconcileError> {
        let mut result = ReconcileResult::default();

        let mut netmap = NetworkMap::default();
        if let Err(err) = self.client.get(key, &mut netmap) {
            if err.is_not_found() {
                // Object is gone; nothing left to enforce.
                return Ok(result);
            }
            return Err(NptError::State(err).into());
        }

        // Come back periodically even without events.
        result.requeue_after = self.resync;

        for rule in self.rules(&mut netmap).await {
            let exists = self
                .ip6tables
                .exists(rule.table, rule.chain, &rule.spec)
                .await
                .map_err(NptError::RuleCheck)?;
            if exists {
                continue;
            }
            self.ip6tables
                .append(rule.table, rule.chain, &rule.spec)
                .await
                .map_err(NptError::RuleAppend)?;
        }

        self.client
            .update_status(&mut netmap)
            .map_err(NptError::State)?;

        info!("reconciled NetworkMap {key}");
        Ok(result)
    }
}
