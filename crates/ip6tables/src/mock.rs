//! Mock client for unit testing reconcilers without a kernel.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::Ip6TablesError;
use crate::ip6tables_trait::Ip6TablesClientTrait;

/// A fully specified rule, as the driver sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub table: String,
    pub chain: String,
    pub spec: Vec<String>,
}

/// In-memory stand-in for [`crate::Ip6TablesClient`].
///
/// Clones share state, so tests can keep a handle for assertions while the
/// reconciler owns another.
#[derive(Clone, Default)]
pub struct MockIp6TablesClient {
    rules: Arc<Mutex<Vec<Rule>>>,
    appended: Arc<Mutex<Vec<Rule>>>,
}

impl MockIp6TablesClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeds a rule, as if something had installed it already.
    pub fn insert_rule(&self, table: &str, chain: &str, spec: &[&str]) {
        self.rules
            .lock()
            .expect("mock lock poisoned")
            .push(Rule {
                table: table.to_string(),
                chain: chain.to_string(),
                spec: spec.iter().map(|s| s.to_string()).collect(),
            });
    }

    /// Every rule appended through the client, in call order.
    pub fn appended(&self) -> Vec<Rule> {
        self.appended.lock().expect("mock lock poisoned").clone()
    }

    /// The rules currently present.
    pub fn rules(&self) -> Vec<Rule> {
        self.rules.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl Ip6TablesClientTrait for MockIp6TablesClient {
    async fn exists(
        &self,
        table: &str,
        chain: &str,
        rule_spec: &[String],
    ) -> Result<bool, Ip6TablesError> {
        let rules = self.rules.lock().expect("mock lock poisoned");
        Ok(rules
            .iter()
            .any(|rule| rule.table == table && rule.chain == chain && rule.spec == rule_spec))
    }

    async fn append(
        &self,
        table: &str,
        chain: &str,
        rule_spec: &[String],
    ) -> Result<(), Ip6TablesError> {
        let rule = Rule {
            table: table.to_string(),
            chain: chain.to_string(),
            spec: rule_spec.to_vec(),
        };
        self.rules
            .lock()
            .expect("mock lock poisoned")
            .push(rule.clone());
        self.appended.lock().expect("mock lock poisoned").push(rule);
        Ok(())
    }
}
