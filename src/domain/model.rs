use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A registered domain name such as `example.com`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainName(String);

impl DomainName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Portal path fragment with the labels in reverse order.
    ///
    /// `example.com` becomes `*/com/example/`.
    pub fn locator(&self) -> Locator {
        let labels: Vec<&str> = self.0.split('.').rev().collect();
        Locator(format!("*/{}/", labels.join("/")))
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DomainName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for DomainName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    #[serde(rename = "Id")]
    pub id: u32,
    #[serde(rename = "Rname")]
    pub name: String,
    #[serde(rename = "Rttl")]
    pub ttl: u32,
    #[serde(rename = "Rtype")]
    pub rtype: String,
    #[serde(rename = "Rdata")]
    pub data: String,
}

/// Contract page fields, label to value. The portal decides which labels exist.
pub type ContractInfo = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(rename = "Name")]
    pub name: DomainName,
    #[serde(rename = "Locator")]
    pub locator: Locator,
    /// Link target as rendered in the domain list, if the domain was listed.
    #[serde(rename = "Href", default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(rename = "RRs", default)]
    pub records: BTreeMap<u32, ResourceRecord>,
    #[serde(rename = "Contract", default)]
    pub contract: Option<ContractInfo>,
}

impl Domain {
    pub fn new(name: DomainName) -> Self {
        let locator = name.locator();
        Self {
            name,
            locator,
            href: None,
            records: BTreeMap::new(),
            contract: None,
        }
    }

    pub fn listed(name: DomainName, href: String) -> Self {
        Self {
            href: Some(href),
            ..Self::new(name)
        }
    }
}

/// All domains known to this run, keyed and ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    domains: BTreeMap<DomainName, Domain>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn get(&self, name: &DomainName) -> Option<&Domain> {
        self.domains.get(name)
    }

    pub fn contains(&self, name: &DomainName) -> bool {
        self.domains.contains_key(name)
    }

    pub fn names(&self) -> Vec<DomainName> {
        self.domains.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DomainName, &Domain)> {
        self.domains.iter()
    }

    /// Merges a finished domain-list crawl. Existing entries keep their records
    /// and contract; only the list href is refreshed.
    pub fn merge_listing(&mut self, listing: BTreeMap<DomainName, String>) {
        for (name, href) in listing {
            self.domains
                .entry(name.clone())
                .and_modify(|domain| domain.href = Some(href.clone()))
                .or_insert_with(|| Domain::listed(name, href));
        }
    }

    /// Replaces the record set of `fetched.name` wholesale, creating the entry
    /// when the domain was never listed.
    pub fn store_records(&mut self, fetched: Domain) {
        match self.domains.get_mut(&fetched.name) {
            Some(existing) => existing.records = fetched.records,
            None => {
                self.domains.insert(fetched.name.clone(), fetched);
            }
        }
    }

    /// Attaches contract info to a known domain. Returns `false` and stores
    /// nothing when the domain is not in the registry.
    pub fn store_contract(&mut self, name: &DomainName, contract: ContractInfo) -> bool {
        match self.domains.get_mut(name) {
            Some(domain) => {
                domain.contract = Some(contract);
                true
            }
            None => false,
        }
    }
}
