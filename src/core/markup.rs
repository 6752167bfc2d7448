//! Extraction rules for the portal's rendered HTML.
//!
//! Every selector, element-id pattern and marker text the scraper depends on
//! lives in [`MarkupRules`]. A markup change on the portal side should only
//! require editing [`MarkupRules::REGFISH`].

use crate::domain::model::{ContractInfo, DomainName, ResourceRecord};
use crate::utils::error::{Result, ScrapeError};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// TTL the portal applies when a record shows none.
pub const DEFAULT_TTL: u32 = 86400;

#[derive(Debug, Clone)]
pub struct MarkupRules {
    /// Element whose text reads `login_marker_text` only while logged in.
    pub login_marker: &'static str,
    pub login_marker_text: &'static str,
    pub list_row: &'static str,
    /// Link inside a list row: text is the domain name, href its portal path.
    pub list_link: &'static str,
    pub pagination_control: &'static str,
    pub next_glyph: &'static str,
    pub zone_table: &'static str,
    pub zone_rows: &'static str,
    /// Row id pattern; capture group 1 is the record id.
    pub record_row_id: &'static str,
    /// Cell selector template, `{id}` and `{field}` are substituted.
    pub record_field: &'static str,
    /// SOA rows carry their data in this cell instead of the data field.
    pub soa_data_cell: &'static str,
    pub contract_table: &'static str,
    pub contract_rows: &'static str,
    pub contract_label_cell: &'static str,
    pub contract_value_cell: &'static str,
}

impl MarkupRules {
    pub const REGFISH: MarkupRules = MarkupRules {
        login_marker: "div.reb:nth-child(1)",
        login_marker_text: "Ausloggen",
        list_row: "tr.dlistitem",
        list_link: "td.col_domain > a",
        pagination_control: "div.re > div > a",
        next_glyph: "»",
        zone_table: "#dnszone",
        zone_rows: "#dnszone > * > tr",
        record_row_id: r"^a_(\d+)$",
        record_field: "#rr_{id}_{field}",
        soa_data_cell: "td:nth-child(5)",
        contract_table: "table.datastyle",
        contract_rows: "table.datastyle > tbody > tr",
        contract_label_cell: "td:nth-child(1)",
        contract_value_cell: "td:nth-child(2)",
    };
}

impl Default for MarkupRules {
    fn default() -> Self {
        Self::REGFISH
    }
}

/// One row of the domain list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedDomain {
    pub name: DomainName,
    pub href: String,
}

/// A parsed portal page.
///
/// Wraps [`scraper::Html`], which is not `Send`; parse, extract and drop it
/// between awaits.
pub struct PortalDocument {
    html: Html,
}

impl PortalDocument {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    pub fn is_logged_in(&self, rules: &MarkupRules) -> Result<bool> {
        let marker = selector(rules.login_marker)?;
        Ok(self
            .html
            .select(&marker)
            .next()
            .map(|el| text_of(&el) == rules.login_marker_text)
            .unwrap_or(false))
    }

    pub fn listed_domains(&self, rules: &MarkupRules) -> Result<Vec<ListedDomain>> {
        let row_selector = selector(rules.list_row)?;
        let link_selector = selector(rules.list_link)?;

        let mut listed = Vec::new();
        for row in self.html.select(&row_selector) {
            let Some(link) = row.select(&link_selector).next() else {
                continue;
            };
            let name = text_of(&link);
            if name.is_empty() {
                continue;
            }
            listed.push(ListedDomain {
                name: DomainName::new(name),
                href: link.value().attr("href").unwrap_or_default().to_string(),
            });
        }
        Ok(listed)
    }

    pub fn has_next_page(&self, rules: &MarkupRules) -> Result<bool> {
        let control = selector(rules.pagination_control)?;
        Ok(self
            .html
            .select(&control)
            .any(|el| text_of(&el) == rules.next_glyph))
    }

    pub fn records(&self, rules: &MarkupRules) -> Result<BTreeMap<u32, ResourceRecord>> {
        self.require(rules.zone_table, "DNS zone page")?;

        let row_selector = selector(rules.zone_rows)?;
        let soa_cell = selector(rules.soa_data_cell)?;
        let row_id = Regex::new(rules.record_row_id)
            .map_err(|e| ScrapeError::parse("record row id pattern", e.to_string()))?;

        let mut records = BTreeMap::new();
        for row in self.html.select(&row_selector) {
            let Some(id) = row
                .value()
                .id()
                .and_then(|value| row_id.captures(value))
                .and_then(|caps| caps[1].parse::<u32>().ok())
            else {
                continue;
            };

            let field = |name: &str| -> Result<String> {
                let css = rules
                    .record_field
                    .replace("{id}", &id.to_string())
                    .replace("{field}", name);
                let cell = selector(&css)?;
                Ok(row.select(&cell).next().map(|el| text_of(&el)).unwrap_or_default())
            };

            let name = field("name")?;
            let mut ttl = parse_ttl(&field("ttl")?);
            let mut rtype = field("type")?;
            let mut data = field("data")?;

            if rtype.is_empty() {
                rtype = "SOA".to_string();
                ttl = 0;
                data = row
                    .select(&soa_cell)
                    .next()
                    .map(|el| collapse_newlines(&el.text().collect::<Vec<_>>().join("\n")))
                    .unwrap_or_default();
            }

            records.insert(
                id,
                ResourceRecord {
                    id,
                    name,
                    ttl,
                    rtype,
                    data,
                },
            );
        }
        Ok(records)
    }

    pub fn contract(&self, rules: &MarkupRules) -> Result<ContractInfo> {
        self.require(rules.contract_table, "contract page")?;

        let row_selector = selector(rules.contract_rows)?;
        let label_cell = selector(rules.contract_label_cell)?;
        let value_cell = selector(rules.contract_value_cell)?;

        let mut contract = ContractInfo::new();
        for row in self.html.select(&row_selector) {
            let raw_label = row.select(&label_cell).next().map(|el| text_of(&el)).unwrap_or_default();
            let label = raw_label.strip_suffix(':').unwrap_or(&raw_label).trim();
            if label.is_empty() {
                continue;
            }
            let value = row.select(&value_cell).next().map(|el| text_of(&el)).unwrap_or_default();
            contract.insert(label.to_string(), value);
        }
        Ok(contract)
    }

    fn require(&self, css: &str, context: &str) -> Result<()> {
        let sel = selector(css)?;
        if self.html.select(&sel).next().is_none() {
            return Err(ScrapeError::parse(context, format!("no element matches '{}'", css)));
        }
        Ok(())
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::parse("selector", format!("'{}': {}", css, e)))
}

fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Empty, zero and unreadable TTLs all mean the portal default.
fn parse_ttl(raw: &str) -> u32 {
    raw.parse::<u32>()
        .ok()
        .filter(|ttl| *ttl != 0)
        .unwrap_or(DEFAULT_TTL)
}

/// Each line trimmed, blank lines dropped, the rest joined by one space.
fn collapse_newlines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
