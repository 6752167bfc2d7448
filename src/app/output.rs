use crate::domain::model::Registry;
use crate::utils::error::Result;

/// One domain name per line.
pub fn render_domain_list(registry: &Registry) -> String {
    registry
        .iter()
        .map(|(name, _)| format!("{}\n", name))
        .collect()
}

/// Indented JSON of the whole registry.
pub fn render_json(registry: &Registry) -> Result<String> {
    let mut json = serde_json::to_string_pretty(registry)?;
    json.push('\n');
    Ok(json)
}
