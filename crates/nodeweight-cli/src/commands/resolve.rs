use std::collections::HashMap;

use anyhow::bail;
use nodeweight_cache::resolve_node_weight;
use nodeweight_core::WeightConfig;

pub fn resolve(annotations: &[String], config: &WeightConfig) -> anyhow::Result<()> {
    let annotations = parse_annotations(annotations)?;
    let weight = resolve_node_weight(&annotations, config.annotation(), config.default_weight());
    println!("{weight}");
    Ok(())
}

/// Parse `key=value` pairs. The value may itself contain `=`.
fn parse_annotations(pairs: &[String]) -> anyhow::Result<HashMap<String, String>> {
    let mut annotations = HashMap::with_capacity(pairs.len());
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("annotation {pair:?} is not in key=value form");
        };
        if key.is_empty() {
            bail!("annotation {pair:?} has an empty key");
        }
        annotations.insert(key.to_string(), value.to_string());
    }
    Ok(annotations)
}
