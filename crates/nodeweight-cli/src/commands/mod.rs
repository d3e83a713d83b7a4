pub mod init;
pub mod replay;
pub mod resolve;

use std::path::Path;

use anyhow::Context;
use nodeweight_core::WeightConfig;

/// Load settings from `path` (or built-in defaults) and apply flag overrides.
pub fn load_config(
    path: Option<&Path>,
    annotation: Option<String>,
    default_weight: Option<u32>,
) -> anyhow::Result<WeightConfig> {
    let config = match path {
        Some(path) => WeightConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => WeightConfig::default(),
    };
    Ok(config.with_overrides(annotation, default_weight)?)
}
