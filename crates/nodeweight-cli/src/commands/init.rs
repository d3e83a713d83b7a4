use std::path::Path;

use anyhow::bail;
use nodeweight_core::WeightConfig;

pub fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    let output = path.join("nodeweight.toml");
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }

    std::fs::write(&output, WeightConfig::scaffold().to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}
