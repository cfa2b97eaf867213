use std::path::Path;

use anyhow::{Context, Result, bail};
use frontdesk::config::Config;

pub fn cmd_config_show(config: &Config) -> Result<()> {
  match Config::config_path() {
    Some(path) if path.exists() => println!("# {}", path.display()),
    Some(path) => println!("# {} (not found, using defaults)", path.display()),
    None => println!("# no config directory, using defaults"),
  }
  let mut shown = config.clone();
  shown.realtime.auth_token = shown.realtime.auth_token.map(|_| "***".to_string());
  shown.relational.api_key = shown.relational.api_key.map(|_| "***".to_string());
  println!("{}", toml::to_string_pretty(&shown).context("Failed to render config")?);
  Ok(())
}

pub fn cmd_config_init(force: bool) -> Result<()> {
  let Some(path) = Config::config_path() else {
    bail!("Could not determine the config directory");
  };
  write_template(&path, force)?;
  println!("Wrote {}", path.display());
  Ok(())
}

fn write_template(path: &Path, force: bool) -> Result<()> {
  if path.exists() && !force {
    bail!("{} already exists (use --force to overwrite)", path.display());
  }
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }
  std::fs::write(path, Config::generate_template()).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(())
}
