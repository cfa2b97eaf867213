use anyhow::{Context, Result};
use frontdesk::{config::Config, session::Session};
use tracing::warn;

use super::open;

/// Sign in and pull the hospital's queue from the realtime store
pub async fn cmd_login(config: &Config, uid: &str, email: &str) -> Result<()> {
  let desk = open(config)?;
  let handle = desk.handle();

  handle
    .sign_in(Session::new(uid, email))
    .await
    .context("Failed to sign in")?;
  println!("Signed in as {}", uid);

  match handle.refresh().await {
    Ok(true) => println!("Loaded the queue from the realtime store"),
    Ok(false) => {}
    Err(e) => warn!(error = %e, "Could not load the queue from the realtime store"),
  }

  desk.close();
  Ok(())
}

pub async fn cmd_logout(config: &Config) -> Result<()> {
  let desk = open(config)?;
  desk.handle().sign_out().await.context("Failed to sign out")?;
  println!("Signed out");
  desk.close();
  Ok(())
}
