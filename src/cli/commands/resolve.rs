//! Resolve command.

use anyhow::Result;

use crate::mount::{Direction, PathResolver};

/// Run resolve command - translate one path with the current environment.
pub fn run_resolve(path: &str, revert: bool) -> Result<()> {
    let resolver = PathResolver::from_env()?;
    let direction = if revert {
        Direction::ContainerToHost
    } else {
        Direction::HostToContainer
    };

    if !resolver.in_container() {
        tracing::info!("[resolve] not running in a container, paths resolve to themselves");
    }

    println!("{}", resolver.resolve(path, direction)?);
    Ok(())
}
