//! Example building a small channel hierarchy and tracing its tree
//!
//! Run with:
//! ```bash
//! cargo run --example channel_tree
//! ```

use grouptree_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use grouptree_core::{Hierarchy, HierarchyConfig, HierarchyError, MapMode};
use tracing::info;

fn main() -> Result<(), HierarchyError> {
    // Trace level shows the tree lines reported by the default observer
    let config = LogConfig::new(LogLevel::Trace).with_target(false);
    init_logging_with_config(config).expect("Failed to initialize logging");

    let hierarchy = Hierarchy::new(HierarchyConfig::default());
    let server = hierarchy.new_list()?;

    let general = hierarchy.create("general", "chat")?;
    let dev = hierarchy.create("dev", "chat")?;
    let rust = hierarchy.create("rust", "chat")?;
    hierarchy.append(server, general)?;
    hierarchy.append(server, dev)?;
    hierarchy.append(hierarchy.node(dev)?.sublist(), rust)?;

    for (name, channel) in [("alice", general), ("bob", general), ("carol", rust)] {
        let user = hierarchy.create(name, "user")?;
        hierarchy.append(hierarchy.node(channel)?.users(), user)?;
    }

    let snapshot = hierarchy.tree(server)?;
    info!(json = %serde_json::to_string(&snapshot).unwrap_or_default(), "snapshot");

    // Broadcast to everyone below the server
    hierarchy.map_list(server, MapMode::Recursive, |user| {
        info!(user = user.name(), "deliver");
        Ok::<_, HierarchyError>(())
    })?;

    print!("{}", hierarchy.render(server)?);
    Ok(())
}
