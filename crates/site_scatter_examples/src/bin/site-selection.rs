use std::path::PathBuf;

use site_scatter::pipeline::{self, SiteSelectionConfig};
use site_scatter_examples::{init_tracing, report_records};

/// Reads `site_selection.json` from the working directory, falling back to the bundled
/// sample configuration.
fn config_path() -> PathBuf {
    let local = PathBuf::from("site_selection.json");
    if local.exists() {
        local
    } else {
        PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/assets/site-selection/site_selection.json"
        ))
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SiteSelectionConfig::from_path(config_path())?;
    let summary = pipeline::run(&config)?;

    report_records(&summary.records);
    tracing::info!(
        "{} points ({:?}) written to '{}'.",
        summary.accepted(),
        summary.termination,
        summary.points_path.display()
    );
    Ok(())
}
