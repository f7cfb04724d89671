use site_scatter::enrich::OutputRecord;
use site_scatter::packing::{PackingEvent, PackingOutcome};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber honoring `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Logs one line per accepted point and a closing summary.
pub fn report_outcome(outcome: &PackingOutcome) {
    for point in &outcome.accepted {
        info!(
            "#{:<3} ({:>9.2}, {:>9.2}) priority {:?}",
            point.id, point.position.x, point.position.y, point.priority
        );
    }
    info!(
        "{} points, {:?} after {} steps and {} draws; {:.1} area left.",
        outcome.len(),
        outcome.termination,
        outcome.iterations,
        outcome.samples_drawn,
        outcome.region.area()
    );
}

/// Logs enriched records with their attributes.
pub fn report_records(records: &[OutputRecord]) {
    for record in records {
        let attributes: Vec<String> = record
            .attributes
            .iter()
            .map(|(name, value)| format!("{name}={value:?}"))
            .collect();
        info!(
            "({:.6}, {:.6}) {}",
            record.longitude,
            record.latitude,
            attributes.join(" ")
        );
    }
}

/// Event sink callback that logs region shrinkage and skipped start points.
pub fn log_event(event: &PackingEvent) {
    match event {
        PackingEvent::RegionShrunk {
            area_before,
            area_after,
            layer_count,
        } => {
            info!("Region {area_before:.1} -> {area_after:.1} across {layer_count} layers.");
        }
        PackingEvent::StartPointRejected { position } => {
            warn!(
                "Start point ({:.1}, {:.1}) is not feasible; sampling instead.",
                position.x, position.y
            );
        }
        _ => {}
    }
}
