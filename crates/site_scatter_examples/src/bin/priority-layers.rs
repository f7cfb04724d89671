use rand::rngs::StdRng;
use rand::SeedableRng;
use site_scatter::prelude::*;
use site_scatter_examples::{init_tracing, log_event, report_outcome};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let engine = GeoEngine::default();
    let constraints = vec![
        SpatialConstraint::must_within("district", rectangle(0.0, 0.0, 600.0, 400.0)),
        SpatialConstraint::must_outside("river", rectangle(280.0, 0.0, 320.0, 400.0)),
        SpatialConstraint::prefer_within("parks", rectangle(0.0, 0.0, 200.0, 200.0), 0),
        SpatialConstraint::prefer_within("plazas", rectangle(400.0, 200.0, 600.0, 400.0), 1),
    ];
    let region = RegionBuilder::new(&engine).build(&constraints)?;
    for layer in region.layers() {
        tracing::info!(
            "Layer {:?}: {} polygons, {:.0} m².",
            layer.priority,
            layer.polygons.len(),
            layer.area()
        );
    }

    let config = PackingConfig::new(60.0)
        .with_max_distance(150.0)
        .with_target_point_count(30);
    let mut rng = StdRng::seed_from_u64(7);
    let mut sink = FnSink::new(|event| log_event(&event));

    let outcome = run_packing(config, &engine, region, &mut rng, Some(&mut sink))?;
    report_outcome(&outcome);
    Ok(())
}
