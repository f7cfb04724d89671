use geo::coord;
use rand::rngs::StdRng;
use rand::SeedableRng;
use site_scatter::prelude::*;
use site_scatter_examples::{init_tracing, report_outcome};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // A 1 km square site with a pond in the middle.
    let constraints = vec![
        SpatialConstraint::must_within("site", rectangle(0.0, 0.0, 1000.0, 1000.0)),
        SpatialConstraint::must_outside("pond", disk(coord! { x: 500.0, y: 500.0 }, 100.0, 64)),
    ];

    let config = PackingConfig::new(50.0).with_target_point_count(5);
    let engine = GeoEngine::default();
    let mut rng = StdRng::seed_from_u64(42);

    let outcome = pack_constraints(&constraints, config, &engine, &mut rng)?;
    report_outcome(&outcome);
    Ok(())
}
