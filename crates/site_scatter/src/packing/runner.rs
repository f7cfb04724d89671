//! Greedy packing loop: sample, accept, shrink, repeat.
use geo::Coord;
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::constraint::SpatialConstraint;
use crate::error::Result;
use crate::geometry::{Geometry, GeometryEngine};
use crate::packing::config::PackingConfig;
use crate::packing::events::{EventSink, PackingEvent, PackingEventKind};
use crate::packing::state::{AcceptedPoint, GenerationState, PackingState, Termination};
use crate::region::{FeasibilityRegion, RegionBuilder};
use crate::sampling::{PriorityScanSampler, RegionSampler};

/// Result of a finished packing run.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct PackingOutcome {
    /// Accepted points in acceptance order.
    pub accepted: Vec<AcceptedPoint>,
    /// Region left over after the last acceptance.
    pub region: FeasibilityRegion,
    /// Why the loop stopped.
    pub termination: Termination,
    /// Sampling steps performed.
    pub iterations: usize,
    /// Random draws spent across all steps.
    pub samples_drawn: usize,
}

impl PackingOutcome {
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// Whether fewer points than requested were placed.
    pub fn is_partial(&self) -> bool {
        matches!(
            self.termination,
            Termination::SamplingExhausted | Termination::IterationLimit
        )
    }
}

/// The packing state machine.
///
/// Owns the [`GenerationState`]; the region is replaced by a new snapshot after every
/// acceptance and nothing else holds a reference to it.
pub struct PackingLoop<'a> {
    config: PackingConfig,
    builder: RegionBuilder<'a>,
    sampler: Box<dyn RegionSampler + 'a>,
    generation: GenerationState,
    phase: PackingState,
    start_point: Option<Coord<f64>>,
    reach: Option<Geometry>,
    iterations: usize,
    samples_drawn: usize,
    started: bool,
}

impl<'a> PackingLoop<'a> {
    /// Creates a loop over `region`, validating `config` first.
    pub fn try_new(
        config: PackingConfig,
        engine: &'a dyn GeometryEngine,
        region: FeasibilityRegion,
    ) -> Result<Self> {
        config.validate()?;
        let sampler = PriorityScanSampler::new(config.max_attempts);
        Ok(Self {
            config,
            builder: RegionBuilder::new(engine),
            sampler: Box::new(sampler),
            generation: GenerationState::new(region),
            phase: PackingState::Sampling,
            start_point: None,
            reach: None,
            iterations: 0,
            samples_drawn: 0,
            started: false,
        })
    }

    /// Replaces the default [`PriorityScanSampler`].
    pub fn with_sampler<S: RegionSampler + 'a>(mut self, sampler: S) -> Self {
        self.sampler = Box::new(sampler);
        self
    }

    /// Seeds the run with `position`, in working coordinates.
    ///
    /// The first step accepts it as point 0 when the region contains it. Otherwise it is
    /// skipped with a [`PackingEvent::StartPointRejected`] and sampling starts as usual.
    pub fn with_start_point(mut self, position: Coord<f64>) -> Self {
        self.start_point = Some(position);
        self
    }

    pub fn config(&self) -> &PackingConfig {
        &self.config
    }

    pub fn state(&self) -> PackingState {
        self.phase
    }

    pub fn generation(&self) -> &GenerationState {
        &self.generation
    }

    pub fn accepted(&self) -> &[AcceptedPoint] {
        &self.generation.accepted
    }

    pub fn region(&self) -> &FeasibilityRegion {
        &self.generation.region
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Performs one state transition and returns the new state.
    ///
    /// Terminal states are sticky: stepping a finished loop is a no-op.
    pub fn step(&mut self, rng: &mut dyn RngCore, sink: &mut dyn EventSink) -> PackingState {
        if self.phase.is_terminal() {
            return self.phase;
        }
        if !self.started {
            self.started = true;
            self.announce_start(sink);
        }

        let current = self.phase;
        self.phase = match current {
            PackingState::Sampling => self.sample_once(rng, sink),
            PackingState::Accepted => self.after_accept(),
            terminal => terminal,
        };

        if let Some(termination) = self.phase.termination() {
            info!(
                "Packing finished: {} point(s), {:?} after {} step(s).",
                self.generation.accepted.len(),
                termination,
                self.iterations
            );
            if sink.wants(PackingEventKind::RunFinished) {
                sink.send(PackingEvent::RunFinished {
                    accepted: self.generation.accepted.len(),
                    termination,
                    iterations: self.iterations,
                });
            }
        }
        self.phase
    }

    /// Runs to completion.
    pub fn run<R: RngCore>(self, rng: &mut R) -> PackingOutcome {
        self.run_with_events(rng, &mut ())
    }

    /// Runs to completion, reporting progress to `sink`.
    pub fn run_with_events<R: RngCore>(
        mut self,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> PackingOutcome {
        while !self.step(rng, sink).is_terminal() {}
        self.into_outcome()
    }

    /// Converts the loop into its outcome. A loop that has not terminated reports
    /// [`Termination::IterationLimit`].
    pub fn into_outcome(self) -> PackingOutcome {
        PackingOutcome {
            termination: self
                .phase
                .termination()
                .unwrap_or(Termination::IterationLimit),
            accepted: self.generation.accepted,
            region: self.generation.region,
            iterations: self.iterations,
            samples_drawn: self.samples_drawn,
        }
    }

    fn announce_start(&self, sink: &mut dyn EventSink) {
        let region = &self.generation.region;
        info!(
            "Packing started: min_distance {} | target {:?} | {} layer(s), {} polygon(s).",
            self.config.min_distance,
            self.config.target_point_count,
            region.layer_count(),
            region.polygon_count()
        );
        if sink.wants(PackingEventKind::RunStarted) {
            sink.send(PackingEvent::RunStarted {
                config: self.config.clone(),
                layer_count: region.layer_count(),
                area: region.area(),
            });
        }
    }

    fn target_reached(&self) -> bool {
        self.config
            .target_point_count
            .is_some_and(|target| self.generation.accepted.len() >= target)
    }

    fn sample_once(&mut self, rng: &mut dyn RngCore, sink: &mut dyn EventSink) -> PackingState {
        if self.target_reached() {
            return PackingState::Done(Termination::TargetReached);
        }
        if self.generation.region.is_empty() {
            return PackingState::Done(Termination::RegionEmpty);
        }
        if self
            .config
            .max_iterations
            .is_some_and(|cap| self.iterations >= cap)
        {
            return PackingState::Done(Termination::IterationLimit);
        }
        if let Some(start) = self.start_point.take() {
            if self.generation.region.contains(start) {
                let layer = self.generation.region.layer_of(start);
                self.accept(start, layer, 0, sink);
                return PackingState::Accepted;
            }
            warn!(
                "Start point ({:.3}, {:.3}) lies outside the region; sampling instead.",
                start.x, start.y
            );
            if sink.wants(PackingEventKind::StartPointRejected) {
                sink.send(PackingEvent::StartPointRejected { position: start });
            }
        }
        self.iterations += 1;

        let engine = self.builder.engine();
        let outcome = match &self.reach {
            Some(reach) => {
                let reachable = self.builder.clip(&self.generation.region, reach);
                self.sampler.sample(engine, &reachable, rng)
            }
            None => self.sampler.sample(engine, &self.generation.region, rng),
        };
        self.samples_drawn += outcome.attempts();

        let Some(sample) = outcome.sample() else {
            debug!(
                "Sampler exhausted after {} draw(s) with {} point(s) accepted.",
                outcome.attempts(),
                self.generation.accepted.len()
            );
            if sink.wants(PackingEventKind::SamplingFailed) {
                sink.send(PackingEvent::SamplingFailed {
                    attempts: outcome.attempts(),
                });
            }
            return PackingState::Exhausted;
        };

        // Layer indices of a clipped region may not line up with the full region.
        let layer = if self.reach.is_some() {
            self.generation.region.layer_of(sample.position)
        } else {
            Some(sample.layer)
        };
        self.accept(sample.position, layer, sample.attempts, sink);
        PackingState::Accepted
    }

    /// Records a point, removes its exclusion disk and extends the reach area.
    fn accept(
        &mut self,
        position: Coord<f64>,
        layer: Option<usize>,
        attempts: usize,
        sink: &mut dyn EventSink,
    ) {
        let engine = self.builder.engine();
        let region = &self.generation.region;
        let point = AcceptedPoint {
            id: self.generation.accepted.len(),
            position,
            priority: layer
                .and_then(|i| region.layers().get(i))
                .and_then(|l| l.priority),
        };
        self.generation.accepted.push(point);
        debug!(
            "Accepted point {} at ({:.3}, {:.3}), priority {:?}.",
            point.id, point.position.x, point.position.y, point.priority
        );
        if sink.wants(PackingEventKind::PointAccepted) {
            sink.send(PackingEvent::PointAccepted { point, attempts });
        }

        let disk = Geometry::new(vec![
            engine.buffer_point(point.position, self.config.min_distance),
        ]);
        let track_area = sink.wants(PackingEventKind::RegionShrunk);
        let area_before = if track_area {
            self.generation.region.area()
        } else {
            0.0
        };
        self.generation.region = self.builder.shrink(&self.generation.region, &disk);
        if track_area {
            sink.send(PackingEvent::RegionShrunk {
                area_before,
                area_after: self.generation.region.area(),
                layer_count: self.generation.region.layer_count(),
            });
        }

        // The reach area must never extend past max_distance, so it uses inner disks.
        if let Some(max_distance) = self.config.max_distance {
            let around = Geometry::new(vec![engine.inner_disk(point.position, max_distance)]);
            self.reach = Some(match self.reach.take() {
                Some(reach) => engine.union(&reach, &around),
                None => around,
            });
        }
    }

    fn after_accept(&self) -> PackingState {
        if self.target_reached() {
            PackingState::Done(Termination::TargetReached)
        } else if self.generation.region.is_empty() {
            PackingState::Done(Termination::RegionEmpty)
        } else {
            PackingState::Sampling
        }
    }
}

/// Runs the packing loop over a prepared region.
pub fn run_packing<R: RngCore>(
    config: PackingConfig,
    engine: &dyn GeometryEngine,
    region: FeasibilityRegion,
    rng: &mut R,
    sink: Option<&mut dyn EventSink>,
) -> Result<PackingOutcome> {
    let packing = PackingLoop::try_new(config, engine, region)?;
    Ok(match sink {
        Some(s) => packing.run_with_events(rng, s),
        None => packing.run(rng),
    })
}

/// Builds the region from `constraints` and packs it.
pub fn pack_constraints<R: RngCore>(
    constraints: &[SpatialConstraint],
    config: PackingConfig,
    engine: &dyn GeometryEngine,
    rng: &mut R,
) -> Result<PackingOutcome> {
    config.validate()?;
    let region = RegionBuilder::new(engine).build(constraints)?;
    run_packing(config, engine, region, rng, None)
}

#[cfg(test)]
mod tests {
    use geo::{coord, Distance, Euclidean, Point};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::error::Error;
    use crate::geometry::shapes::rectangle;
    use crate::geometry::GeoEngine;
    use crate::packing::events::VecSink;
    use crate::region::RegionLayer;
    use crate::sampling::{Sample, SampleOutcome};

    fn square_region(size: f64) -> FeasibilityRegion {
        FeasibilityRegion::single(vec![rectangle(0.0, 0.0, size, size)])
    }

    fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
        Euclidean.distance(Point::from(a), Point::from(b))
    }

    fn worst_reach(points: &[AcceptedPoint]) -> f64 {
        let mut worst: f64 = 0.0;
        for (i, p) in points.iter().enumerate().skip(1) {
            let nearest = points[..i]
                .iter()
                .map(|q| distance(p.position, q.position))
                .fold(f64::INFINITY, f64::min);
            worst = worst.max(nearest);
        }
        worst
    }

    fn min_pairwise(points: &[AcceptedPoint]) -> f64 {
        let mut min = f64::MAX;
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                min = min.min(distance(points[i].position, points[j].position));
            }
        }
        min
    }

    #[test]
    fn try_new_validates_config() {
        let engine = GeoEngine::new();
        let result = PackingLoop::try_new(PackingConfig::new(-1.0), &engine, square_region(10.0));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn reaches_target_with_spacing() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(42);
        let config = PackingConfig::new(10.0).with_target_point_count(8);
        let outcome = run_packing(config, &engine, square_region(100.0), &mut rng, None)
            .expect("outcome");
        assert_eq!(outcome.termination, Termination::TargetReached);
        assert_eq!(outcome.len(), 8);
        assert!(min_pairwise(&outcome.accepted) >= 10.0 - 1e-6);
        for (i, p) in outcome.accepted.iter().enumerate() {
            assert_eq!(p.id, i);
        }
    }

    #[test]
    fn fills_region_until_exhausted_without_target() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(5);
        let config = PackingConfig::new(20.0).with_max_attempts(200);
        let outcome = run_packing(config, &engine, square_region(100.0), &mut rng, None)
            .expect("outcome");
        assert!(matches!(
            outcome.termination,
            Termination::RegionEmpty | Termination::SamplingExhausted
        ));
        // A 100x100 square packs at least a handful of 20-unit-separated points and at
        // most as many as disjoint 10-radius disks fit in the 120x120 grown square.
        assert!(outcome.len() >= 8);
        assert!(outcome.len() <= 46);
        assert!(min_pairwise(&outcome.accepted) >= 20.0 - 1e-6);
    }

    #[test]
    fn zero_target_is_done_immediately() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(1);
        let config = PackingConfig::new(1.0).with_target_point_count(0);
        let outcome = run_packing(config, &engine, square_region(10.0), &mut rng, None)
            .expect("outcome");
        assert_eq!(outcome.termination, Termination::TargetReached);
        assert!(outcome.is_empty());
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn empty_region_is_done_not_exhausted() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = run_packing(
            PackingConfig::new(1.0),
            &engine,
            FeasibilityRegion::default(),
            &mut rng,
            None,
        )
        .expect("outcome");
        assert_eq!(outcome.termination, Termination::RegionEmpty);
    }

    #[test]
    fn iteration_cap_stops_early() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(3);
        let config = PackingConfig::new(1.0).with_max_iterations(3);
        let outcome = run_packing(config, &engine, square_region(100.0), &mut rng, None)
            .expect("outcome");
        assert_eq!(outcome.termination, Termination::IterationLimit);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.len(), 3);
        assert!(outcome.is_partial());
    }

    struct NeverSampler;

    impl RegionSampler for NeverSampler {
        fn sample(
            &self,
            _engine: &dyn GeometryEngine,
            _region: &FeasibilityRegion,
            _rng: &mut dyn RngCore,
        ) -> SampleOutcome {
            SampleOutcome::Exhausted { attempts: 5 }
        }
    }

    #[test]
    fn sampler_exhaustion_is_terminal() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut packing =
            PackingLoop::try_new(PackingConfig::new(1.0), &engine, square_region(10.0))
                .expect("loop")
                .with_sampler(NeverSampler);
        let mut sink = VecSink::new();
        assert_eq!(packing.step(&mut rng, &mut sink), PackingState::Exhausted);
        // Sticky: further steps do nothing.
        assert_eq!(packing.step(&mut rng, &mut sink), PackingState::Exhausted);
        let outcome = packing.into_outcome();
        assert_eq!(outcome.termination, Termination::SamplingExhausted);
        assert_eq!(outcome.samples_drawn, 5);

        let finished = sink
            .into_inner()
            .into_iter()
            .filter(|e| matches!(e, PackingEvent::RunFinished { .. }))
            .count();
        assert_eq!(finished, 1);
    }

    struct FixedSampler;

    impl RegionSampler for FixedSampler {
        fn sample(
            &self,
            _engine: &dyn GeometryEngine,
            _region: &FeasibilityRegion,
            _rng: &mut dyn RngCore,
        ) -> SampleOutcome {
            SampleOutcome::Found(Sample {
                position: coord! { x: 50.0, y: 50.0 },
                layer: 0,
                attempts: 1,
            })
        }
    }

    #[test]
    fn steps_walk_through_sampling_and_accepted() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(3);
        let config = PackingConfig::new(10.0).with_target_point_count(1);
        let mut packing = PackingLoop::try_new(config, &engine, square_region(100.0))
            .expect("loop")
            .with_sampler(FixedSampler);
        assert_eq!(packing.state(), PackingState::Sampling);
        assert_eq!(packing.step(&mut rng, &mut ()), PackingState::Accepted);
        assert_eq!(packing.accepted().len(), 1);
        assert!(!packing.region().contains(coord! { x: 55.0, y: 50.0 }));
        assert_eq!(
            packing.step(&mut rng, &mut ()),
            PackingState::Done(Termination::TargetReached)
        );
    }

    #[test]
    fn events_report_monotone_shrink() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(11);
        let config = PackingConfig::new(15.0).with_target_point_count(6);
        let mut sink = VecSink::new();
        let outcome = run_packing(
            config,
            &engine,
            square_region(100.0),
            &mut rng,
            Some(&mut sink),
        )
        .expect("outcome");

        let events = sink.into_inner();
        assert!(matches!(events.first(), Some(PackingEvent::RunStarted { .. })));
        assert!(matches!(events.last(), Some(PackingEvent::RunFinished { .. })));

        let mut shrinks = 0;
        for event in &events {
            if let PackingEvent::RegionShrunk {
                area_before,
                area_after,
                ..
            } = event
            {
                shrinks += 1;
                assert!(area_after <= area_before);
            }
        }
        assert_eq!(shrinks, outcome.len());
    }

    #[test]
    fn max_distance_keeps_points_within_reach() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(21);
        let config = PackingConfig::new(10.0)
            .with_max_distance(25.0)
            .with_target_point_count(12);
        let outcome = run_packing(config, &engine, square_region(200.0), &mut rng, None)
            .expect("outcome");
        assert!(outcome.len() > 1);
        assert!(min_pairwise(&outcome.accepted) >= 10.0 - 1e-6);
        assert!(worst_reach(&outcome.accepted) <= 25.0 + 1e-6);
    }

    #[test]
    fn coarse_disks_never_overshoot_max_distance() {
        let engine = GeoEngine::new().with_disk_segments(8);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let config = PackingConfig::new(10.0)
                .with_max_distance(100.0)
                .with_target_point_count(15);
            let outcome = run_packing(config, &engine, square_region(2000.0), &mut rng, None)
                .expect("outcome");
            assert!(outcome.len() > 1, "seed {seed}");
            let worst = worst_reach(&outcome.accepted);
            assert!(worst <= 100.0 + 1e-6, "seed {seed}: reach {worst}");
            assert!(min_pairwise(&outcome.accepted) >= 10.0 - 1e-6);
        }
    }

    #[test]
    fn feasible_start_point_is_point_zero() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(4);
        let start = coord! { x: 20.0, y: 30.0 };
        let config = PackingConfig::new(10.0)
            .with_max_distance(30.0)
            .with_target_point_count(5);
        let mut sink = VecSink::new();
        let outcome = PackingLoop::try_new(config, &engine, square_region(200.0))
            .expect("loop")
            .with_start_point(start)
            .run_with_events(&mut rng, &mut sink);

        assert_eq!(outcome.len(), 5);
        assert_eq!(outcome.accepted[0].id, 0);
        assert_eq!(outcome.accepted[0].position, start);
        assert!(!outcome.region.contains(coord! { x: 25.0, y: 30.0 }));
        assert!(worst_reach(&outcome.accepted) <= 30.0 + 1e-6);
        // Placing the start point costs no sampling step.
        assert_eq!(outcome.iterations, 4);

        let events = sink.into_inner();
        assert!(matches!(
            events.get(1),
            Some(PackingEvent::PointAccepted { attempts: 0, .. })
        ));
        assert!(!events
            .iter()
            .any(|e| e.kind() == PackingEventKind::StartPointRejected));
    }

    #[test]
    fn infeasible_start_point_is_skipped() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(4);
        let start = coord! { x: 500.0, y: 500.0 };
        let config = PackingConfig::new(10.0).with_target_point_count(3);
        let mut sink = VecSink::new();
        let outcome = PackingLoop::try_new(config, &engine, square_region(100.0))
            .expect("loop")
            .with_start_point(start)
            .run_with_events(&mut rng, &mut sink);

        assert_eq!(outcome.len(), 3);
        assert!(outcome.accepted.iter().all(|p| p.position != start));
        let rejected: Vec<_> = sink
            .into_inner()
            .into_iter()
            .filter_map(|e| match e {
                PackingEvent::StartPointRejected { position } => Some(position),
                _ => None,
            })
            .collect();
        assert_eq!(rejected, vec![start]);
    }

    #[test]
    fn layer_priority_is_recorded() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(8);
        let region = FeasibilityRegion::new(vec![
            RegionLayer::new(Some(1), vec![rectangle(0.0, 0.0, 10.0, 10.0)]),
            RegionLayer::new(None, vec![rectangle(20.0, 0.0, 120.0, 100.0)]),
        ]);
        let config = PackingConfig::new(30.0).with_target_point_count(2);
        let outcome = run_packing(config, &engine, region, &mut rng, None).expect("outcome");
        assert_eq!(outcome.accepted[0].priority, Some(1));
        assert_eq!(outcome.accepted[1].priority, None);
    }

    #[test]
    fn pack_constraints_builds_and_runs() {
        let engine = GeoEngine::new();
        let mut rng = StdRng::seed_from_u64(2);
        let constraints = vec![SpatialConstraint::must_within(
            "land",
            rectangle(0.0, 0.0, 50.0, 50.0),
        )];
        let outcome = pack_constraints(
            &constraints,
            PackingConfig::new(5.0).with_target_point_count(4),
            &engine,
            &mut rng,
        )
        .expect("outcome");
        assert_eq!(outcome.len(), 4);

        let err = pack_constraints(&[], PackingConfig::new(5.0), &engine, &mut rng).unwrap_err();
        assert!(matches!(err, Error::NoBaseRegion));
    }
}
