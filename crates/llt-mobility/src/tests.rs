//! Unit tests for regions, intervals, the predictor, and the driver.

#[cfg(test)]
mod region {
    use llt_core::{RegionId, Vec3};

    use crate::RegionMap;

    #[test]
    fn known_positions_resolve() {
        let map = RegionMap::default();
        assert_eq!(map.position_to_region(Vec3::new(10.0, 10.0, 5.0)), Some(RegionId(0)));
        assert_eq!(map.position_to_region(Vec3::new(100.0, 300.0, 5.0)), Some(RegionId(1)));
        assert_eq!(map.position_to_region(Vec3::new(250.0, 100.0, 5.0)), Some(RegionId(2)));
        assert_eq!(map.position_to_region(Vec3::new(400.0, 400.0, 5.0)), Some(RegionId(3)));
        assert_eq!(map.position_to_region(Vec3::new(450.0, 100.0, 5.0)), Some(RegionId(4)));
    }

    #[test]
    fn gaps_are_in_transit() {
        let map = RegionMap::default();
        // between the L0/L2 boxes on the x axis
        assert_eq!(map.position_to_region(Vec3::new(175.0, 10.0, 5.0)), None);
    }

    #[test]
    fn overlap_belongs_to_lowest_region() {
        let map = RegionMap::default();
        // (400, 250) is inside both L3's y-extended neighborhood checks and
        // L4; the primary boxes give it to L4 only — but (145, 145) sits in
        // L0 alone even though L1's x-range touches it.
        assert_eq!(map.position_to_region(Vec3::new(145.0, 145.0, 5.0)), Some(RegionId(0)));
    }

    #[test]
    fn nearest_covers_transit_gaps() {
        let map = RegionMap::default();
        let p = Vec3::new(175.0, 10.0, 5.0);
        assert_eq!(map.position_to_region(p), None);
        assert_eq!(map.nearest_region(p), Some(RegionId(0)));
        // far outside the padded partition
        assert_eq!(map.nearest_region(Vec3::new(600.0, 10.0, 5.0)), None);
        // altitude out of range
        assert_eq!(map.nearest_region(Vec3::new(10.0, 10.0, 200.0)), None);
    }

    #[test]
    fn centers_are_inside_their_region() {
        let map = RegionMap::default();
        for r in RegionId::all() {
            assert_eq!(map.position_to_region(map.center(r)), Some(r));
        }
    }
}

#[cfg(test)]
mod interval {
    use crate::Interval;

    #[test]
    fn bucket_boundaries() {
        assert_eq!(Interval::from_secs(0.0), Interval::Short);
        assert_eq!(Interval::from_secs(5.0), Interval::Short);
        assert_eq!(Interval::from_secs(5.1), Interval::Medium);
        assert_eq!(Interval::from_secs(10.0), Interval::Medium);
        assert_eq!(Interval::from_secs(10.1), Interval::Long);
        assert_eq!(Interval::from_secs(3600.0), Interval::Long);
    }

    #[test]
    fn pause_mapping() {
        assert_eq!(Interval::Short.pause_secs(), 10.0);
        assert_eq!(Interval::Medium.pause_secs(), 30.0);
        assert_eq!(Interval::Long.pause_secs(), 60.0);
    }

    #[test]
    fn wire_roundtrip() {
        for i in Interval::ALL {
            assert_eq!(Interval::from_wire(i.to_wire()), i);
        }
        // unknown wire values clamp
        assert_eq!(Interval::from_wire(7), Interval::Long);
    }
}

#[cfg(test)]
mod markov {
    use llt_core::{NodeId, NodeRng, RegionId};

    use crate::markov::sample_cdf;
    use crate::{Interval, Predictor};

    const EPS: f64 = 1e-9;

    #[test]
    fn seed_state_rows_sum_to_one() {
        let p = Predictor::new();
        for i in RegionId::all() {
            assert!((p.location_row_sum(i) - 1.0).abs() < EPS);
            for j in RegionId::all() {
                for b in Interval::ALL {
                    assert!((p.interval_row_sum(i, j, b) - 1.0).abs() < EPS);
                }
            }
        }
    }

    #[test]
    fn location_rows_stay_normalized_under_updates() {
        let mut p = Predictor::new();
        for step in 0..500u32 {
            let prev = RegionId((step % 5) as u8);
            let curr = RegionId(((step + 1 + step % 3) % 5) as u8);
            p.observe_transition(prev, curr, (step % 20) as f64);
            for i in RegionId::all() {
                assert!(
                    (p.location_row_sum(i) - 1.0).abs() < EPS,
                    "row {i} drifted after step {step}"
                );
            }
        }
    }

    #[test]
    fn interval_rows_stay_normalized_under_updates() {
        let mut p = Predictor::new();
        for step in 0..300u32 {
            let dwell = [2.0, 8.0, 40.0][(step % 3) as usize];
            p.observe_transition(RegionId(1), RegionId(3), dwell);
            for b in Interval::ALL {
                assert!((p.interval_row_sum(RegionId(1), RegionId(3), b) - 1.0).abs() < EPS);
            }
        }
    }

    #[test]
    fn self_transition_is_ignored() {
        let mut p = Predictor::new();
        let before = p.location_prob(RegionId(2), RegionId(2));
        p.observe_transition(RegionId(2), RegionId(2), 12.0);
        assert_eq!(p.location_prob(RegionId(2), RegionId(2)), before);
    }

    #[test]
    fn cyclic_walk_dominates_each_row() {
        // Synthetic transitions with curr = (prev + 1) mod 5 always.  The
        // warm seed (100 counts per cell, 500 per row) means each row needs
        // thousands of observations before its learned cell crosses 0.9:
        // prob = (100 + n) / (500 + n) per n same-cell updates.
        let mut p = Predictor::new();
        for step in 0..1000u32 {
            let prev = RegionId((step % 5) as u8);
            let curr = RegionId(((step + 1) % 5) as u8);
            p.observe_transition(prev, curr, 3.0);
        }
        // 200 updates per row: (100 + 200) / (500 + 200) ≈ 0.4286 — already
        // the clear row maximum, three times any other cell.
        for i in 0..5u8 {
            let next = RegionId((i + 1) % 5);
            let learned = p.location_prob(RegionId(i), next);
            assert!((learned - 300.0 / 700.0).abs() < 1e-9, "row {i}: {learned}");
            for j in RegionId::all() {
                if j != next {
                    assert!(p.location_prob(RegionId(i), j) < learned / 2.5);
                }
            }
        }
    }

    #[test]
    fn learning_converges_past_the_seed() {
        // Long-run convergence: 4000 same-cell updates per row pushes the
        // learned probability past 0.9 and everything else under 0.05.
        let mut p = Predictor::new();
        for step in 0..20_000u32 {
            let prev = RegionId((step % 5) as u8);
            let curr = RegionId(((step + 1) % 5) as u8);
            p.observe_transition(prev, curr, 3.0);
        }
        for i in 0..5u8 {
            let next = RegionId((i + 1) % 5);
            assert!(
                p.location_prob(RegionId(i), next) > 0.9,
                "row {i}: learned prob {}",
                p.location_prob(RegionId(i), next)
            );
            for j in RegionId::all() {
                if j != next {
                    assert!(p.location_prob(RegionId(i), j) < 0.05);
                }
            }
        }
    }

    #[test]
    fn sampling_tracks_a_dominant_cell() {
        // Drive one row until a single cell holds ~0.9, then the sampler
        // must land there the overwhelming majority of draws.
        let mut p = Predictor::new();
        for _ in 0..4000 {
            p.observe_transition(RegionId(0), RegionId(3), 3.0);
        }
        let mut rng = NodeRng::new(99, NodeId(0));
        let hits = (0..1000)
            .filter(|_| p.sample_next_location(RegionId(0), &mut rng) == RegionId(3))
            .count();
        assert!(hits > 850, "dominant cell drawn only {hits}/1000 times");
    }

    #[test]
    fn dominant_cell_is_argmax_for_sub_threshold_draws() {
        // A row with one cell at 1 − ε and the rest at ε/4 must return the
        // dominant index for every draw below 1 − ε.
        let eps = 0.1;
        let probs = [1.0 - eps, eps / 4.0, eps / 4.0, eps / 4.0, eps / 4.0];
        let mut u = 0.0;
        while u < 1.0 - eps {
            assert_eq!(sample_cdf(&probs, u), 0);
            u += 0.005;
        }
    }

    #[test]
    fn cdf_picks_first_exceeding_index() {
        let probs = [0.1, 0.2, 0.3, 0.2, 0.2];
        assert_eq!(sample_cdf(&probs, 0.0), 0);
        assert_eq!(sample_cdf(&probs, 0.05), 0);
        assert_eq!(sample_cdf(&probs, 0.1), 1);
        assert_eq!(sample_cdf(&probs, 0.25), 2);
        assert_eq!(sample_cdf(&probs, 0.999), 4);
        // degenerate: accumulated sum below u falls back to the last index
        assert_eq!(sample_cdf(&[0.5, 0.4], 0.95), 1);
    }

    #[test]
    fn cdf_sampling_matches_distribution() {
        let probs = [0.1, 0.2, 0.3, 0.2, 0.2];
        let mut rng = NodeRng::new(7, NodeId(0));
        let mut hits = [0u32; 5];
        const DRAWS: u32 = 100_000;
        for _ in 0..DRAWS {
            hits[sample_cdf(&probs, rng.unit())] += 1;
        }
        for (i, &h) in hits.iter().enumerate() {
            let freq = h as f64 / DRAWS as f64;
            assert!(
                (freq - probs[i]).abs() < 0.02,
                "bucket {i}: freq {freq} vs prob {}",
                probs[i]
            );
        }
    }

    #[test]
    fn interval_learning_shifts_prediction() {
        let mut p = Predictor::new();
        // Always long dwells on the 0→1 journey.
        for _ in 0..500 {
            p.observe_transition(RegionId(0), RegionId(1), 45.0);
        }
        let mut rng = NodeRng::new(3, NodeId(1));
        let mut longs = 0;
        for _ in 0..100 {
            if p.sample_next_interval(RegionId(0), RegionId(1), &mut rng) == Interval::Long {
                longs += 1;
            }
        }
        assert!(longs > 90, "expected Long to dominate, got {longs}/100");
    }
}

#[cfg(test)]
mod driver {
    use llt_core::{NodeId, NodeRng, SimTime, Vec3};

    use crate::{Interval, Mobility, Predictor, RegionMap};

    fn setup(pos: Vec3) -> (Mobility, RegionMap, Predictor, NodeRng) {
        let map = RegionMap::default();
        let m = Mobility::new(pos, &map, SimTime::ZERO);
        (m, map, Predictor::new(), NodeRng::new(42, NodeId(0)))
    }

    #[test]
    fn walk_reaches_destination_center() {
        let (mut m, map, mut p, mut rng) = setup(Vec3::new(10.0, 10.0, 50.0));
        let now = Mobility::first_pause();
        let leg = m.begin_walk(now, &map, &mut p, &mut rng);
        assert!(m.is_walking());

        let arrival = now + leg.travel;
        let there = m.position(arrival);
        let center = map.center(leg.destination);
        assert!(there.distance(center) < 1.0, "ended {there} vs {center}");

        m.arrive(arrival, &map, Interval::Short);
        assert!(!m.is_walking());
        assert_eq!(m.position(arrival), center);
    }

    #[test]
    fn position_interpolates_mid_leg() {
        let (mut m, map, mut p, mut rng) = setup(Vec3::new(10.0, 10.0, 50.0));
        let now = SimTime::from_secs(1);
        let leg = m.begin_walk(now, &map, &mut p, &mut rng);

        let start = m.position(now);
        let mid = m.position(now + SimTime(leg.travel.0 / 2));
        let end = m.position(now + leg.travel);
        let total = start.distance(end);
        assert!(total > 0.0);
        let half = start.distance(mid);
        assert!((half / total - 0.5).abs() < 0.01);
    }

    #[test]
    fn early_pauses_are_one_second() {
        let (mut m, map, mut p, mut rng) = setup(Vec3::new(10.0, 10.0, 50.0));
        let mut now = Mobility::first_pause();

        for expected_fixed in [true, true, false] {
            let leg = m.begin_walk(now, &map, &mut p, &mut rng);
            now = now + leg.travel;
            let pause = m.arrive(now, &map, Interval::Long);
            if expected_fixed {
                assert_eq!(pause, SimTime::from_secs(1));
            } else {
                assert_eq!(pause, SimTime::from_secs_f64(Interval::Long.pause_secs()));
            }
            now = now + pause;
        }
    }

    #[test]
    fn dwell_poll_ignores_transit() {
        let (mut m, map, mut p, mut rng) = setup(Vec3::new(10.0, 10.0, 50.0));
        let now = SimTime::from_secs(1);
        m.begin_walk(now, &map, &mut p, &mut rng);
        // poll mid-walk: most positions on the leg are in transit and must
        // not disturb the statistics
        for s in 0..5 {
            m.poll_dwell(now + SimTime::from_secs(s), &map);
        }
    }
}
