//! Helm integration tests
//!
//! Telegraph detents, rudder authority and the speed/heading integrator
//! running under live damage effects.

use std::time::Duration;

use broadside::{names, CombatConfig, DamageModel, Fleet, ProfileCatalog, RudderJam, SpeedStep};
use proptest::prelude::*;

fn destroyer(seed: u64) -> DamageModel {
    let catalog = ProfileCatalog::builtin().unwrap();
    DamageModel::spawn(catalog.get("destroyer").unwrap(), CombatConfig::default(), seed).unwrap()
}

fn run(model: &mut DamageModel, secs: u64) {
    for _ in 0..secs {
        let effects = model.effects().clone();
        model.helm_mut().step(Duration::from_secs(1), &effects);
    }
}

#[test]
fn test_slider_dead_zones() {
    let mut model = destroyer(1);
    let helm = model.helm_mut();
    assert_eq!(helm.set_speed_from_slider(3.2), 0.0);
    assert_eq!(helm.set_speed_from_slider(-2.0), -5.0);
    assert_eq!(helm.set_speed_from_slider(17.6), 18.0);
    assert_eq!(helm.set_speed_from_slider(99.0), 36.0);
    assert_eq!(helm.set_speed_from_slider(-99.0), -12.0);
    assert_eq!(helm.commanded_kts(), -12.0);
}

#[test]
fn test_telegraph_passes_through_stop() {
    let mut model = destroyer(1);
    let helm = model.helm_mut();
    helm.set_speed_from_slider(-7.0);

    let ups: Vec<f64> = (0..5).map(|_| helm.adjust_speed(SpeedStep::Up)).collect();
    assert_eq!(ups, vec![-6.0, -5.0, 0.0, 5.0, 6.0]);

    let downs: Vec<f64> = (0..4).map(|_| helm.adjust_speed(SpeedStep::Down)).collect();
    assert_eq!(downs, vec![5.0, 0.0, -5.0, -6.0]);
}

#[test]
fn test_telegraph_stops_at_envelope() {
    let mut model = destroyer(1);
    let helm = model.helm_mut();
    helm.set_speed_from_slider(36.0);
    assert_eq!(helm.adjust_speed(SpeedStep::Up), 36.0);
    helm.set_speed_from_slider(-12.0);
    assert_eq!(helm.adjust_speed(SpeedStep::Down), -12.0);
}

#[test]
fn test_rudder_curve_for_class() {
    let model = destroyer(1);
    let helm = model.helm();
    assert_eq!(helm.rudder_effectiveness(0.0), 0.0);
    assert!((helm.rudder_effectiveness(2.5) - 0.175).abs() < 1e-9);
    assert!((helm.rudder_effectiveness(5.0) - 0.35).abs() < 1e-9);
    assert_eq!(helm.rudder_effectiveness(36.0), 1.0);
    assert_eq!(helm.rudder_effectiveness(80.0), 1.0);
    assert_eq!(helm.rudder_effectiveness(f64::NAN), 0.0);
}

#[test]
fn test_engine_damage_limits_speed() {
    let mut model = destroyer(2);
    model.helm_mut().set_speed_from_slider(36.0);
    model.apply_damage(names::ENGINE, 200.0);
    run(&mut model, 300);

    let fx = model.effects();
    let limit = fx.speed_cap_kts.min(36.0 * fx.speed_factor);
    assert!((model.helm().actual_kts() - limit).abs() < 1e-6);
    assert_eq!(model.helm().commanded_kts(), 36.0);
}

#[test]
fn test_sinking_ship_coasts_to_a_stop() {
    let mut model = destroyer(3);
    model.helm_mut().set_speed_from_slider(30.0);
    run(&mut model, 120);
    assert!((model.helm().actual_kts() - 30.0).abs() < 1e-6);

    model.apply_damage(names::MAGAZINE, 250.0);
    assert!(model.is_sunk());
    run(&mut model, 120);
    assert_eq!(model.helm().actual_kts(), 0.0);
}

#[test]
fn test_jammed_rudder_circles() {
    let mut fleet = Fleet::new(ProfileCatalog::builtin().unwrap(), CombatConfig::default(), 5);
    let id = fleet.spawn("destroyer").unwrap();
    {
        let model = fleet.get_mut(id).unwrap();
        model.helm_mut().set_speed_from_slider(20.0);
        model.helm_mut().set_desired_heading(0.0);
        model.apply_damage(names::RUDDER, 150.0);
    }
    let jam = fleet.get(id).unwrap().effects().rudder_jam;
    assert_ne!(jam, RudderJam::None);

    let mut headings = Vec::new();
    for _ in 0..60 {
        fleet.advance(Duration::from_secs(1));
        headings.push(fleet.get(id).unwrap().helm().heading_deg());
    }
    // Still turning long after the desired heading was passed
    let last = headings[headings.len() - 1];
    let earlier = headings[headings.len() - 2];
    assert_ne!(last, earlier);
}

proptest! {
    #[test]
    fn prop_slider_never_lands_in_dead_zone(raw in -100.0f64..100.0) {
        let mut model = destroyer(9);
        let kts = model.helm_mut().set_speed_from_slider(raw);
        prop_assert!(kts == 0.0 || kts.abs() >= 5.0);
        prop_assert!((-12.0..=36.0).contains(&kts));
        prop_assert_eq!(kts, kts.round());
    }

    #[test]
    fn prop_rudder_curve_monotonic(a in 0.0f64..50.0, b in 0.0f64..50.0) {
        let model = destroyer(9);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let helm = model.helm();
        let (e_lo, e_hi) = (helm.rudder_effectiveness(lo), helm.rudder_effectiveness(hi));
        prop_assert!(e_lo <= e_hi);
        prop_assert!((0.0..=1.0).contains(&e_hi));
    }

    #[test]
    fn prop_telegraph_never_skips_neutral(steps in prop::collection::vec(any::<bool>(), 1..80)) {
        let mut model = destroyer(9);
        let helm = model.helm_mut();
        let mut prev = helm.commanded_kts();
        for up in steps {
            let next = helm.adjust_speed(if up { SpeedStep::Up } else { SpeedStep::Down });
            // Direction reversals pass through a full stop
            prop_assert!(prev * next >= 0.0);
            prop_assert!(next == 0.0 || next.abs() >= 5.0);
            prev = next;
        }
    }
}
