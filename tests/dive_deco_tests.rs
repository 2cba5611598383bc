#![cfg(feature = "std")]

use dive_plan_deco::gas::{Breathing, GasMix};
use dive_plan_deco::{DecoCache, DecoState, DepthPath, DiveParameters, DivePlan, Start, plan};

// the reference crate steps in whole seconds and uses 10 m per bar, allow for both
const CEILING_TOLERANCE: f64 = 1.5;

#[test]
fn test_ceiling_against_dive_deco() {
    use dive_deco::{BuhlmannConfig, BuhlmannModel, DecoModel, Depth, Gas, Time};

    let config = BuhlmannConfig::new().with_gradient_factors(100, 100);
    let mut model = BuhlmannModel::default();
    let _ = model.update_config(config);

    let params = DiveParameters::new(1.0, 1.0);
    let air = Breathing::open_circuit(GasMix::air());
    let mut state = DecoState::surface(&params);

    let bottom_depth = 50.0;
    model.record_travel(Depth::from_meters(bottom_depth), Time::from_seconds(150.), &Gas::air());
    state
        .advance(&params, &air, DepthPath::Travel(bottom_depth as f32), 150)
        .unwrap();

    for minute in 1..=20 {
        model.record(Depth::from_meters(bottom_depth), Time::from_seconds(60.), &Gas::air());
        state
            .advance(&params, &air, DepthPath::Level(bottom_depth as f32), 60)
            .unwrap();

        let reference = model.ceiling().as_meters();
        let ours = state.ceiling(&params) as f64;
        println!("minute {:2}: dive-deco {:5.2} m, ours {:5.2} m", minute, reference, ours);
        assert!(
            (reference - ours).abs() <= CEILING_TOLERANCE,
            "ceiling after {} min differs: dive-deco {} m, ours {} m",
            minute,
            reference,
            ours
        );
    }
}

#[test]
fn test_deco_schedule_against_dive_deco() {
    use dive_deco::{BuhlmannConfig, BuhlmannModel, DecoModel, DecoStage, DecoStageType, Depth, Gas, Time};

    let config = BuhlmannConfig::new().with_gradient_factors(80, 80);
    let mut model = BuhlmannModel::default();
    let _ = model.update_config(config);

    let bottom_depth = Depth::from_meters(50.);
    model.record_travel(bottom_depth, Time::from_seconds(2.5 * 60.), &Gas::air());
    model.record(bottom_depth, Time::from_seconds(20 * 60), &Gas::air());

    let mut reference_deco = 0.;
    let mut reference_first_stop = None;
    if let Ok(runtime) = model.deco(vec![Gas::air()]) {
        runtime.deco_stages.iter().for_each(|stage: &DecoStage| {
            if stage.stage_type == DecoStageType::DecoStop {
                println!(
                    "dive-deco stop {:4.1} m {:6.1} min",
                    stage.start_depth.as_meters(),
                    stage.duration.as_minutes()
                );
                reference_first_stop.get_or_insert(stage.start_depth.as_meters());
                reference_deco += stage.duration.as_minutes();
            }
        });
    }

    let params = DiveParameters::new(0.8, 0.8);
    let mut dive_plan = DivePlan::new();
    let cylinder = dive_plan.add_cylinder(GasMix::air()).unwrap();
    dive_plan.add_segment(dive_plan_deco::PlanSegment::open_circuit(150, 50.0, cylinder, true)).unwrap();
    dive_plan.add_segment(dive_plan_deco::PlanSegment::open_circuit(1200, 50.0, cylinder, false)).unwrap();
    let outcome = plan(&params, &dive_plan, Start::Fresh, &DecoCache::<8>::new()).unwrap();

    for stop in &outcome.stops {
        println!("ours      stop {:4.1} m {:6.1} min", stop.depth, stop.duration as f32 / 60.0);
    }
    let ours = outcome.stops.total_stop_time() as f64 / 60.0;
    println!("total deco: dive-deco {:.1} min, ours {:.1} min", reference_deco, ours);

    assert!(!outcome.stops.is_no_stop());
    let first_stop = outcome.stops.deepest().unwrap().depth as f64;
    let reference_first_stop = reference_first_stop.unwrap();
    assert!(
        (first_stop - reference_first_stop).abs() < 0.5,
        "first stop {} m, dive-deco {} m",
        first_stop,
        reference_first_stop
    );

    assert!(reference_deco > 0.0);
    let deviation = (ours - reference_deco).abs() / reference_deco;
    assert!(
        deviation <= 0.15,
        "total deco {:.1} min against dive-deco {:.1} min",
        ours,
        reference_deco
    );
}
