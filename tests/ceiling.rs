use dive_plan_deco::ceiling::{ceiling, max_ceiling, max_ceiling_with_gf, tissue_ceiling};
use dive_plan_deco::gas::{Breathing, GasMix};
use dive_plan_deco::tissue::Tissue;
use dive_plan_deco::zh16c::COMPARTMENTS;
use dive_plan_deco::{DecoState, DepthPath, DiveParameters};
use rand::Rng;

#[test]
fn test_ceiling_with_high_n2_load() {
    let tissue = Tissue {
        load_n2: 5.0,
        load_he: 0.0,
    };

    let result = ceiling(&DiveParameters::default(), tissue, 2, 0.3);
    assert!(result > 0.0, "Ceiling should be greater than 0 for high N2 load");
}

#[test]
fn test_ceiling_with_high_he_load() {
    let tissue = Tissue {
        load_n2: 0.0,
        load_he: 5.0,
    };

    let result = ceiling(&DiveParameters::default(), tissue, 3, 0.3);
    assert!(result > 0.0, "Ceiling should be greater than 0 for high He load");
}

#[test]
fn test_ceiling_at_surface_saturation_is_zero() {
    let params = DiveParameters::default();
    let state = DecoState::surface(&params);
    for (i, tissue) in state.tissues.iter().enumerate() {
        assert_eq!(ceiling(&params, *tissue, i, params.gf_low), 0.0);
    }
    assert_eq!(max_ceiling(&params, &state), (0.0, 0));
}

#[test]
fn test_tissue_ceiling_in_bar() {
    let params = DiveParameters::default();
    let state = DecoState::surface(&params);
    for (i, tissue) in state.tissues.iter().enumerate() {
        assert!(tissue_ceiling(tissue, i, 1.0) < params.surface_pressure);
    }

    let loaded = Tissue {
        load_n2: 3.5,
        load_he: 0.0,
    };
    assert!(tissue_ceiling(&loaded, 0, 0.5) > params.surface_pressure);
}

#[test]
fn test_max_ceiling_picks_the_leading_compartment() {
    let params = DiveParameters::default();
    let mut state = DecoState::surface(&params);
    state.tissues[7] = Tissue {
        load_n2: 4.0,
        load_he: 0.0,
    };

    let (depth, index) = max_ceiling_with_gf(&params, &state, 0.5);
    assert_eq!(index, 7);
    assert_eq!(depth, ceiling(&params, state.tissues[7], 7, 0.5));
}

#[test]
fn test_ceiling_is_monotonic_in_load() {
    let params = DiveParameters::default();
    let mut rng = rand::rng();

    for _ in 0..500 {
        let index = rng.random_range(0..COMPARTMENTS);
        let gf = rng.random_range(0.2..=1.0f32);
        let load = rng.random_range(0.5..6.0f32);
        let extra = rng.random_range(0.01..1.0f32);

        let lower = ceiling(&params, Tissue { load_n2: load, load_he: 0.0 }, index, gf);
        let higher = ceiling(
            &params,
            Tissue {
                load_n2: load + extra,
                load_he: 0.0,
            },
            index,
            gf,
        );
        assert!(
            higher >= lower,
            "compartment {} gf {}: ceiling {} at {} bar but {} at {} bar",
            index + 1,
            gf,
            lower,
            load,
            higher,
            load + extra
        );
    }
}

#[test]
fn test_ceiling_grows_with_bottom_time() {
    let params = DiveParameters::new(1.0, 1.0);
    let air = Breathing::open_circuit(GasMix::air());
    let mut state = DecoState::surface(&params);
    state.advance(&params, &air, DepthPath::Travel(40.0), 133).unwrap();

    let mut previous = state.ceiling(&params);
    for _ in 0..40 {
        state.advance(&params, &air, DepthPath::Level(40.0), 60).unwrap();
        let current = state.ceiling(&params);
        assert!(current >= previous);
        previous = current;
    }
    assert!(previous > 0.0);
}
