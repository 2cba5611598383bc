use dive_plan_deco::gas::{Breathing, GasMix};
use dive_plan_deco::ndl::{NDL_CAP, binary_ndl, ndl};
use dive_plan_deco::{DecoState, DepthPath, DiveParameters};

fn descended(params: &DiveParameters, depth: f32) -> DecoState {
    let air = Breathing::open_circuit(GasMix::air());
    let mut state = DecoState::surface(params);
    let travel = (depth / params.descent_speed * 60.0).ceil() as u32;
    state
        .advance(params, &air, DepthPath::Travel(depth), travel)
        .unwrap();
    state
}

#[test]
fn test_binary_ndl_vs_regular() {
    let params = DiveParameters::new(1.0, 1.0);
    let air = Breathing::open_circuit(GasMix::air());

    for depth in [12.0, 18.0, 24.0, 30.0, 40.0, 50.0] {
        let state = descended(&params, depth);
        let regular_ndl = ndl(&params, &state, &air, depth).unwrap();
        let binary_ndl = binary_ndl(&params, &state, &air, depth).unwrap();

        #[cfg(feature = "std")]
        println!("{} m: Regular NDL: {}, Binary NDL: {}", depth, regular_ndl, binary_ndl);

        assert_eq!(
            regular_ndl, binary_ndl,
            "Binary NDL should exactly match regular NDL at {} m",
            depth
        );
    }
}

#[test]
fn test_ndl_on_air_is_in_the_expected_range() {
    let params = DiveParameters::new(1.0, 1.0);
    let air = Breathing::open_circuit(GasMix::air());

    let at_30 = ndl(&params, &descended(&params, 30.0), &air, 30.0).unwrap();
    assert!((12..=20).contains(&at_30), "NDL at 30 m was {}", at_30);

    let at_18 = ndl(&params, &descended(&params, 18.0), &air, 18.0).unwrap();
    assert!((50..=66).contains(&at_18), "NDL at 18 m was {}", at_18);
}

#[test]
fn test_ndl_shrinks_with_depth_and_conservatism() {
    let air = Breathing::open_circuit(GasMix::air());
    let relaxed = DiveParameters::new(1.0, 1.0);
    let strict = DiveParameters::new(0.7, 0.3);

    let shallow = ndl(&relaxed, &descended(&relaxed, 21.0), &air, 21.0).unwrap();
    let deep = ndl(&relaxed, &descended(&relaxed, 33.0), &air, 33.0).unwrap();
    assert!(deep < shallow);

    let conservative = ndl(&strict, &descended(&strict, 21.0), &air, 21.0).unwrap();
    assert!(conservative < shallow);
}

#[test]
fn test_nitrox_extends_ndl() {
    let params = DiveParameters::new(1.0, 1.0);
    let air = Breathing::open_circuit(GasMix::air());
    let ean32 = Breathing::open_circuit(GasMix::nitrox(0.32).unwrap());
    let state = descended(&params, 27.0);

    assert!(ndl(&params, &state, &ean32, 27.0).unwrap() > ndl(&params, &state, &air, 27.0).unwrap());
}

#[test]
fn test_shallow_ndl_is_capped() {
    let params = DiveParameters::new(1.0, 1.0);
    let air = Breathing::open_circuit(GasMix::air());
    let state = DecoState::surface(&params);

    assert_eq!(ndl(&params, &state, &air, 3.0).unwrap(), NDL_CAP);
    assert_eq!(binary_ndl(&params, &state, &air, 3.0).unwrap(), NDL_CAP);
}

#[test]
fn test_ndl_in_deco_is_zero() {
    let params = DiveParameters::new(1.0, 1.0);
    let air = Breathing::open_circuit(GasMix::air());
    let mut state = descended(&params, 45.0);
    state
        .advance(&params, &air, DepthPath::Level(45.0), 40 * 60)
        .unwrap();

    assert_eq!(ndl(&params, &state, &air, 45.0).unwrap(), 0);
    assert_eq!(binary_ndl(&params, &state, &air, 45.0).unwrap(), 0);
}
