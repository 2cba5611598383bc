//! Decompression planner
//!
//! Plans a square profile and prints the stop table, the NDL at the bottom and the oxygen
//! exposure.
//!
//! Run with: `cargo run --example planner -- <depth m> <bottom min> [gf low %] [gf high %] [deco O2 %...]`
//! e.g. `cargo run --example planner -- 45 25 30 80 50 100`
//!
//! Set `RUST_LOG=dive_plan_deco=debug` to follow the planner step by step.

use std::env;
use std::process::ExitCode;

use dive_plan_deco::{
    DecoCache, DiveParameters, DivePlan, GasMix, PlanOutcome, Start,
    gas::Breathing,
    ndl::ndl,
    plan,
    state::DecoState,
};
use tracing_subscriber::EnvFilter;

fn parse_arg<T: std::str::FromStr>(args: &[String], index: usize, default: T) -> Result<T, String> {
    match args.get(index) {
        Some(value) => value
            .parse()
            .map_err(|_| format!("argument {} ({}) is not a number", index, value)),
        None => Ok(default),
    }
}

fn print_table(outcome: &PlanOutcome, bottom_time: u32) {
    println!("Depth (m) | Duration (min) | Start Time (min)");
    println!("----------|----------------|-----------------");
    let mut current_time = outcome.bottom_state.time as f32 / 60.0;
    for stop in &outcome.stops {
        if stop.is_surface() {
            continue;
        }
        println!(
            "   {:4.1}   |     {:6.1}     |      {:6.1}",
            stop.depth,
            stop.duration as f32 / 60.0,
            current_time
        );
        current_time += stop.duration as f32 / 60.0;
    }
    if outcome.stops.is_no_stop() {
        println!("No decompression stops required after {} min", bottom_time);
    }
    println!(
        "\nTotal decompression time: {:.1} minutes",
        outcome.stops.total_stop_time() as f32 / 60.0
    );
    println!("Ascent time: {:.1} minutes", outcome.ascent_time() as f32 / 60.0);
    println!("Runtime: {:.1} minutes", outcome.runtime as f32 / 60.0);
}

fn run(args: &[String]) -> Result<(), String> {
    let depth: f32 = parse_arg(args, 1, 40.0)?;
    let bottom_time: u32 = parse_arg(args, 2, 30)?;
    let gf_low: f32 = parse_arg(args, 3, 30.0)?;
    let gf_high: f32 = parse_arg(args, 4, 75.0)?;

    let params = DiveParameters::default().with_gradient_factors(gf_low / 100.0, gf_high / 100.0);
    params.validate().map_err(|e| e.to_string())?;

    let mut dive_plan = DivePlan::new();
    let bottom_gas = dive_plan.add_cylinder(GasMix::air()).map_err(|e| e.to_string())?;
    for (index, arg) in args.iter().enumerate().skip(5) {
        let o2: f32 = parse_arg(args, index, 0.0)?;
        let mix = GasMix::nitrox(o2 / 100.0).map_err(|e| format!("{}: {}", arg, e))?;
        dive_plan.add_cylinder(mix).map_err(|e| e.to_string())?;
    }
    dive_plan
        .add_level(&params, depth, bottom_time * 60, bottom_gas)
        .map_err(|e| e.to_string())?;

    println!("=== Dive Planner ===\n");
    println!("Dive Parameters:");
    println!("  Descent Speed: {:.1} m/min", params.descent_speed);
    println!("  Ascent Speed: {:.1} m/min", params.ascent_speed);
    println!("  GF Low: {:.0}%", params.gf_low * 100.0);
    println!("  GF High: {:.0}%", params.gf_high * 100.0);
    for (index, mix) in dive_plan.cylinders().iter().enumerate() {
        println!(
            "  Cylinder {}: O2 {:.0}% MOD {:.0} m",
            index,
            mix.o2() * 100.0,
            mix.mod_depth(&params, params.deco_po2_max)
        );
    }
    println!();

    let mut descended = DecoState::surface(&params);
    let travel = &dive_plan.segments()[0];
    let air = Breathing::open_circuit(GasMix::air());
    descended
        .advance(&params, &air, dive_plan_deco::DepthPath::Travel(depth), travel.duration)
        .map_err(|e| e.to_string())?;
    let limit = ndl(&params, &descended, &air, depth).map_err(|e| e.to_string())?;
    println!("No Decompression Limit at {:.0} m: {} minutes\n", depth, limit);

    let cache = DecoCache::<8>::new();
    let outcome = plan(&params, &dive_plan, Start::Fresh, &cache).map_err(|e| e.to_string())?;
    print_table(&outcome, bottom_time);

    let ox_tox = outcome.final_state.ox_tox;
    println!("CNS: {:.1}%  OTU: {:.0}", ox_tox.cns, ox_tox.otu);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
