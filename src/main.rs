use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use ssa_kernel::io::{write_pointing_file, PointingSample};
use ssa_kernel::sensor::{ElectroOpticalSensor, FieldOfRegard, GimbalType};
use ssa_kernel::sim::visibility::VisibilityClass;
use ssa_kernel::{Event, JulianDate, Result, SatelliteOptions, Universe};

const ISS_LINE1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "simulation aborted");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // -----------------------------------------------------------------------
    // Scene: one observatory, one SGP4 satellite
    // -----------------------------------------------------------------------
    let mut universe = Universe::new();

    let sensor = ElectroOpticalSensor::new(1024, 1024, 1.0, 1.0, vec![FieldOfRegard::hemisphere()]);
    let obs = universe.add_ground_electro_optical_observatory(
        "Maui", 20.7084, -156.2570, 3_058.0, GimbalType::AzEl, sensor,
    );
    let iss = universe.add_sgp4_satellite(
        "ISS",
        ISS_LINE1,
        ISS_LINE2,
        SatelliteOptions { interpolated: true, ..Default::default() },
    )?;

    let start = JulianDate::from_utc(2008, 9, 20, 12, 0, 0).unwrap_or_else(JulianDate::j2000);
    universe.schedule_event(Event::track_object(start.add_seconds(60.0), "Maui", Some("ISS")));

    // -----------------------------------------------------------------------
    // Run: 90 minutes at 30 s
    // -----------------------------------------------------------------------
    let step = 30.0;
    let steps = 180;
    let mut history = Vec::with_capacity(steps + 1);
    let mut in_regard = 0;

    println!();
    println!("====================================================================");
    println!("  SSA KERNEL DEMO  (observatory Maui, target ISS)");
    println!("====================================================================");
    println!();
    println!(
        "  {:>24}  {:>9}  {:>9}  {:>11}  {:>8}",
        "time (UTC)", "az (deg)", "el (deg)", "range (km)", "regard"
    );
    println!("  {}", "─".repeat(68));

    for i in 0..=steps {
        let t = start.add_seconds(i as f64 * step);
        universe.update(&t)?;

        let Some(gimbal) = universe.gimbal(obs.gimbal) else {
            continue;
        };
        let look = gimbal.look();
        history.push(PointingSample { time: t, az: look.az, el: look.el, range: look.range });

        let report = universe.visibility(&[iss])?;
        let seen = report.class(iss) == Some(VisibilityClass::Single);
        if seen {
            in_regard += 1;
        }
        if i % 10 == 0 || seen {
            println!(
                "  {:>24}  {:>9.3}  {:>9.3}  {:>11.1}  {:>8}",
                t.to_string(),
                look.az,
                look.el,
                look.range / 1000.0,
                if seen { "yes" } else { "-" }
            );
        }
    }

    println!();
    println!("  {} of {} samples in regard", in_regard, history.len());
    if let Some(period) = universe.object(iss).and_then(|o| o.period()) {
        println!("  ISS period: {:.1} min", period / 60.0);
    }

    if let Some(path) = std::env::args().nth(1) {
        if let Err(e) = write_pointing_file(&path, &history) {
            error!(path = %path, error = %e, "could not write pointing history");
        } else {
            println!("  Pointing history written to {path}");
        }
    }
    println!("====================================================================");
    println!();
    Ok(())
}
