use clap::Parser;
use heatflux_core::physics::moisture::air_density;
use heatflux_core::{
    solve_batch, Celsius, ConvergenceResult, FluxError, FluxSolver, Kelvin, LandCoverClass,
    Meters, MetersPerSecond, PixelObservation, RoughnessTable, SolverConfig, StabilityMode,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Batch sensible heat flux solver
#[derive(Parser, Debug)]
#[command(name = "heatflux-batch")]
#[command(about = "Monin-Obukhov sensible heat flux for a scene of pixels", long_about = None)]
struct Args {
    /// JSON array of pixel observations (synthetic scene if omitted)
    #[arg(short, long)]
    observations: Option<PathBuf>,

    /// JSON solver configuration (defaults if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write per-pixel results as JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Force neutral stratification (ζ = 0)
    #[arg(long)]
    neutral: bool,

    /// Override the iteration cap
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Synthetic scene: number of pixels
    #[arg(short, long, default_value_t = 10_000)]
    pixels: usize,

    /// Synthetic scene: RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Synthetic scene: air temperature in °C
    #[arg(short = 't', long, default_value_t = 27.0)]
    air_temperature: f64,

    /// Synthetic scene: largest surface-air temperature difference in K
    #[arg(long, default_value_t = 15.0)]
    max_delta: f64,

    /// Synthetic scene: mean wind speed in m/s
    #[arg(short, long, default_value_t = 3.0)]
    wind_speed: f64,

    /// Synthetic scene: station pressure in hPa (sets air density)
    #[arg(long, default_value_t = 1013.25)]
    pressure: f64,

    /// Synthetic scene: reference height in m (per-class default if omitted)
    #[arg(long)]
    reference_height: Option<f64>,
}

impl Args {
    /// Reject synthetic-scene settings no pixel could be built from
    fn check_scene(&self) -> Result<(), String> {
        let positive = [
            ("wind-speed", self.wind_speed),
            ("pressure", self.pressure),
            ("max-delta", self.max_delta),
        ]
        .into_iter()
        .chain(self.reference_height.map(|z_r| ("reference-height", z_r)));
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("--{name} must be a positive number, got {value}"));
            }
        }
        let air = Celsius::from(self.air_temperature).to_kelvin();
        if !air.is_finite() || *air <= 0.0 {
            return Err(format!(
                "--air-temperature must be above absolute zero, got {} °C",
                self.air_temperature
            ));
        }
        Ok(())
    }
}

/// One line of the per-pixel output
#[derive(Debug, Serialize)]
struct PixelRecord {
    index: usize,
    land_cover: LandCoverClass,
    converged: bool,
    iterations: Option<usize>,
    sensible_heat_flux: Option<f64>,
    friction_velocity: Option<f64>,
    zeta: Option<f64>,
    aerodynamic_resistance: Option<f64>,
    error: Option<String>,
}

impl PixelRecord {
    fn new(
        index: usize,
        obs: &PixelObservation,
        result: &Result<ConvergenceResult, FluxError>,
    ) -> Self {
        match result {
            Ok(r) => Self {
                index,
                land_cover: obs.land_cover,
                converged: r.converged,
                iterations: Some(r.iterations),
                sensible_heat_flux: Some(r.state.sensible_heat_flux),
                friction_velocity: Some(r.state.u_star),
                zeta: Some(r.state.zeta),
                aerodynamic_resistance: Some(r.aerodynamic_resistance()),
                error: None,
            },
            Err(e) => Self {
                index,
                land_cover: obs.land_cover,
                converged: false,
                iterations: None,
                sensible_heat_flux: None,
                friction_velocity: None,
                zeta: None,
                aerodynamic_resistance: None,
                error: Some(e.to_string()),
            },
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Random mix of land cover under one air mass, surfaces warmer than the air
fn synthetic_scene(args: &Args) -> Result<Vec<PixelObservation>, String> {
    args.check_scene()?;
    let mut rng = StdRng::seed_from_u64(args.seed);
    let air = Celsius::from(args.air_temperature).to_kelvin();
    let rho = air_density(*air, args.pressure);

    Ok((0..args.pixels)
        .map(|_| {
            let class = LandCoverClass::ALL[rng.random_range(0..LandCoverClass::ALL.len())];
            let delta = rng.random_range(0.1..args.max_delta.max(0.2));
            let wind = args.wind_speed * rng.random_range(0.5..1.5);
            let obs = PixelObservation::new(
                class,
                Kelvin::from(*air + delta),
                air,
                MetersPerSecond::from(wind),
            )
            .with_air_density(rho);
            match args.reference_height {
                Some(z_r) => obs.with_reference_height(Meters::from(z_r)),
                None => obs,
            }
        })
        .collect())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config: SolverConfig = match &args.config {
        Some(path) => read_json(path)?,
        None => SolverConfig::default(),
    };
    if args.neutral {
        config = config.with_stability_mode(StabilityMode::Neutral);
    }
    if let Some(max_iterations) = args.max_iterations {
        config = config.with_max_iterations(max_iterations);
    }
    let solver = FluxSolver::new(config, &RoughnessTable::nlcd())?;

    let observations: Vec<PixelObservation> = match &args.observations {
        Some(path) => read_json(path)?,
        None => synthetic_scene(&args)?,
    };
    info!(pixels = observations.len(), "Loaded scene");

    let start = Instant::now();
    let report = solve_batch(&solver, &observations);
    let elapsed = start.elapsed();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    } else {
        println!("=== Sensible Heat Flux Batch ===\n");
        println!("{}", report.summary);
        println!(
            "Solved in {:.1} ms ({:.2} µs/pixel)",
            elapsed.as_secs_f64() * 1e3,
            elapsed.as_secs_f64() * 1e6 / observations.len().max(1) as f64
        );
        for (index, error) in report.failures().take(5) {
            println!("  pixel {index}: {error}");
        }
    }

    if let Some(path) = &args.output {
        let records: Vec<PixelRecord> = observations
            .iter()
            .zip(&report.results)
            .enumerate()
            .map(|(index, (obs, result))| PixelRecord::new(index, obs, result))
            .collect();
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &records)?;
        info!(path = %path.display(), "Wrote per-pixel results");
    }

    Ok(())
}
