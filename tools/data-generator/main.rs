use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use saisei::data::InitialData;
use serde_json::{Map, Value, json};

/// A CLI tool to generate initial data for the Saisei workflow simulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_data.json")]
    output: String,

    /// The number of historic readings to generate for aggregation nodes
    #[arg(long, default_value_t = 10)]
    readings: usize,

    /// Seed for reproducible data
    #[arg(long)]
    seed: Option<u64>,

    /// Generate readings above the alarm threshold
    #[arg(long)]
    hot: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    println!(
        "Generating new initial data ({} readings, {} profile)...",
        cli.readings,
        if cli.hot { "hot" } else { "normal" }
    );

    let mut data = generate_sensor_data(&mut rng, cli.hot);
    data.insert(
        "readings".to_string(),
        generate_readings(&mut rng, cli.readings, cli.hot),
    );

    InitialData::from(data).save(&cli.output)?;

    println!("Successfully generated and saved initial data to '{}'", cli.output);

    Ok(())
}

/// Generates the current sensor values.
fn generate_sensor_data(rng: &mut StdRng, hot: bool) -> Map<String, Value> {
    let temperature = if hot {
        rng.random_range(91.0..120.0)
    } else {
        rng.random_range(40.0..90.0)
    };

    let mut data = Map::new();
    data.insert("temperature".to_string(), json!(round(temperature)));
    data.insert("vibration".to_string(), json!(round(rng.random_range(5.0..80.0))));
    data.insert("pressure".to_string(), json!(round(rng.random_range(0.8..1.6))));
    data.insert("humidity".to_string(), json!(round(rng.random_range(20.0..70.0))));
    data.insert(
        "sensor".to_string(),
        json!({
            "id": format!("S-{:04}", rng.random_range(1..10_000)),
            "online": rng.random_bool(0.95),
        }),
    );
    println!("-> Generated sensor values.");
    data
}

/// Generates a series of temperature readings.
fn generate_readings(rng: &mut StdRng, count: usize, hot: bool) -> Value {
    let range = if hot { 85.0..115.0 } else { 40.0..90.0 };
    let readings: Vec<f64> = (0..count)
        .map(|_| round(rng.random_range(range.clone())))
        .collect();
    println!("-> Generated {} readings.", readings.len());
    json!(readings)
}

fn round(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
