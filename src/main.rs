use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lai_sim::{
    analyser::SegmentAnalyser,
    curve::CurveGenerator,
    example_data::ExampleDataGenerator,
    hair::HairStrand,
    models::*,
    output::ResultStore,
    parser::ObservationParser,
    LaiSimulator,
};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    let config = create_simulation_config(&matches)?;
    config.validate()?;

    std::fs::create_dir_all(&config.output_path).with_context(|| {
        format!("creating output directory {}", config.output_path.display())
    })?;

    if matches.get_flag("generate-example") {
        let noise = *matches.get_one::<f64>("noise").unwrap_or(&0.15);
        if let TuningSource::Observations { path } = &config.source {
            ExampleDataGenerator::generate_dataset(path, noise)?;
            println!("Generated example dataset: {}", path.display());
        }
    }

    let summary = run_simulation(&config)?;
    print_simulation_summary(&summary);

    Ok(())
}

fn build_cli() -> Command {
    Command::new("LAI Simulator")
        .version("0.1")
        .about("Plasma levels after single and repeated long-acting injectable doses")
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("NAME")
                .help("Simulation name, used as the output file prefix")
                .default_value("lai"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for results")
                .default_value("./lai_results"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("CSV of observed plasma levels (time,concentration)")
                .conflicts_with_all(["tmax", "generate-example"]),
        )
        .arg(
            Arg::new("tmax")
                .long("tmax")
                .value_name("DAYS")
                .help("Days from injection to peak plasma level")
                .value_parser(value_parser!(f64))
                .requires("cmax")
                .requires("thalf"),
        )
        .arg(
            Arg::new("cmax")
                .long("cmax")
                .value_name("LEVEL")
                .help("Peak plasma level")
                .value_parser(value_parser!(f64))
                .requires("tmax"),
        )
        .arg(
            Arg::new("thalf")
                .long("thalf")
                .value_name("DAYS")
                .help("Elimination half-life in days")
                .value_parser(value_parser!(f64))
                .requires("tmax"),
        )
        .arg(
            Arg::new("generate-example")
                .long("generate-example")
                .help("Generate a noisy example dataset and fit it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("noise")
                .long("noise")
                .value_name("CV")
                .help("Coefficient of variation of the example dataset noise")
                .value_parser(value_parser!(f64))
                .default_value("0.15"),
        )
        .arg(
            Arg::new("duration")
                .short('d')
                .long("duration")
                .value_name("DAYS")
                .help("Days of single-dose curve to simulate")
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("initial-guess")
                .long("initial-guess")
                .value_names(["D", "M", "N"])
                .help("Starting values for the fit")
                .num_args(3)
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("doses")
                .short('n')
                .long("doses")
                .value_name("NUMBER")
                .help("Number of further doses after the first")
                .value_parser(value_parser!(usize))
                .default_value("0"),
        )
        .arg(
            Arg::new("interval")
                .long("interval")
                .value_name("DAYS")
                .help("Days between doses")
                .value_parser(value_parser!(usize))
                .default_value("28"),
        )
        .arg(
            Arg::new("segments")
                .long("segments")
                .value_name("NUMBER")
                .help("Cut the simulated strand into this many hair segments")
                .value_parser(value_parser!(usize))
                .conflicts_with("segment-length"),
        )
        .arg(
            Arg::new("segment-length")
                .long("segment-length")
                .value_name("DAYS")
                .help("Cut the simulated strand into segments of this many days")
                .value_parser(value_parser!(usize)),
        )
}

fn create_simulation_config(matches: &ArgMatches) -> anyhow::Result<SimulationConfig> {
    let name = matches.get_one::<String>("name").cloned().unwrap_or_default();
    let output_path = PathBuf::from(
        matches
            .get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or("./lai_results"),
    );

    let source = if let Some(input) = matches.get_one::<String>("input") {
        TuningSource::Observations {
            path: PathBuf::from(input),
        }
    } else if matches.get_flag("generate-example") {
        TuningSource::Observations {
            path: output_path.join(format!("{}_observations.csv", name)),
        }
    } else {
        match (
            matches.get_one::<f64>("tmax"),
            matches.get_one::<f64>("cmax"),
            matches.get_one::<f64>("thalf"),
        ) {
            (Some(&tmax), Some(&cmax), Some(&thalf)) => {
                TuningSource::Descriptors(PkDescriptors::new(tmax, cmax, thalf))
            }
            _ => anyhow::bail!(
                "Provide --input, --generate-example, or all of --tmax, --cmax and --thalf"
            ),
        }
    };

    let initial_guess = match matches.get_many::<f64>("initial-guess") {
        Some(values) => {
            let values: Vec<f64> = values.copied().collect();
            FitParameters::new(values[0], values[1], values[2])
        }
        None => FitParameters::DEFAULT_GUESS,
    };

    let segmentation = if let Some(&n) = matches.get_one::<usize>("segments") {
        Some(Segmentation::Count(n))
    } else {
        matches
            .get_one::<usize>("segment-length")
            .map(|&len| Segmentation::Length(len))
    };

    Ok(SimulationConfig {
        name,
        output_path,
        source,
        duration: matches.get_one::<i64>("duration").copied(),
        initial_guess,
        num_doses: matches.get_one::<usize>("doses").copied().unwrap_or(0),
        dose_interval: matches.get_one::<usize>("interval").copied().unwrap_or(28),
        segmentation,
    })
}

fn run_simulation(config: &SimulationConfig) -> anyhow::Result<RunSummary> {
    let mut simulator = LaiSimulator::new(config.name.clone());

    match &config.source {
        TuningSource::Observations { path } => {
            let observations = ObservationParser::parse_file(path)
                .with_context(|| format!("reading observations from {}", path.display()))?;
            println!("Loaded {} observations", observations.len());

            // cover the last observed day unless told otherwise
            let last_time = observations.times().last().copied().unwrap_or(0.0);
            let duration = config
                .duration
                .unwrap_or_else(|| CurveGenerator::days_in(last_time) + 1);
            simulator.tune(&observations, duration, &config.initial_guess)?;
        }
        TuningSource::Descriptors(descriptors) => {
            simulator.pk_tune(descriptors, config.duration, &config.initial_guess)?;
        }
    }

    if config.num_doses > 0 {
        simulator.simulate_n(config.num_doses, config.dose_interval)?;
    }

    let prefix = config.output_prefix();
    for path in simulator.save(Some(prefix.as_path()))? {
        println!("Saved {}", path.display());
    }

    let fit = simulator
        .fit()
        .context("simulator produced no fit")?;
    let curve = simulator.curve().unwrap_or(&[]);
    let (single_dose_peak_day, single_dose_peak) = curve
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (day, level)| {
            if level > best.1 {
                (day, level)
            } else {
                best
            }
        });

    let strand = HairStrand::new(simulator.plasma().unwrap_or(curve).to_vec());
    let segments = match config.segmentation {
        Some(Segmentation::Count(n)) => Some(strand.segment_into_n(n)?),
        Some(Segmentation::Length(len)) => Some(strand.segment_into_len(len)?),
        None => None,
    };
    let segments = segments
        .map(|segments| SegmentAnalyser::summarize(&segments))
        .transpose()?;

    let summary = RunSummary {
        generated_at: chrono::Utc::now(),
        config: config.clone(),
        parameters: fit.parameters,
        residual_sum_of_squares: fit.residual_sum_of_squares,
        single_dose_days: curve.len(),
        single_dose_peak,
        single_dose_peak_day,
        repeated_dose_days: simulator.plasma().map(<[f64]>::len),
        segments,
    };

    let summary_path = ResultStore::save_summary(&prefix, &summary)?;
    println!("Saved {}", summary_path.display());

    Ok(summary)
}

fn print_simulation_summary(summary: &RunSummary) {
    let (d, m, n) = summary.parameters.as_tuple();

    println!("\n=== SIMULATION SUMMARY ===");
    println!("Simulation: {}", summary.config.name);
    println!("Fitted parameters: d = {:.4}, m = {:.5}/day, n = {:.5}/day", d, m, n);
    println!("Residual sum of squares: {:.4e}", summary.residual_sum_of_squares);
    println!(
        "Single dose: {} days, peak {:.3} on day {}",
        summary.single_dose_days, summary.single_dose_peak, summary.single_dose_peak_day
    );

    if let Some(days) = summary.repeated_dose_days {
        println!(
            "Repeated dosing: {} further doses every {} days over {} days",
            summary.config.num_doses, summary.config.dose_interval, days
        );
    }

    if let Some(segments) = &summary.segments {
        println!("\nHair segments (normalized means):");
        for (i, mean) in segments.normalized_means.iter().enumerate() {
            let marker = if segments.troughs.contains(&i) { "  <- trough" } else { "" };
            println!("  {:>3}: {:.3}{}", i, mean, marker);
        }
    }
}
