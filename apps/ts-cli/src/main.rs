use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use ts_app::{
    AppError, AppResult, EngineConfig, EngineRunner, EngineView, SimulateOptions,
    SimulateProgress, TitrationEngine, load_config, simulate_with_progress, stop_volume_l,
};
use ts_chem::{IndicatorKind, ReactantKind};
use ts_core::units::{in_ml, liters};
use ts_results::{
    ExperimentRecord, ExperimentStore, JsonFileStore, format_timestamp, write_csv,
};
use ts_sim::TitrationPoint;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ts-cli")]
#[command(about = "TitraSim CLI - Acid-base titration simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a titration and print the result
    Simulate(SimulateArgs),
    /// List saved experiments
    List {
        /// Experiment store directory
        #[arg(long, default_value = "experiments")]
        store: PathBuf,
    },
    /// Show details of a saved experiment
    Show {
        /// Experiment ID
        id: String,
        /// Experiment store directory
        #[arg(long, default_value = "experiments")]
        store: PathBuf,
    },
    /// Export the curve of a saved experiment as CSV
    Export {
        /// Experiment ID
        id: String,
        /// Experiment store directory
        #[arg(long, default_value = "experiments")]
        store: PathBuf,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a saved experiment
    Delete {
        /// Experiment ID
        id: String,
        /// Experiment store directory
        #[arg(long, default_value = "experiments")]
        store: PathBuf,
    },
    /// List available indicators
    Indicators,
}

#[derive(Args)]
struct SimulateArgs {
    /// Experiment config file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Analyte character (acid or base); the titrant is the opposite
    #[arg(long)]
    analyte: Option<ReactantKind>,
    /// Analyte concentration (mol/L)
    #[arg(long)]
    analyte_conc: Option<f64>,
    /// Analyte volume (mL)
    #[arg(long)]
    analyte_ml: Option<f64>,
    /// Titrant concentration (mol/L)
    #[arg(long)]
    titrant_conc: Option<f64>,
    /// Indicator (phenolphthalein, methylOrange, bromothymolBlue)
    #[arg(long)]
    indicator: Option<IndicatorKind>,
    /// Stop after this much titrant (mL); defaults to burette capacity
    #[arg(long)]
    stop_at: Option<f64>,
    /// Dispense in real time instead of on a virtual clock
    #[arg(long)]
    realtime: bool,
    /// Write the recorded curve to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Save the experiment into this store directory
    #[arg(long)]
    save: Option<PathBuf>,
    /// Experiment name used when saving
    #[arg(long, default_value = "Titration")]
    name: String,
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => cmd_simulate(&args),
        Commands::List { store } => cmd_list(&store),
        Commands::Show { id, store } => cmd_show(&store, &id),
        Commands::Export { id, store, output } => cmd_export(&store, &id, output.as_deref()),
        Commands::Delete { id, store } => cmd_delete(&store, &id),
        Commands::Indicators => cmd_indicators(),
    }
}

fn build_config(args: &SimulateArgs) -> AppResult<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(kind) = args.analyte {
        config.analyte.kind = kind;
        config.titrant.kind = kind.opposite();
    }
    if let Some(c) = args.analyte_conc {
        config.analyte.concentration_molar = c;
    }
    if let Some(v) = args.analyte_ml {
        config.analyte.volume_ml = v;
    }
    if let Some(c) = args.titrant_conc {
        config.titrant.concentration_molar = c;
    }
    if let Some(indicator) = args.indicator {
        config.indicator = indicator;
    }
    tracing::debug!(?config, "experiment config");
    Ok(config)
}

fn cmd_simulate(args: &SimulateArgs) -> AppResult<()> {
    let config = build_config(args)?;
    println!(
        "Titrating {} mL of {} M {} with {} M {}",
        config.analyte.volume_ml,
        config.analyte.concentration_molar,
        config.analyte.kind,
        config.titrant.concentration_molar,
        config.titrant.kind
    );

    if args.realtime {
        let mut runner = EngineRunner::new(TitrationEngine::new(&config)?);
        let target_l = stop_volume_l(args.stop_at, runner.view().max_volume_l)?;
        run_realtime(&mut runner, target_l)?;
        let view = runner.view();
        print_summary(&view);
        finish(&view.points, |store| runner.save(store, &args.name), args)
    } else {
        let options = SimulateOptions {
            stop_at_ml: args.stop_at,
            start_ms: None,
            progress_every: 200,
        };
        let mut last_emit = Instant::now();
        let response = simulate_with_progress(
            &config,
            &options,
            Some(&mut |event| {
                if last_emit.elapsed().as_millis() >= 100 {
                    render_progress(&event);
                    last_emit = Instant::now();
                }
            }),
        )?;
        clear_progress_line();
        println!(
            "✓ Simulated {} ticks in {:.3}s",
            response.ticks, response.elapsed_wall_s
        );
        let engine = &response.engine;
        print_summary(&engine.view());
        finish(
            engine.titration_points(),
            |store| engine.save_to(store, &args.name),
            args,
        )
    }
}

/// Dispense in real time until `target_l` is reached or the burette is empty.
fn run_realtime(runner: &mut EngineRunner, target_l: f64) -> AppResult<()> {
    let started = Instant::now();
    runner.start()?;
    let period = Duration::from_millis(100);
    loop {
        thread::sleep(period);
        let snap = runner.snapshot();
        render_bar(
            (snap.volume_added / target_l).clamp(0.0, 1.0),
            in_ml(liters(snap.volume_added)),
            snap.ph,
        );
        if !snap.dispensing || snap.volume_added >= target_l {
            break;
        }
    }
    runner.stop();
    clear_progress_line();
    println!(
        "✓ Dispensed in real time for {:.1}s",
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Optional CSV export and save after a run.
fn finish(
    points: &[TitrationPoint],
    save: impl FnOnce(&dyn ExperimentStore) -> AppResult<ExperimentRecord>,
    args: &SimulateArgs,
) -> AppResult<()> {
    if let Some(path) = &args.csv {
        write_csv(path, points)?;
        println!(
            "✓ Exported {} data points to {}",
            points.len(),
            path.display()
        );
    }

    if let Some(dir) = &args.save {
        let store = JsonFileStore::new(dir.clone())?;
        let record = save(&store)?;
        println!("✓ Saved experiment {} to {}", record.id, dir.display());
    }
    Ok(())
}

fn print_summary(view: &EngineView) {
    let snap = &view.snapshot;
    let state = &snap.state;
    let color = snap.color.to_rgba8();

    println!("\nResult:");
    println!(
        "  Volume added:      {:.3} mL",
        in_ml(liters(snap.volume_added))
    );
    println!("  pH:                {:.3}", snap.ph);
    println!(
        "  Equivalence point: {:.3} mL",
        in_ml(liters(snap.equivalence_volume))
    );
    println!(
        "  Indicator:         {} #{:02x}{:02x}{:02x} (alpha {})",
        view.indicator,
        color[0],
        color[1],
        color[2],
        color[3]
    );
    println!(
        "  Solution:          {:.3} mL at {:.1} °C",
        in_ml(liters(state.volume_l)),
        state.temperature_celsius()
    );
    for (species, amount) in &state.moles {
        println!("    {:<8} {:.6} mol", species, amount);
    }

    if let Some(summary) = view.curve_summary() {
        println!("\nCurve:");
        println!("  Points:   {}", summary.count);
        println!("  pH range: {:.3} - {:.3}", summary.min_ph, summary.max_ph);
        if let Some(v) = summary.steepest_volume {
            println!("  Steepest: {:.3} mL", in_ml(liters(v)));
        }
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_progress(event: &SimulateProgress) {
    render_bar(event.fraction_complete, event.volume_added_ml, event.ph);
}

fn render_bar(fraction_complete: f64, volume_ml: f64, ph: f64) {
    let width = 28usize;
    let filled = ((fraction_complete * width as f64).round() as usize).min(width);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    print!(
        "\r[{}] {:>6.2}%  V={:.3} mL  pH={:.3}",
        bar,
        fraction_complete * 100.0,
        volume_ml,
        ph
    );
    let _ = io::stdout().flush();
}

fn open_store(dir: &Path) -> AppResult<JsonFileStore> {
    if !dir.is_dir() {
        return Err(AppError::Persistence(format!(
            "no experiment store at {}",
            dir.display()
        )));
    }
    Ok(JsonFileStore::new(dir.to_path_buf())?)
}

fn cmd_list(store_dir: &Path) -> AppResult<()> {
    let store = open_store(store_dir)?;
    let headers = store.list()?;

    if headers.is_empty() {
        println!("No experiments found in {}", store_dir.display());
    } else {
        println!("Experiments in {}:", store_dir.display());
        for h in headers {
            println!(
                "  {}  {}  {} ({} points)",
                h.id,
                format_timestamp(h.timestamp),
                h.name,
                h.point_count
            );
        }
    }
    Ok(())
}

fn cmd_show(store_dir: &Path, id: &str) -> AppResult<()> {
    let store = open_store(store_dir)?;
    let record = store.load(id)?;

    println!("Experiment: {} ({})", record.name, record.id);
    println!("  Saved:         {}", format_timestamp(record.timestamp));
    println!(
        "  Analyte:       {} mL of {} M {}",
        in_ml(liters(record.settings.initial_volume)),
        record.settings.concentration,
        record.settings.species
    );
    println!(
        "  Droplet:       {:.4} mL per tick",
        in_ml(liters(record.settings.droplet_volume))
    );
    println!("  Points:        {}", record.titration_points.len());
    if let Some(last) = record.titration_points.last() {
        println!(
            "  Final:         {:.3} mL, pH {:.3}",
            in_ml(liters(last.volume_added)),
            last.ph
        );
    }
    println!(
        "  Final volume:  {:.3} mL",
        in_ml(liters(record.final_state.volume_l))
    );
    for (species, amount) in &record.final_state.moles {
        println!("    {:<8} {:.6} mol", species, amount);
    }
    Ok(())
}

fn cmd_export(store_dir: &Path, id: &str, output: Option<&Path>) -> AppResult<()> {
    let store = open_store(store_dir)?;
    let record = store.load(id)?;

    if let Some(path) = output {
        write_csv(path, &record.titration_points)?;
        println!(
            "✓ Exported {} data points to {}",
            record.titration_points.len(),
            path.display()
        );
    } else {
        print!("{}", ts_results::export_csv(&record.titration_points));
    }
    Ok(())
}

fn cmd_delete(store_dir: &Path, id: &str) -> AppResult<()> {
    let store = open_store(store_dir)?;
    store.delete(id)?;
    println!("✓ Deleted experiment {}", id);
    Ok(())
}

fn cmd_indicators() -> AppResult<()> {
    println!("Indicators:");
    for kind in IndicatorKind::ALL {
        let p = kind.profile();
        println!(
            "  {:<16} {:<18} pH {:.1} - {:.1}",
            kind.key(),
            p.name,
            p.ph_range.min,
            p.ph_range.max
        );
    }
    Ok(())
}
