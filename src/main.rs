//! EmberMate CLI
//!
//! Command-line front end for the day log:
//! - Log doses, mood, vitals, symptoms, sleep and check-in sliders
//! - Show a day or a window of history
//! - Print the day score and insights
//! - Export history as CSV

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use embermate::config::{generate_default_config, Config, LoggingConfig};
use embermate::dates::{parse_day, parse_window};
use embermate::export::write_csv;
use embermate::insights::{
    day_score, window_bounds, CorrelationRanking, DayScore, InsightReport, InsightsMemo,
};
use embermate::session::SessionCache;
use embermate::snapshot::{DaySnapshot, DoseStatus, MedicationDose, MoodEntry, Symptoms};
use embermate::storage::{DayStore, History, RecordStore};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "embermate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Daily health log with explainable insights")]
#[command(long_about = "EmberMate keeps one health record per day.\nLog doses, mood, vitals, symptoms and sleep, then see how they move together.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the day's medication doses
    Dose {
        #[command(subcommand)]
        action: DoseAction,
    },

    /// Log a mood entry
    Mood {
        /// Score from 1 to 10
        score: u8,
        /// Short label ("calm", "anxious")
        label: Option<String>,
        /// Time-of-day tag ("Morning", "Evening")
        #[arg(short, long)]
        time_of_day: Option<String>,
        /// Day: today, yesterday or YYYY-MM-DD
        #[arg(short, long, default_value = "today")]
        date: String,
    },

    /// Log vital signs; fields not given keep their current value
    Vitals {
        #[arg(long)]
        systolic: Option<u16>,
        #[arg(long)]
        diastolic: Option<u16>,
        #[arg(long)]
        heart_rate: Option<u16>,
        #[arg(long)]
        spo2: Option<f64>,
        /// Body temperature in °C
        #[arg(long)]
        temperature: Option<f64>,
        /// Blood glucose in mg/dL
        #[arg(long)]
        glucose: Option<f64>,
        #[arg(short, long, default_value = "today")]
        date: String,
    },

    /// Replace the day's symptoms
    Symptoms {
        /// Symptom tags
        tags: Vec<String>,
        /// Overall intensity from 1 to 5
        #[arg(short, long)]
        intensity: Option<u8>,
        #[arg(short, long)]
        notes: Option<String>,
        #[arg(short, long, default_value = "today")]
        date: String,
    },

    /// Log last night's sleep
    Sleep {
        /// Hours slept
        #[arg(long)]
        hours: Option<f64>,
        /// Quality from 0 to 10
        #[arg(long)]
        quality: Option<u8>,
        #[arg(short, long, default_value = "today")]
        date: String,
    },

    /// Set the daily mood, energy and pain sliders (0-10)
    Checkin {
        #[arg(long)]
        mood: Option<u8>,
        #[arg(long)]
        energy: Option<u8>,
        #[arg(long)]
        pain: Option<u8>,
        #[arg(short, long, default_value = "today")]
        date: String,
    },

    /// Show one day
    Show {
        #[arg(default_value = "today")]
        date: String,
    },

    /// List logged days
    History {
        /// Window length (e.g. 7d, 2w)
        #[arg(short, long, default_value = "7d")]
        last: String,
        /// Last day of the window
        #[arg(short, long, default_value = "today")]
        end: String,
    },

    /// Show the composite day score
    Score {
        #[arg(default_value = "today")]
        date: String,
    },

    /// Show adherence, score, weekly summary and signal patterns
    Insights {
        #[arg(default_value = "today")]
        date: String,
        /// Correlation window (e.g. 14d, 4w)
        #[arg(short, long)]
        window: Option<String>,
    },

    /// Export history as CSV
    Export {
        #[arg(short, long, default_value = "30d")]
        last: String,
        #[arg(short, long, default_value = "today")]
        end: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show storage status
    Status,

    /// Print a config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the effective config instead of the commented template
        #[arg(long)]
        resolved: bool,
    },
}

#[derive(Subcommand)]
enum DoseAction {
    /// Schedule a dose for the day
    Add {
        /// Stable dose id ("morning")
        id: String,
        #[arg(long)]
        label: Option<String>,
        /// Scheduled time ("8:10 AM")
        #[arg(long)]
        time: Option<String>,
        #[arg(long, default_value = "planned")]
        status: DoseStatus,
        #[arg(short, long, default_value = "today")]
        date: String,
    },

    /// Mark a dose planned, taken or missed
    Mark {
        id: String,
        status: DoseStatus,
        #[arg(short, long, default_value = "today")]
        date: String,
    },

    /// List the day's doses
    List {
        #[arg(short, long, default_value = "today")]
        date: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.clone();
    }

    init_logging(&config.logging)?;

    if let Commands::Config { output, resolved } = &cli.command {
        let text = if *resolved {
            toml::to_string_pretty(&config)?
        } else {
            generate_default_config()
        };
        return write_or_print(output.as_ref(), &text);
    }

    let store = Arc::new(
        RecordStore::open(config.storage.to_store_config())
            .await
            .with_context(|| format!("opening day log in {}", config.storage.data_dir))?,
    );
    tracing::info!("Data directory: {:?}", store.data_dir());

    let cache = Arc::new(SessionCache::new(store.clone(), config.session.clone()));
    let flush_handle = cache.start_background_flush();

    let today = chrono::Local::now().date_naive();
    let outcome = run(&cli, &config, &store, &cache, today).await;

    let shutdown = cache.shutdown().await;
    flush_handle.abort();

    outcome?;
    shutdown.context("saving changes")?;
    Ok(())
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("embermate={}", config.level)));

    let writer = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let (json, pretty) = if config.format == "json" {
        (Some(tracing_subscriber::fmt::layer().json().with_writer(writer)), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer().with_writer(writer)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .init();
    Ok(())
}

async fn run(
    cli: &Cli,
    config: &Config,
    store: &RecordStore,
    cache: &Arc<SessionCache>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let json = cli.format == "json";

    match &cli.command {
        Commands::Dose { action } => match action {
            DoseAction::Add {
                id,
                label,
                time,
                status,
                date,
            } => {
                let date = parse_day(date, today)?;
                let mut dose = MedicationDose::new(id.clone(), *status);
                if let Some(label) = label {
                    dose = dose.label(label.clone());
                }
                if let Some(time) = time {
                    dose = dose.at(time.clone());
                }
                cache.add_dose(date, dose).await?;
                println!("Scheduled dose '{}' on {}", id, date);
            }
            DoseAction::Mark { id, status, date } => {
                let date = parse_day(date, today)?;
                cache.set_dose_status(date, id, *status).await?;
                println!("Marked '{}' {} on {}", id, status, date);
            }
            DoseAction::List { date } => {
                let date = parse_day(date, today)?;
                let day = cache.get(date).await?.unwrap_or_else(|| DaySnapshot::new(date));
                if json {
                    println!("{}", serde_json::to_string_pretty(day.doses())?);
                } else {
                    print_doses(&day);
                }
            }
        },

        Commands::Mood {
            score,
            label,
            time_of_day,
            date,
        } => {
            let date = parse_day(date, today)?;
            let mut entry = MoodEntry::new(*score, label.clone().unwrap_or_default());
            if let Some(tag) = time_of_day {
                entry = entry.time_of_day(tag.clone());
            }
            cache.add_mood(date, entry).await?;
            println!("Logged mood {} on {}", score, date);
        }

        Commands::Vitals {
            systolic,
            diastolic,
            heart_rate,
            spo2,
            temperature,
            glucose,
            date,
        } => {
            let date = parse_day(date, today)?;
            let current = cache.get(date).await?;
            let mut vitals = current.and_then(|d| d.vitals).unwrap_or_default();

            let mut changed = false;
            changed |= overlay(&mut vitals.systolic, *systolic);
            changed |= overlay(&mut vitals.diastolic, *diastolic);
            changed |= overlay(&mut vitals.heart_rate, *heart_rate);
            changed |= overlay(&mut vitals.spo2, *spo2);
            changed |= overlay(&mut vitals.temperature_c, *temperature);
            changed |= overlay(&mut vitals.blood_glucose, *glucose);
            if !changed {
                bail!("Nothing to log: pass at least one vital");
            }

            cache.set_vitals(date, vitals).await?;
            println!("Logged vitals on {}", date);
        }

        Commands::Symptoms {
            tags,
            intensity,
            notes,
            date,
        } => {
            let date = parse_day(date, today)?;
            let mut symptoms = Symptoms::new(tags.iter().cloned());
            if let Some(intensity) = intensity {
                symptoms = symptoms.intensity(*intensity);
            }
            if let Some(notes) = notes {
                symptoms = symptoms.notes(notes.clone());
            }
            cache.set_symptoms(date, symptoms).await?;
            println!("Logged {} symptom(s) on {}", tags.len(), date);
        }

        Commands::Sleep {
            hours,
            quality,
            date,
        } => {
            let date = parse_day(date, today)?;
            let current = cache.get(date).await?;
            let mut sleep = current.and_then(|d| d.sleep).unwrap_or_default();

            if !(overlay(&mut sleep.hours, *hours) | overlay(&mut sleep.quality, *quality)) {
                bail!("Nothing to log: pass --hours and/or --quality");
            }
            cache.set_sleep(date, sleep).await?;
            println!("Logged sleep on {}", date);
        }

        Commands::Checkin {
            mood,
            energy,
            pain,
            date,
        } => {
            let date = parse_day(date, today)?;
            let current = cache.get(date).await?;
            let mut check_in = current.and_then(|d| d.check_in).unwrap_or_default();

            let changed = overlay(&mut check_in.mood, *mood)
                | overlay(&mut check_in.energy, *energy)
                | overlay(&mut check_in.pain, *pain);
            if !changed {
                bail!("Nothing to log: pass --mood, --energy or --pain");
            }
            cache.set_check_in(date, check_in).await?;
            println!("Checked in on {}", date);
        }

        Commands::Show { date } => {
            let date = parse_day(date, today)?;
            match cache.get(date).await? {
                Some(day) if json => println!("{}", serde_json::to_string_pretty(&day)?),
                Some(day) => print_day(&day, config),
                None if json => println!("null"),
                None => println!("Nothing logged for {}", date),
            }
        }

        Commands::History { last, end } => {
            let history = load_window(&**cache, last, end, today).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&history.days)?);
            } else {
                print_history(&history, config);
            }
        }

        Commands::Score { date } => {
            let date = parse_day(date, today)?;
            let score = match cache.get(date).await? {
                Some(day) => day_score(&day, config.insights.rounding),
                None => DayScore::NotEnoughData,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&score)?);
            } else {
                println!("Day score for {}: {}", date, score);
            }
        }

        Commands::Insights { date, window } => {
            let date = parse_day(date, today)?;
            let mut settings = config.insights.clone();
            if let Some(window) = window {
                settings.correlation_window_days = parse_window(window)?;
            }

            let window_days = settings.correlation_window_days;

            let mut memo = InsightsMemo::new(settings);
            let report = memo.report(&**cache, date).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(report)?);
            } else {
                print_report(report, window_days);
            }
        }

        Commands::Export { last, end, output } => {
            let history = load_window(&**cache, last, end, today).await?;
            match output {
                Some(path) => {
                    let file = std::fs::File::create(path)
                        .with_context(|| format!("creating {:?}", path))?;
                    write_csv(&history, config.insights.rounding, file)?;
                    println!("Exported {} day(s) to {:?}", history.len(), path);
                }
                None => write_csv(&history, config.insights.rounding, std::io::stdout().lock())?,
            }
        }

        Commands::Status => {
            let stats = store.stats().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("EmberMate v{}", env!("CARGO_PKG_VERSION"));
                println!();
                println!("Data directory: {}", store.data_dir().display());
                println!("{}", stats);
            }
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

/// Set `slot` when a value was given; reports whether it did
fn overlay<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

async fn load_window(
    store: &dyn DayStore,
    last: &str,
    end: &str,
    today: NaiveDate,
) -> anyhow::Result<History> {
    let end = parse_day(end, today)?;
    let (start, end) = window_bounds(end, parse_window(last)?);
    let history = store.range(start, end).await?;
    for date in history.skipped_dates() {
        eprintln!("warning: {} could not be read and was skipped", date);
    }
    Ok(history)
}

fn write_or_print(output: Option<&PathBuf>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, text)?;
            println!("Config written to {:?}", path);
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_doses(day: &DaySnapshot) {
    if day.doses().is_empty() {
        println!("No doses scheduled for {}", day.date);
        return;
    }

    println!("{:<12} {:<20} {:<10} {}", "Id", "Label", "Time", "Status");
    println!("{}", "-".repeat(52));
    for dose in day.doses() {
        println!("{:<12} {:<20} {:<10} {}", dose.id, dose.label, dose.time, dose.status);
    }
    println!();
    println!("Adherence: {}", embermate::insights::adherence(day));
}

fn print_day(day: &DaySnapshot, config: &Config) {
    println!("{}", day.date);
    println!("{}", "=".repeat(10));

    if day.medications.is_some() {
        println!();
        print_doses(day);
    }

    if day.mood_entries.is_some() {
        println!();
        println!("Mood:");
        for entry in day.moods_newest_first() {
            println!("  {:>2}/10  {:<12} {}", entry.score, entry.time_of_day, entry.label);
        }
    }

    if let Some(check_in) = &day.check_in {
        println!();
        println!(
            "Check-in: mood {}, energy {}, pain {}",
            or_dash(check_in.mood),
            or_dash(check_in.energy),
            or_dash(check_in.pain)
        );
    }

    if let Some(v) = &day.vitals {
        println!();
        println!("Vitals:");
        if v.systolic.is_some() || v.diastolic.is_some() {
            println!("  Blood pressure: {}/{} mmHg", or_dash(v.systolic), or_dash(v.diastolic));
        }
        if let Some(hr) = v.heart_rate {
            println!("  Heart rate:     {} bpm", hr);
        }
        if let Some(spo2) = v.spo2 {
            println!("  SpO2:           {}%", spo2);
        }
        if let Some(t) = v.temperature_c {
            println!("  Temperature:    {:.1} °C", t);
        }
        if let Some(g) = v.blood_glucose {
            println!("  Glucose:        {} mg/dL", g);
        }
        if let Some(stable) = config.insights.vital_ranges.is_stable(v) {
            println!("  {}", if stable { "Within usual range" } else { "Outside usual range" });
        }
    }

    if let Some(s) = &day.symptoms {
        println!();
        let tags: Vec<&str> = s.tags.iter().map(String::as_str).collect();
        println!("Symptoms: {} (intensity {})", tags.join(", "), or_dash(s.intensity));
        if !s.notes.is_empty() {
            println!("  {}", s.notes);
        }
    }

    if let Some(s) = &day.sleep {
        println!();
        println!("Sleep: {} h, quality {}", or_dash(s.hours), or_dash(s.quality));
    }

    println!();
    println!("Day score: {}", day_score(day, config.insights.rounding));
}

fn print_history(history: &History, config: &Config) {
    if history.is_empty() {
        println!("No days logged in this window");
        return;
    }

    println!(
        "{:<12} | {:<14} | {:<6} | {:<7} | {:<8} | {}",
        "Date", "Doses", "Mood", "Sleep", "Symptoms", "Score"
    );
    println!("{}", "-".repeat(68));

    for day in &history.days {
        let doses = match embermate::insights::adherence(day) {
            embermate::insights::Adherence::Ratio { taken, total } => format!("{}/{}", taken, total),
            embermate::insights::Adherence::NoDosesConfigured => "-".to_string(),
        };
        let mood = embermate::insights::mood_level(day).map(|m| format!("{:.1}", m));
        let sleep = day.sleep.as_ref().and_then(|s| s.hours).map(|h| format!("{:.1}h", h));
        let symptoms = day.symptoms.as_ref().map(|s| s.tags.len());

        println!(
            "{:<12} | {:<14} | {:<6} | {:<7} | {:<8} | {}",
            day.date,
            doses,
            or_dash(mood),
            or_dash(sleep),
            or_dash(symptoms),
            or_dash(day_score(day, config.insights.rounding).value())
        );
    }
}

fn print_report(report: &InsightReport, correlation_window: u32) {
    println!("Insights for {}", report.date);
    println!();
    println!("  Day score:  {}", report.day_score);
    println!("  Adherence:  {}", report.adherence);

    let s = &report.summary;
    println!();
    println!("Summary {} to {}", s.start, s.end);
    println!(
        "  Check-in consistency: {}% ({} of {} days)",
        s.consistency_percent, s.active_days, s.days_in_window
    );
    println!(
        "  Stable vitals:        {} of {} days",
        s.stable_vitals_days, s.days_with_vitals
    );
    println!(
        "  Average sleep:        {}",
        s.average_sleep_hours
            .map(|h| format!("{:.1} h", h))
            .unwrap_or_else(|| "not logged".to_string())
    );
    println!("  Medication adherence: {}", s.adherence);
    println!("  Tough days:           {} of {} scored", s.tough_days, s.scored_days);

    println!();
    println!("Patterns (last {} days)", correlation_window);
    match &report.correlations {
        CorrelationRanking::InsufficientData { days_available } => {
            println!(
                "  Not enough data yet: {} day(s) logged, at least 2 needed",
                days_available
            );
        }
        CorrelationRanking::Ranked { pairs, .. } if pairs.is_empty() => {
            println!("  No two signals were logged on the same days yet");
        }
        CorrelationRanking::Ranked { pairs, days_used } => {
            for pair in pairs.iter().take(5) {
                println!(
                    "  {:<36} {:<10} {:<8} {:.2}  ({} changes)",
                    pair.label(),
                    pair.strength_label(),
                    format!("{:?}", pair.direction).to_lowercase(),
                    pair.strength,
                    pair.sample_size
                );
            }
            println!("  Based on {} logged day(s)", days_used);
        }
    }

    if !report.skipped_days.is_empty() {
        let days: Vec<String> = report.skipped_days.iter().map(|d| d.to_string()).collect();
        println!();
        println!("Skipped unreadable days: {}", days.join(", "));
    }

    println!();
    println!("{}", report.disclaimer);
}
