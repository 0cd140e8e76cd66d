mod actuator;
mod cli;
mod config;
mod datasources;
mod db;
mod error;
mod logic;
mod models;
mod notify;

use actuator::SimulatedActuator;
use chrono::{Duration, Utc};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use datasources::{ForecastProvider, OpenWeatherMapClient, StaticForecast};
use db::Database;
use error::Result;
use logic::engine::duration_for_amount;
use logic::{compute_water_requirement, needs_irrigation, DecisionEngine, Dispatcher};
use models::{CropType, Prediction, Schedule};
use notify::LogNotifier;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    // Load configuration
    let config = match Config::load(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database
    let db_path = Config::db_path(cli.data_dir.as_ref())?;
    let db = Database::open(&db_path)?;

    match cli.command {
        Commands::Run => {
            let dispatcher = build_dispatcher(&config, db);
            tracing::info!(
                interval_minutes = config.scheduler.sweep_interval_minutes,
                "Starting sweep loop"
            );
            dispatcher.run(config.sweep_interval()).await?;
        }
        Commands::Sweep => {
            let dispatcher = build_dispatcher(&config, db);
            let processed = dispatcher.sweep_due(Utc::now()).await?;
            println!("Processed {} due schedule(s)", processed);
        }
        Commands::Add {
            crop,
            crop_days,
            moisture,
            temperature,
            humidity,
            confidence,
            location,
            recipient,
            in_minutes,
            force,
        } => {
            if CropType::from_str(&crop).is_none() {
                let known: Vec<&str> = CropType::all().iter().map(|c| c.as_str()).collect();
                tracing::warn!(
                    crop = %crop,
                    "Unknown crop type, using default coefficients (known: {})",
                    known.join(", ")
                );
            }

            // The threshold policy stands in for the upstream classifier
            let irrigation_needed = needs_irrigation(moisture, &crop);
            let prediction = Prediction::new(
                &crop,
                crop_days,
                moisture,
                temperature,
                humidity,
                irrigation_needed,
                confidence,
            )?;
            let prediction_id = db.insert_prediction(&prediction)?;

            if !irrigation_needed && !force {
                println!(
                    "Prediction {} recorded; soil moisture adequate for {}, no schedule created",
                    prediction_id, crop
                );
                return Ok(());
            }

            let report =
                compute_water_requirement(&crop, temperature, crop_days, moisture);
            let mut schedule = Schedule::new(Utc::now() + Duration::minutes(in_minutes))
                .with_prediction(prediction_id)
                .with_water(
                    report.irrigation_amount_mm,
                    duration_for_amount(report.irrigation_amount_mm),
                );
            if let Some(location) = location {
                schedule = schedule.with_location(&location);
            }
            if let Some(recipient) = recipient {
                schedule = schedule.with_recipient(&recipient);
            }
            let schedule_id = db.create_schedule(&schedule)?;
            println!(
                "Schedule {} created: {:.2}mm over {} minutes at {}",
                schedule_id,
                report.irrigation_amount_mm,
                schedule.duration_minutes.unwrap_or(0),
                schedule.scheduled_time.format("%Y-%m-%d %H:%M UTC"),
            );
        }
        Commands::List { limit } => {
            let schedules = db.recent_schedules(limit)?;
            if schedules.is_empty() {
                println!("No schedules recorded");
                return Ok(());
            }
            for s in schedules {
                println!(
                    "#{:<5} {:<10} due {}  water {:>7}  {}",
                    s.id.unwrap_or(0),
                    s.status.as_str(),
                    s.scheduled_time.format("%Y-%m-%d %H:%M"),
                    s.water_amount_mm
                        .map(|w| format!("{:.1}mm", w))
                        .unwrap_or_else(|| "-".into()),
                    s.cancellation_reason.as_deref().unwrap_or(""),
                );
            }
        }
        Commands::Report {
            crop,
            crop_days,
            moisture,
            temperature,
            json,
        } => {
            let report = compute_water_requirement(&crop, temperature, crop_days, moisture);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            println!("Water requirement for {} ({} days old)", crop, crop_days);
            println!("  Growth stage:       {}", report.growth_stage);
            println!("  ETo:                {:.2} mm/day", report.eto_mm_day);
            println!("  Kc:                 {:.2}", report.kc);
            println!("  ETc:                {:.2} mm/day", report.etc_mm_day);
            println!("  Current depletion:  {:.2} mm", report.current_depletion_mm);
            println!("  Refill threshold:   {:.2} mm", report.refill_threshold_mm);
            println!(
                "  Irrigation amount:  {:.2} mm ({:.2} L/m2, {:.2} L/acre)",
                report.irrigation_amount_mm,
                report.irrigation_liters_per_m2,
                report.irrigation_liters_per_acre,
            );
            println!(
                "  Needs irrigation:   {}",
                if needs_irrigation(moisture, &crop) {
                    "yes"
                } else {
                    "no"
                }
            );
        }
        Commands::Check => {
            println!("Config OK");
            println!("  Database: {}", db.path().display());
            println!(
                "  Sweep interval: {} minutes",
                config.scheduler.sweep_interval_minutes
            );
            match &config.openweathermap {
                Some(owm) if owm.enabled => {
                    let client = OpenWeatherMapClient::new(
                        owm.clone(),
                        config.scheduler.forecast_window_hours,
                    );
                    match client
                        .test_connection(&config.scheduler.default_location)
                        .await
                    {
                        Ok(true) => println!("  OpenWeatherMap: OK"),
                        Ok(false) => println!("  OpenWeatherMap: FAILED (bad response)"),
                        Err(e) => println!("  OpenWeatherMap: FAILED ({})", e),
                    }
                }
                _ => println!("  OpenWeatherMap: not configured (static dry forecast)"),
            }
        }
    }

    Ok(())
}

fn build_dispatcher(config: &Config, db: Database) -> Dispatcher {
    let forecast: Arc<dyn ForecastProvider> = match &config.openweathermap {
        Some(owm) if owm.enabled && !owm.api_key.is_empty() => Arc::new(
            OpenWeatherMapClient::new(owm.clone(), config.scheduler.forecast_window_hours),
        ),
        _ => {
            tracing::warn!("OpenWeatherMap not configured - using static dry forecast");
            Arc::new(StaticForecast)
        }
    };

    let engine = DecisionEngine::new(
        db.clone(),
        forecast,
        Arc::new(LogNotifier),
        Arc::new(SimulatedActuator),
        config.engine_settings(),
    );
    Dispatcher::new(db, engine)
}
