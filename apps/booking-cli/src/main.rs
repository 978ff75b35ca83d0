use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use availability_cell::{BookingWindow, HttpSlotSource, SlotResolution, SlotResolver};
use shared_config::AppConfig;
use shared_models::{HospitalId, VeterinarianId};

const USAGE: &str = "usage: booking-cli <hospital-id> <YYYY-MM-DD> [veterinarian-id]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (hospital_id, date, veterinarian_id) = match args.as_slice() {
        [hospital, date] => (hospital, date, None),
        [hospital, date, vet] => (hospital, date, Some(VeterinarianId::from(vet.as_str()))),
        _ => bail!(USAGE),
    };
    let hospital_id = HospitalId::from(hospital_id.as_str());
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", date))?;

    let config = AppConfig::from_env();
    if !config.is_configured() {
        warn!("PET_API_BASE_URL is not set; only fallback slots can be shown");
    }

    let window = BookingWindow::starting_today(config.booking_window_days);
    let resolver = SlotResolver::new(Arc::new(HttpSlotSource::new(&config)), window);

    info!("Resolving slots for hospital {} on {}", hospital_id, date);
    let resolution = resolver
        .resolve(&hospital_id, date, veterinarian_id.as_ref())
        .await
        .context("slot resolution failed")?;

    if let SlotResolution::Degraded { cause, .. } = &resolution {
        println!("! showing the default schedule: {}", cause);
    }

    if resolution.is_empty() {
        println!("no slots");
        return Ok(());
    }

    for slot in resolution.slots() {
        let status = if slot.is_bookable() { "open" } else { "taken" };
        match &slot.veterinarian_name {
            Some(name) => println!("{}  {:<5}  {}", slot.time.format("%H:%M"), status, name),
            None => println!("{}  {}", slot.time.format("%H:%M"), status),
        }
    }

    Ok(())
}
