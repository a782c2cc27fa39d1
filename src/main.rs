use std::env;
use std::process::ExitCode;

use dotenvy::dotenv;
use order_admission::domain::clock::parse_business_date;
use order_admission::{connect, AreaAvailabilityChecker, BusinessClock, Config};

const USAGE: &str = "usage: order-admission <area_id> [YYYY-MM-DD]";

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(area_id) = args.first().and_then(|a| a.parse::<i64>().ok()) else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return ExitCode::from(2);
        }
    };
    let clock = config.clock();
    let date = match args.get(1) {
        Some(raw) => match parse_business_date(raw) {
            Some(date) => date,
            None => {
                eprintln!("{}", USAGE);
                return ExitCode::from(2);
            }
        },
        None => clock.today(),
    };

    let gateway = match connect(&config) {
        Ok(gateway) => gateway,
        Err(e) => {
            log::error!("Could not build HTTP client: {}", e);
            return ExitCode::from(2);
        }
    };

    log::info!("Checking area {} on {} against {}", area_id, date, config.api_url);
    let checker = AreaAvailabilityChecker::new(gateway, config.check_timeout);
    match checker.check(area_id, date).await {
        Ok(result) if result.exists => {
            println!(
                "area {} on {}: blocked (order {})",
                area_id,
                date,
                result
                    .order_id
                    .map_or_else(|| "unknown".to_string(), |id| id.to_string())
            );
            ExitCode::from(1)
        }
        Ok(_) => {
            println!("area {} on {}: available", area_id, date);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(2)
        }
    }
}
