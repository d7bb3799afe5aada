use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

use crate::domain::periods::ClassPeriod;

const DEFAULT_PORT: &str = "8000";
const DEFAULT_DATABASE_URL: &str = "sqlite:attendance.db";
const DEFAULT_STATIC_ROOT: &str = "backend/static";

/// QR image edge length in pixels.
const QR_SIZE: u32 = 300;

pub struct Config {
    pub port: u16,
    /// Base URL students reach the server at; embedded in the QR payload.
    pub public_url: String,
    pub database_url: String,
    pub static_root: PathBuf,
    pub qr_size: u32,
    pub class_periods: Vec<ClassPeriod>,
}

impl Config {
    pub fn load() -> Self {
        let port: u16 = try_load("ATTENDANCE_PORT", DEFAULT_PORT);
        let public_url = try_load(
            "ATTENDANCE_PUBLIC_URL",
            &format!("http://localhost:{}", port),
        );
        Self {
            port,
            public_url,
            database_url: try_load("ATTENDANCE_DATABASE_URL", DEFAULT_DATABASE_URL),
            static_root: PathBuf::from(try_load::<String>(
                "ATTENDANCE_STATIC_ROOT",
                DEFAULT_STATIC_ROOT,
            )),
            qr_size: QR_SIZE,
            class_periods: default_periods(),
        }
    }
}

/// The four fixed class-time windows, in resolution order.
pub fn default_periods() -> Vec<ClassPeriod> {
    vec![
        ClassPeriod::new(1, "08:00", "09:15"),
        ClassPeriod::new(2, "09:16", "11:00"),
        ClassPeriod::new(3, "11:45", "13:05"),
        ClassPeriod::new(4, "13:06", "14:45"),
    ]
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
