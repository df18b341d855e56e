use clap::Parser;
use std::time::Duration;

/// Command-line flags. Every flag has a matching environment variable that
/// takes precedence over it when set -- see [`AppConfig::load`].
#[derive(Parser, Debug)]
#[command(name = "gophermart", about = "Loyalty points accrual and balance service")]
struct Flags {
    #[arg(short = 'a', long, default_value = "127.0.0.1:8080")]
    run_address: String,

    #[arg(short = 'd', long, default_value = "")]
    database_uri: String,

    #[arg(short = 'r', long, default_value = "")]
    accrual_system_address: String,

    #[arg(short = 'k', long, default_value = "")]
    jwt_secret_key: String,

    #[arg(short = 'b', long = "batch-max-size", default_value_t = 100)]
    process_accruals_batch_max_size: usize,

    #[arg(short = 's', long = "buffer-size", default_value_t = 256)]
    process_accruals_buffer_size: usize,

    #[arg(short = 'w', long = "worker-pool-size", default_value_t = 4)]
    process_accruals_worker_pool_size: usize,

    #[arg(short = 'i', long = "poll-interval-seconds", default_value_t = 5)]
    get_new_accruals_interval: u64,
}

/// Resolved runtime configuration. Built by layering environment variables
/// over CLI flag defaults -- env wins when both are present, matching the
/// precedence the original gophermart service used.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub run_address: String,
    pub database_uri: String,
    pub accrual_system_address: String,
    pub jwt_secret_key: String,
    pub process_accruals_batch_max_size: usize,
    pub process_accruals_buffer_size: usize,
    pub process_accruals_worker_pool_size: usize,
    pub get_new_accruals_interval: Duration,
}

impl AppConfig {
    pub fn load() -> Self {
        let flags = Flags::parse();

        let run_address = env_override("RUN_ADDRESS", flags.run_address);
        let database_uri = env_override("DATABASE_URI", flags.database_uri);
        let accrual_system_address =
            env_override("ACCRUAL_SYSTEM_ADDRESS", flags.accrual_system_address);
        let jwt_secret_key = env_override("JWT_SECRET_KEY", flags.jwt_secret_key);

        let process_accruals_batch_max_size = env_override_parsed(
            "PROCESS_ACCRUALS_BATCH_MAX_SIZE",
            flags.process_accruals_batch_max_size,
        );
        let process_accruals_buffer_size = env_override_parsed(
            "PROCESS_ACCRUALS_BUFFER_SIZE",
            flags.process_accruals_buffer_size,
        );
        let process_accruals_worker_pool_size = env_override_parsed(
            "PROCESS_ACCRUALS_WORKER_POOL_SIZE",
            flags.process_accruals_worker_pool_size,
        );
        let get_new_accruals_interval_secs = env_override_parsed(
            "GET_NEW_ACCRUALS_INTERVAL",
            flags.get_new_accruals_interval,
        );

        Self {
            run_address,
            database_uri,
            accrual_system_address,
            jwt_secret_key,
            process_accruals_batch_max_size,
            process_accruals_buffer_size,
            process_accruals_worker_pool_size,
            get_new_accruals_interval: Duration::from_secs(get_new_accruals_interval_secs),
        }
    }
}

fn env_override(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_override_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
