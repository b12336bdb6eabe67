use apistate_core::{Config, Store};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Install the stderr log subscriber. `RUST_LOG` overrides the `warn` default.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn load_config_or_exit(path: &str) -> Config {
    let path = Path::new(path);
    if !path.exists() {
        eprintln!("error: config file not found: {}", path.display());
        std::process::exit(1);
    }
    let config = Config::load(path).unwrap_or_else(|e| {
        eprintln!("error: failed to load {}: {e}", path.display());
        std::process::exit(1);
    });
    tracing::debug!(
        path = %path.display(),
        storage = config.storage.len(),
        transformations = config.transformations.len(),
        "loaded config"
    );
    config
}

/// Read JSON from `path`, or from stdin when `path` is `-`.
pub fn read_json_or_exit(path: &str) -> Value {
    let text = if path == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .unwrap_or_else(|e| {
                eprintln!("error: failed to read stdin: {e}");
                std::process::exit(1);
            });
        buffer
    } else {
        fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("error: failed to read {path}: {e}");
            std::process::exit(1);
        })
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("error: failed to parse {path}: {e}");
        std::process::exit(1);
    })
}

pub fn load_store_or_exit(path: &str) -> Store {
    Store::from_value(read_json_or_exit(path)).unwrap_or_else(|e| {
        eprintln!("error: invalid store {path}: {e}");
        std::process::exit(1);
    })
}

pub fn print_json<T: Serialize>(value: &T) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("error: failed to render output: {e}");
        std::process::exit(1);
    });
    println!("{rendered}");
}
