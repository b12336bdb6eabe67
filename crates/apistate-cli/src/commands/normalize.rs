use crate::support::{load_config_or_exit, print_json, read_json_or_exit};
use serde_json::Value;

pub fn run(input: String, config: String, picks: Vec<String>) {
    let config = load_config_or_exit(&config);
    let payload = read_json_or_exit(&input);
    let normalizer = config.normalizer();

    let pick_refs: Vec<&str> = picks.iter().map(String::as_str).collect();
    let picks = (!pick_refs.is_empty()).then_some(pick_refs.as_slice());

    match &payload {
        Value::Array(items) => {
            let normalized = normalizer
                .normalize_collection(items, picks)
                .unwrap_or_else(|e| {
                    eprintln!("error: failed to normalize {input}: {e}");
                    std::process::exit(1);
                });
            print_json(&normalized);
        }
        item => {
            let normalized = normalizer.normalize_item(item, picks).unwrap_or_else(|e| {
                eprintln!("error: failed to normalize {input}: {e}");
                std::process::exit(1);
            });
            print_json(&normalized);
        }
    }
}
