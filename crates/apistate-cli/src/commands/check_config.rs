use crate::support::{load_config_or_exit, load_store_or_exit, print_json};
use apistate_core::{Config, create_schemas_map};
use serde_json::json;

const CHECK_KIND: &str = "apistate.config_check.v1";

fn resolve_against_store(config: &Config, store_path: &str) -> Result<usize, String> {
    let store = load_store_or_exit(store_path);
    create_schemas_map(&store, &config.storage)
        .map(|schemas| {
            schemas
                .types()
                .filter_map(|resource_type| schemas.collection(resource_type))
                .map(|collection| collection.len())
                .sum()
        })
        .map_err(|e| e.to_string())
}

pub fn run(config_path: String, store: Option<String>, json_output: bool) {
    let config = load_config_or_exit(&config_path);

    let storage: Vec<(String, String)> = config
        .storage
        .iter()
        .map(|(resource_type, path)| (resource_type.to_string(), path.to_string()))
        .collect();
    let unmapped: Vec<&str> = config
        .transformations
        .types()
        .filter(|resource_type| config.storage.path(resource_type).is_none())
        .collect();
    let resolution = store
        .as_deref()
        .map(|store_path| resolve_against_store(&config, store_path));
    let accepted = !matches!(resolution, Some(Err(_)));

    if json_output {
        let mut payload = json!({
            "checkKind": CHECK_KIND,
            "result": if accepted { "accepted" } else { "rejected" },
            "config": config_path,
            "storage": storage
                .iter()
                .map(|(resource_type, path)| json!({ "type": resource_type, "path": path }))
                .collect::<Vec<_>>(),
            "transformations": config.transformations.types().collect::<Vec<_>>(),
            "unknownTypePolicy": config.normalize.unknown_type,
            "unmappedTypes": unmapped,
        });
        match &resolution {
            Some(Ok(items)) => payload["storeItems"] = json!(items),
            Some(Err(message)) => payload["error"] = json!(message),
            None => {}
        }
        print_json(&payload);
    } else {
        println!(
            "[config] {} (storage={}, transformations={})",
            if accepted { "OK" } else { "FAIL" },
            storage.len(),
            config.transformations.len()
        );
        for (resource_type, path) in &storage {
            println!("  - {resource_type} -> {path}");
        }
        for resource_type in &unmapped {
            println!("  - WARN {resource_type} has a transformation but no storage path");
        }
        match &resolution {
            Some(Ok(items)) => println!("  store: {items} items reachable"),
            Some(Err(message)) => println!("  store: {message}"),
            None => {}
        }
    }

    if !accepted {
        std::process::exit(1);
    }
}
