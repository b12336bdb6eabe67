use crate::support::{load_config_or_exit, load_store_or_exit, print_json};
use apistate_core::{
    IdCollection, META_KEY, RenderError, RenderOptions, SharedNodes, StatusMarker,
    create_schemas_map, denormalize_collection, denormalize_item,
};
use serde_json::{Value, json};

pub struct Args {
    pub resource_type: String,
    pub ids: Vec<String>,
    pub store: String,
    pub config: String,
    pub collection: bool,
    pub meta: Option<String>,
    pub references: bool,
    pub max_objects: usize,
}

impl Args {
    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            shared: if self.references {
                SharedNodes::Reference
            } else {
                SharedNodes::Expand
            },
            max_objects: (self.max_objects > 0).then_some(self.max_objects),
        }
    }
}

fn rendered_or_exit(rendered: Result<Value, RenderError>) -> Value {
    rendered.unwrap_or_else(|e| {
        eprintln!("error: failed to render resources: {e}");
        std::process::exit(1);
    })
}

pub fn run(args: Args) {
    let config = load_config_or_exit(&args.config);
    let options = args.render_options();
    let store = load_store_or_exit(&args.store);

    let schemas = create_schemas_map(&store, &config.storage).unwrap_or_else(|e| {
        eprintln!("error: invalid storage map in {}: {e}", args.config);
        std::process::exit(1);
    });

    if !args.collection && args.meta.is_none() && args.ids.len() == 1 {
        let item = denormalize_item(&args.ids[0], &args.resource_type, &schemas);
        if item.root().is_none() {
            tracing::warn!(
                resource_type = %args.resource_type,
                id = %args.ids[0],
                "resource not found in store"
            );
        }
        print_json(&rendered_or_exit(item.render(&options)));
        return;
    }

    let meta = args.meta.as_deref().map(|raw| {
        serde_json::from_str::<Value>(raw)
            .map(StatusMarker::new)
            .unwrap_or_else(|e| {
                eprintln!("error: invalid --meta JSON: {e}");
                std::process::exit(1);
            })
    });
    let ids = IdCollection::new(args.ids, meta);
    let collection = denormalize_collection(&ids, &args.resource_type, &schemas);

    let missing = collection.items().iter().filter(|item| item.is_none()).count();
    if missing > 0 {
        tracing::warn!(resource_type = %args.resource_type, missing, "resources not found in store");
    }

    let mut document = json!({ "data": rendered_or_exit(collection.render(&options)) });
    if let Some(status) = collection.status() {
        document[META_KEY] = status.snapshot();
    }
    print_json(&document);
}
