use clap::{Parser, Subcommand};

/// Full expansion of shared resources grows exponentially with linkage depth.
pub const DEFAULT_MAX_OBJECTS: usize = 100_000;

#[derive(Parser)]
#[command(
    name = "apistate",
    about = "apistate: normalize API payloads and denormalize stored resource graphs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize one raw item (JSON object) or a collection (JSON array)
    Normalize {
        /// Path to the raw item or collection JSON (`-` for stdin)
        input: String,

        /// Path to configuration TOML
        #[arg(long, default_value = apistate_core::DEFAULT_CONFIG_PATH)]
        config: String,

        /// Restrict normalization to these properties (repeatable)
        #[arg(long = "pick")]
        picks: Vec<String>,
    },

    /// Denormalize stored resources into a nested JSON tree
    Denormalize {
        /// Resource type
        #[arg(long = "type")]
        resource_type: String,

        /// Resource ids, in output order
        #[arg(required = true)]
        ids: Vec<String>,

        /// Path to the store JSON
        #[arg(long)]
        store: String,

        /// Path to configuration TOML
        #[arg(long, default_value = apistate_core::DEFAULT_CONFIG_PATH)]
        config: String,

        /// Emit an array even for a single id
        #[arg(long)]
        collection: bool,

        /// Collection status marker as inline JSON
        #[arg(long)]
        meta: Option<String>,

        /// Render repeated resources as `{id, type}` references
        #[arg(long)]
        references: bool,

        /// Fail when the output would contain more resource objects (0 = unbounded)
        #[arg(long, default_value_t = DEFAULT_MAX_OBJECTS)]
        max_objects: usize,
    },

    /// Validate configuration, optionally resolving storage paths against a store
    CheckConfig {
        /// Path to configuration TOML
        #[arg(long, default_value = apistate_core::DEFAULT_CONFIG_PATH)]
        config: String,

        /// Path to a store JSON to resolve the storage map against
        #[arg(long)]
        store: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
