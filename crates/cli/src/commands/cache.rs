use crate::context::Context;
use clap::Subcommand;
use forcebridge_cache::Storage;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show the recorded timestamp for one file
    Get {
        /// Metadata type, e.g. `ApexClass`
        metadata_type: String,
        /// Full name, e.g. `Foo` or `Foo-meta.xml`
        full_name: String,
    },
    /// List every stored key
    Keys,
}

impl CacheCommands {
    pub fn execute(self, context: &Context) -> eyre::Result<()> {
        match self {
            CacheCommands::Get {
                metadata_type,
                full_name,
            } => {
                let cache = context.orchestrator.cache();
                match cache.get(&metadata_type, &full_name)? {
                    Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
                    None => println!("no entry for {metadata_type} {full_name}"),
                }
                Ok(())
            }
            CacheCommands::Keys => {
                for key in context.storage.keys()? {
                    println!("{key}");
                }
                Ok(())
            }
        }
    }
}
