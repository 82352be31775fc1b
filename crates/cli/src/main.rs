//! `shelf` - command line interface for novelshelf

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use shelf_db::{Novel, NovelId, NovelStore};
use shelf_kernel::settings::{Settings, StorageBackend};

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Manage and serve the novel catalogue", long_about = None)]
struct Cli {
    /// Storage backend, overriding configuration
    #[arg(long, global = true, value_parser = parse_backend)]
    backend: Option<StorageBackend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve,
    /// Work with stored novels
    #[command(subcommand)]
    Novels(NovelCommands),
}

#[derive(Subcommand)]
enum NovelCommands {
    /// List novels ordered by title
    List {
        /// Only novels created by this user id
        #[arg(long)]
        owner: Option<String>,
    },
    /// Print one novel as JSON
    Show { id: String },
    /// Add a novel and print its id
    Add(AddArgs),
    /// Delete a novel
    Delete { id: String },
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    author: String,
    #[arg(long, default_value = "")]
    published_date: String,
    #[arg(long, default_value = "")]
    image_url: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    created_by: String,
    /// Creator id; anonymous when omitted
    #[arg(long, default_value = "")]
    created_by_id: String,
}

impl AddArgs {
    fn into_novel(self) -> Novel {
        let mut novel = Novel {
            title: self.title,
            author: self.author,
            published_date: self.published_date,
            image_url: self.image_url,
            description: self.description,
            created_by: self.created_by,
            created_by_id: self.created_by_id,
            ..Novel::default()
        };
        if novel.created_by_id.is_empty() {
            novel.set_creator_anonymous();
        }
        novel
    }
}

fn parse_backend(value: &str) -> Result<StorageBackend, String> {
    match value {
        "memory" => Ok(StorageBackend::Memory),
        "mysql" => Ok(StorageBackend::Mysql),
        "document" => Ok(StorageBackend::Document),
        other => Err(format!(
            "unknown backend '{other}'; expected memory/mysql/document"
        )),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().context("failed to load novelshelf settings")?;
    if let Some(backend) = cli.backend {
        settings.storage.backend = backend;
    }
    shelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Commands::Serve => novelshelf::serve(settings).await,
        Commands::Novels(command) => {
            let store = shelf_db::connect(&settings.storage)
                .await
                .context("failed to connect novel store")?;
            let result = run_novel_command(store.as_ref(), command).await;
            store.close().await.context("failed to close novel store")?;
            result
        }
    }
}

async fn run_novel_command(store: &dyn NovelStore, command: NovelCommands) -> anyhow::Result<()> {
    match command {
        NovelCommands::List { owner } => {
            let novels = match owner {
                Some(owner) => store.list_created_by(&owner).await?,
                None => store.list().await?,
            };
            print_json(&novels)
        }
        NovelCommands::Show { id } => {
            let novel = store
                .get(&NovelId::from(id.as_str()))
                .await
                .with_context(|| format!("failed to load novel {id}"))?;
            print_json(&novel)
        }
        NovelCommands::Add(args) => {
            let mut novel = args.into_novel();
            let id = store.add(&mut novel).await?;
            tracing::info!(%id, backend = store.backend(), "novel added");
            println!("{id}");
            Ok(())
        }
        NovelCommands::Delete { id } => {
            store
                .delete(&NovelId::from(id.as_str()))
                .await
                .with_context(|| format!("failed to delete novel {id}"))?;
            tracing::info!(%id, "novel deleted");
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{json}");
    Ok(())
}
