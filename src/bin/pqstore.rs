//! pqstore inspection tool
//!
//! Reports on, dumps, or clears a persistent code store.

use clap::{Parser, Subcommand};
use pqstore::{CodeStorage, PersistentOptions, PersistentStorage};
use tracing_subscriber::{fmt, EnvFilter};

/// pqstore CLI
#[derive(Parser, Debug)]
#[command(name = "pqstore")]
#[command(about = "Inspect a persistent quantization code store")]
#[command(version)]
struct Args {
    /// Store directory
    #[arg(short, long, default_value = "./pqstore_data")]
    path: String,

    /// Sequence key width the store was created with
    #[arg(short, long, default_value = "8")]
    key_digits: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print item and batch counters
    Stats,

    /// Print one line per stored batch
    Dump {
        /// Stop after this many batches
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Remove every stored batch
    Clear,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,pqstore=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let options = PersistentOptions::new(&args.path).key_digits(args.key_digits);
    let mut storage = match PersistentStorage::open(options) {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!("Failed to open store at {}: {}", args.path, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&mut storage, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    storage.close();
}

fn run(storage: &mut PersistentStorage, command: Commands) -> pqstore::Result<()> {
    match command {
        Commands::Stats => {
            println!("path:        {}", storage.path().display());
            println!("num_items:   {}", storage.num_items());
            println!("num_batches: {}", storage.num_batches());
            if let Some(emptys) = storage.num_emptys() {
                println!("num_emptys:  {}", emptys);
            }
        }
        Commands::Dump { limit } => {
            let limit = limit.unwrap_or(usize::MAX);
            for (index, batch) in storage.iter()?.take(limit).enumerate() {
                let batch = batch?;
                println!(
                    "{:>8}  rows={} cols={} element={:?}",
                    index,
                    batch.codes.rows(),
                    batch.codes.cols(),
                    batch.codes.element_type()
                );
            }
        }
        Commands::Clear => {
            storage.clear()?;
            println!("cleared {}", storage.path().display());
        }
    }
    Ok(())
}
