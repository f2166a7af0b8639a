//! blockkv CLI Client
//!
//! Command-line interface for talking to a blockkv node directly, standing
//! in for the consensus engine when testing by hand.

use blockkv::network::Client;
use blockkv::Result;
use clap::{Parser, Subcommand};

/// blockkv CLI
#[derive(Parser, Debug)]
#[command(name = "blockkv-cli")]
#[command(about = "CLI for a blockkv node")]
struct Args {
    /// Node address
    #[arg(short, long, default_value = "127.0.0.1:26658")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Round-trip a message through the node
    Echo {
        message: String,
    },

    /// Show the node's handshake info
    Info,

    /// Ask whether a transaction would be admitted
    CheckTx {
        /// Transaction, e.g. name=satoshi
        tx: String,
    },

    /// Read a committed key
    Query {
        key: String,
    },

    /// Execute and commit one block made of the given transactions
    Block {
        /// Block height to report
        #[arg(long, default_value = "1")]
        height: u64,

        /// Transactions, e.g. a=1 b=2
        txs: Vec<String>,
    },
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Echo { message } => {
            println!("{}", client.echo(&message)?);
        }
        Commands::Info => {
            let info = client.info()?;
            println!(
                "version={:?} app_version={} last_block_height={}",
                info.version, info.app_version, info.last_block_height
            );
        }
        Commands::CheckTx { tx } => {
            let res = client.check_tx(tx.as_bytes())?;
            println!("code={} {}", res.code, res.log);
        }
        Commands::Query { key } => {
            let res = client.query(key.as_bytes())?;
            match res.value {
                Some(value) => println!("{} ({})", String::from_utf8_lossy(&value), res.log),
                None => println!("({})", res.log),
            }
        }
        Commands::Block { height, txs } => {
            client.begin_block(height)?;
            for tx in &txs {
                let res = client.deliver_tx(tx.as_bytes())?;
                println!("{:<24} code={} {}", tx, res.code, res.log);
            }
            client.end_block(height)?;
            client.commit()?;
            println!("committed block {}", height);
        }
    }

    Ok(())
}
