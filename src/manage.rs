use clap::{Parser, Subcommand};
use postgres::{Client, NoTls};

#[derive(Parser)]
#[clap(version = "0.1")]
struct Opts {
    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Subcommand)]
enum SubCommand {
    /// Apply schema.sql to the database.
    Init { database_url: Option<String> },
}

fn main() -> Result<(), anyhow::Error> {
    dotenv::dotenv().ok();
    let opts: Opts = Opts::parse();

    match opts.subcmd {
        SubCommand::Init { database_url } => {
            println!("initializing database");

            let database_url = database_url
                .or_else(|| std::env::var("DATABASE_URL").ok())
                .expect("no database url");

            let mut client = Client::connect(&database_url, NoTls)?;
            client.batch_execute(include_str!("../schema.sql"))?;
        }
    }
    Ok(())
}
