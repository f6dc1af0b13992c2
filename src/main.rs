use clap::Parser;
use xpguard::adapter::inbound::cli::command::Cli;
use xpguard::adapter::inbound::cli::run;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let code = run(cli).await;
    std::process::exit(code);
}
