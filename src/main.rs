use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    snapask_lib::run(snapask_lib::cli::Cli::parse()).await
}
