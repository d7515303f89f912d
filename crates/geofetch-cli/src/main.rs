use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = cli::App::parse();
    app.init_tracing();
    app.run().await
}
