use caballus_fares::config::Config;
use caballus_fares::engine::Engine;
use caballus_fares::error::Error;
use caballus_fares::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    tracing::info!(?config, "configuration loaded");

    let engine = Engine::new(&config)?;

    serve(engine, config.bind_address).await;

    Ok(())
}
