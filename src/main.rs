#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let config = tasker_server::config::Config::from_env()?;
    tasker_server::web::start_web_server(config).await
}
