use flare_project_chat::ApplicationBootstrap;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("FLARE_CONFIG_PATH").ok();
    ApplicationBootstrap::run(config_path.as_deref()).await
}
