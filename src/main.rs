/// Reelgate - admin service for a short-video platform
use reelgate::{config::ServerConfig, context::AppContext, server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    let config = ServerConfig::from_env()?;
    let ctx = AppContext::new(config).await?;

    server::serve(ctx).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ____            __            __
   / __ \___  ___  / /___ _____ _/ /____
  / /_/ / _ \/ _ \/ / __ `/ __ `/ __/ _ \
 / _, _/  __/  __/ / /_/ / /_/ / /_/  __/
/_/ |_|\___/\___/_/\__, /\__,_/\__/\___/
                  /____/
        Admin service v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
