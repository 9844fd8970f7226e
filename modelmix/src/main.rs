use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use modelmix::{MixConfig, ModelMix, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new("modelmix=info")),
		)
		.init();

	let mix = ModelMix::new(MixConfig::from_env());

	let addr: SocketAddr = std::env::var("MODELMIX_ADDR")
		.unwrap_or_else(|_| "127.0.0.1:8080".into())
		.parse()?;

	let listener = TcpListener::bind(addr).await?;
	info!("listening on {addr}");

	axum::serve(listener, server::app(mix))
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}

async fn shutdown_signal() {
	let _ = tokio::signal::ctrl_c().await;
}
