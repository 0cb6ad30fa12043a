use tokio::signal;

/// Resolves once the process receives Ctrl+C or, on unix, SIGTERM.
pub async fn signal() {
	let ctrl_c = async {
		if let Err(error) = signal::ctrl_c().await {
			tracing::error!("Failed to listen for Ctrl+C: {error}");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			},
			Err(error) => {
				tracing::error!("Failed to listen for SIGTERM: {error}");
				std::future::pending::<()>().await;
			},
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}

	tracing::info!("Received shutdown signal, stopping server...");
}
