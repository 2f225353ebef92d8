use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Install a shutdown handler that listens for SIGTERM and SIGINT.
///
/// Returns a `CancellationToken` that is cancelled when either signal is
/// received. The control API drains on it and the node then stops its
/// keep-alive task. If a signal stream cannot be installed the other one is
/// still honoured.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| tracing::warn!(error = %e, "Failed to install SIGTERM handler"))
            .ok();
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| tracing::warn!(error = %e, "Failed to install SIGINT handler"))
            .ok();

        let wait_term = async {
            match sigterm {
                Some(mut s) => {
                    s.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        let wait_int = async {
            match sigint {
                Some(mut s) => {
                    s.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = wait_term => {
                tracing::info!("Received SIGTERM, shutting down verifier");
            }
            _ = wait_int => {
                tracing::info!("Received SIGINT, shutting down verifier");
            }
        }

        token_clone.cancel();
    });

    token
}
