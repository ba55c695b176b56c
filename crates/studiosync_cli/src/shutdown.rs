use console::Term;
use tokio::sync::watch;

/// Set up the Ctrl+C handler for graceful shutdown.
///
/// The returned receiver flips to `true` on the first Ctrl+C; the watch
/// command's poll loop finishes its current pass and exits. A second
/// Ctrl+C force-quits.
pub(crate) fn setup_shutdown_handler() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::error!("failed to install Ctrl+C handler");
            return;
        }

        let is_tty = Term::stdout().is_term();
        if is_tty {
            eprintln!("\n\nShutdown requested, finishing current operations...");
            eprintln!("Press Ctrl+C again to force quit.");
        } else {
            tracing::warn!("Shutdown requested, finishing current operations");
        }

        let _ = tx.send(true);

        // Second Ctrl+C force quits
        if tokio::signal::ctrl_c().await.is_ok() {
            if is_tty {
                eprintln!("Force quit!");
            }
            std::process::exit(130);
        }
    });

    rx
}
