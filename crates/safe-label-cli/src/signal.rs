use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

/// Set the returned flag when Ctrl-C arrives.
///
/// The wait runs on a helper thread with its own single-threaded runtime so the
/// monitor loop itself stays synchronous.
pub fn cancel_on_ctrl_c() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);

    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to start signal runtime: {}", e);
                return;
            }
        };

        match runtime.block_on(tokio::signal::ctrl_c()) {
            Ok(()) => {
                debug!("Ctrl-C received");
                flag.store(true, Ordering::Relaxed);
            }
            Err(e) => error!("Failed to install Ctrl-C handler: {}", e),
        }
    });

    cancel
}
