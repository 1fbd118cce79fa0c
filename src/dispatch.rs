//! Connection dispatcher: an accept loop feeds a bounded queue, a fixed pool runs the handler.
//!
//! What the handler does with a connection (HTTP or otherwise) is up to the caller.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::io;
use std::net::{TcpListener, TcpStream};

use crate::pipeline::{Feeder, Pipeline, RunSummary};
use crate::utils::config::DispatchDefaults;

/// Dispatcher tuning.
#[derive(Clone, Debug)]
pub struct DispatchOpts {
    pub workers: usize,
    /// Accepted connections allowed to wait for a worker before `accept` stops being called.
    pub capacity: usize,
    /// Stop accepting after this many connections. `None` keeps accepting until the
    /// listener fails repeatedly (see [`DispatchDefaults::MAX_CONSECUTIVE_ACCEPT_ERRORS`]).
    pub max_connections: Option<usize>,
    /// Abort everything on the first handler error instead of logging it.
    pub strict: bool,
}

impl Default for DispatchOpts {
    fn default() -> Self {
        Self {
            workers: DispatchDefaults::WORKERS,
            capacity: DispatchDefaults::QUEUE_CAPACITY,
            max_connections: None,
            strict: false,
        }
    }
}

/// Accept connections on `listener` and hand each one to `handler` on a worker thread.
/// Isolated accept errors are logged and skipped; a long unbroken run of them is fatal.
/// Returns once `max_connections` have been accepted and handled; the summary total is the
/// number handled without error.
pub fn serve<H>(listener: TcpListener, opts: &DispatchOpts, handler: H) -> Result<RunSummary<u64>>
where
    H: Fn(TcpStream) -> Result<()> + Send + Sync + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        debug!("dispatching connections from {}", addr);
    }
    let limit = opts.max_connections;
    let pipeline = Pipeline::new(opts.capacity, opts.workers, move |stream: TcpStream| {
        handler(stream)?;
        Ok(1_u64)
    })?
    .strict(opts.strict);

    pipeline.run_to_completion(move |feeder| accept_loop(feeder, listener.incoming(), limit))
}

/// Push accepted connections until `limit` is reached. Errors between successes are logged;
/// `MAX_CONSECUTIVE_ACCEPT_ERRORS` of them in a row end the loop with the last one.
fn accept_loop<S, I>(feeder: &mut Feeder<S>, incoming: I, limit: Option<usize>) -> Result<()>
where
    I: IntoIterator<Item = io::Result<S>>,
{
    if limit == Some(0) {
        return Ok(());
    }
    let mut accepted = 0_usize;
    let mut consecutive_errors = 0_usize;
    for conn in incoming {
        match conn {
            Ok(stream) => {
                consecutive_errors = 0;
                accepted += 1;
                if feeder.push(stream).is_err() {
                    debug!("queue closed; accept loop stopping");
                    anyhow::bail!("connection queue closed while accepting");
                }
            }
            Err(e) => {
                consecutive_errors += 1;
                if consecutive_errors >= DispatchDefaults::MAX_CONSECUTIVE_ACCEPT_ERRORS {
                    return Err(e).with_context(|| {
                        format!("accept failed {consecutive_errors} times in a row")
                    });
                }
                warn!("accept: {}", e);
            }
        }
        if limit.is_some_and(|max| accepted >= max) {
            break;
        }
    }
    Ok(())
}
