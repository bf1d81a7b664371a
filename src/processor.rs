//! Worker loop and engine entry points
//!
//! One long-lived consumer drains the event queue and drives the session;
//! the heartbeat pacer runs beside it and only ever enqueues. [`run`] wires
//! both onto the crate's static queue, [`run_with`] takes explicit
//! instances for tests or multi-engine setups.
//!
//! # Usage
//!
//! ```rust,no_run
//! use trillbird::{SourceConfig, processor};
//!
//! # async fn example<S, A>(stack: S, audio: A)
//! # where
//! #     S: trillbird::stack::DiscoveryControl
//! #         + trillbird::stack::MediaTransport
//! #         + trillbird::stack::PairingControl,
//! #     A: trillbird::audio::AudioSource,
//! # {
//! let config = SourceConfig::new("Speaker").unwrap();
//! // Spawn this from your executor; stack callbacks feed events back
//! // through `dispatch()` and `shutdown()` ends the loop.
//! processor::run(config, stack, audio).await;
//! # }
//! ```

use embassy_futures::select::{Either, select};

use crate::audio::AudioSource;
use crate::event::{AppEvent, EventQueue};
use crate::heartbeat::{PacerControl, pacer_task};
use crate::session::SourceSession;
use crate::stack::{DiscoveryControl, MediaTransport, PairingControl};
use crate::{EVENT_QUEUE, HEARTBEAT_PACER, SourceConfig};

/// Drain the queue until a shutdown envelope arrives
///
/// Events are handled strictly in FIFO arrival order; everything enqueued
/// before the shutdown is still processed.
pub async fn worker_loop<S, A>(session: &mut SourceSession<'_, S, A>)
where
    S: DiscoveryControl + MediaTransport + PairingControl,
    A: AudioSource,
{
    loop {
        let event = session.queue().receive().await;
        if event == AppEvent::Shutdown {
            defmt::info!("[WORKER] shutdown, draining complete");
            break;
        }
        session.handle_event(event).await;
    }
}

/// Run the engine on explicit queue and pacer instances
///
/// Returns once a [`AppEvent::Shutdown`] envelope has been processed.
pub async fn run_with<S, A>(
    queue: &EventQueue,
    pacer: &PacerControl,
    config: SourceConfig,
    stack: S,
    audio: A,
) where
    S: DiscoveryControl + MediaTransport + PairingControl,
    A: AudioSource,
{
    let mut session = SourceSession::new(config, stack, audio, queue, pacer);
    if session.start().await.is_err() {
        defmt::error!("[WORKER] discovery could not be started");
    }

    match select(worker_loop(&mut session), pacer_task(queue, pacer)).await {
        Either::First(()) => pacer.stop(),
        Either::Second(never) => match never {},
    }
}

/// Run the engine on the crate's static queue and pacer
///
/// Producer adapters reach this instance through [`crate::dispatch`] and
/// [`crate::shutdown`].
pub async fn run<S, A>(config: SourceConfig, stack: S, audio: A)
where
    S: DiscoveryControl + MediaTransport + PairingControl,
    A: AudioSource,
{
    run_with(&EVENT_QUEUE, &HEARTBEAT_PACER, config, stack, audio).await;
}
