//! Deadline-driven cancellation tokens.
//!
//! A timeout is a cancellation fired by a timer, so every blocking wait that
//! takes a `CancellationToken` also accepts a deadline built here.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::Spawn;

/// Token cancelled once `timeout` elapses.
pub fn deadline_token<S: Spawn>(spawner: &S, timeout: Duration) -> CancellationToken {
    arm(spawner, CancellationToken::new(), timeout)
}

/// Child of `parent`, additionally cancelled once `timeout` elapses.
pub fn child_with_deadline<S: Spawn>(
    spawner: &S,
    parent: &CancellationToken,
    timeout: Duration,
) -> CancellationToken {
    arm(spawner, parent.child_token(), timeout)
}

fn arm<S: Spawn>(spawner: &S, token: CancellationToken, timeout: Duration) -> CancellationToken {
    let timer = token.clone();
    spawner.spawn(async move {
        tokio::select! {
            () = timer.cancelled() => {}
            () = tokio::time::sleep(timeout) => timer.cancel(),
        }
    });
    token
}
