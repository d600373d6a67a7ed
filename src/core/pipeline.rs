//! Channel plumbing: generator, map stage, tee, bridge, or-done, any-of.
//!
//! Every helper returns receivers whose senders are owned by exactly one
//! spawned task, so each output closes exactly once, when that task exits.

use flume::Receiver;
use tokio_util::sync::CancellationToken;

use super::Spawn;

/// Emit every item of `items` on a rendezvous channel, then close it.
pub fn generate<T, I, S>(spawner: &S, items: I) -> Receiver<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
    S: Spawn,
{
    let (tx, rx) = flume::bounded(0);
    let items = items.into_iter();
    spawner.spawn(async move {
        for item in items {
            if tx.send_async(item).await.is_err() {
                break;
            }
        }
    });
    rx
}

/// Map every value of `input` through `f` into a new channel.
///
/// The output closes once `input` is closed and drained.
pub fn stage<T, U, F, S>(spawner: &S, input: Receiver<T>, f: F) -> Receiver<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + 'static,
    S: Spawn,
{
    let (tx, rx) = flume::bounded(0);
    spawner.spawn(async move {
        while let Ok(value) = input.recv_async().await {
            if tx.send_async(f(value)).await.is_err() {
                break;
            }
        }
    });
    rx
}

/// Forward `input` until it closes or `cancel` fires.
pub fn or_done<T, S>(spawner: &S, cancel: CancellationToken, input: Receiver<T>) -> Receiver<T>
where
    T: Send + 'static,
    S: Spawn,
{
    let (tx, rx) = flume::bounded(0);
    spawner.spawn(async move {
        loop {
            let value = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                next = input.recv_async() => match next {
                    Ok(value) => value,
                    Err(_) => return,
                },
            };
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                sent = tx.send_async(value) => if sent.is_err() { return },
            }
        }
    });
    rx
}

/// Duplicate every value of `input` into two outputs.
///
/// Each value is offered to both outputs concurrently and the next value is
/// read only after both have taken it, so both consumers must keep reading.
/// Both outputs close when `input` ends or `cancel` fires.
pub fn tee<T, S>(
    spawner: &S,
    cancel: CancellationToken,
    input: Receiver<T>,
) -> (Receiver<T>, Receiver<T>)
where
    T: Clone + Send + 'static,
    S: Spawn,
{
    let (left_tx, left_rx) = flume::bounded(0);
    let (right_tx, right_rx) = flume::bounded(0);
    spawner.spawn(async move {
        loop {
            let value = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                next = input.recv_async() => match next {
                    Ok(value) => value,
                    Err(_) => return,
                },
            };
            let copy = value.clone();
            let both = async { tokio::join!(left_tx.send_async(value), right_tx.send_async(copy)) };
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                (left, right) = both => if left.is_err() && right.is_err() { return },
            }
        }
    });
    (left_rx, right_rx)
}

/// Flatten a channel of channels, draining each inner channel in turn.
pub fn bridge<T, S>(
    spawner: &S,
    cancel: CancellationToken,
    streams: Receiver<Receiver<T>>,
) -> Receiver<T>
where
    T: Send + 'static,
    S: Spawn,
{
    let (tx, rx) = flume::bounded(0);
    spawner.spawn(async move {
        loop {
            let stream = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                next = streams.recv_async() => match next {
                    Ok(stream) => stream,
                    Err(_) => return,
                },
            };
            loop {
                let value = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    next = stream.recv_async() => match next {
                        Ok(value) => value,
                        Err(_) => break,
                    },
                };
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return,
                    sent = tx.send_async(value) => if sent.is_err() { return },
                }
            }
        }
    });
    rx
}

/// A token cancelled as soon as any of `tokens` is.
///
/// With no tokens the result is never cancelled by this helper; with one
/// token it is that token.
pub fn any_cancelled<S: Spawn>(spawner: &S, tokens: &[CancellationToken]) -> CancellationToken {
    match tokens {
        [] => CancellationToken::new(),
        [only] => only.clone(),
        many => {
            let combined = CancellationToken::new();
            for token in many {
                let token = token.clone();
                let combined = combined.clone();
                spawner.spawn(async move {
                    tokio::select! {
                        () = token.cancelled() => combined.cancel(),
                        () = combined.cancelled() => {}
                    }
                });
            }
            combined
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::TokioSpawner;
    use std::time::Duration;

    async fn drain<T>(rx: Receiver<T>) -> Vec<T> {
        let mut values = Vec::new();
        while let Ok(v) = rx.recv_async().await {
            values.push(v);
        }
        values
    }

    #[tokio::test]
    async fn test_generate_then_square() {
        let spawner = TokioSpawner::current();
        let squares = stage(&spawner, generate(&spawner, 1..=5), |n: u32| n * n);
        assert_eq!(drain(squares).await, vec![1, 4, 9, 16, 25]);
    }

    #[tokio::test]
    async fn test_tee_duplicates() {
        let spawner = TokioSpawner::current();
        let (left, right) = tee(&spawner, CancellationToken::new(), generate(&spawner, 1..=5));
        let (l, r) = tokio::join!(drain(left), drain(right));
        assert_eq!(l, vec![1, 2, 3, 4, 5]);
        assert_eq!(r, l);
    }

    #[tokio::test]
    async fn test_bridge_flattens_in_order() {
        let spawner = TokioSpawner::current();
        let streams: Vec<Receiver<u32>> = (0..5)
            .map(|i| generate(&spawner, vec![i * 10, i * 10 + 1]))
            .collect();
        let flat = bridge(&spawner, CancellationToken::new(), generate(&spawner, streams));
        assert_eq!(drain(flat).await, vec![0, 1, 10, 11, 20, 21, 30, 31, 40, 41]);
    }

    #[tokio::test]
    async fn test_or_done_stops_on_cancel() {
        let spawner = TokioSpawner::current();
        let cancel = CancellationToken::new();
        let (_tx, rx) = flume::unbounded::<u32>();
        let out = or_done(&spawner, cancel.clone(), rx);
        cancel.cancel();
        let closed = tokio::time::timeout(Duration::from_secs(1), out.recv_async()).await;
        assert!(closed.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_any_cancelled_fires_on_first() {
        let spawner = TokioSpawner::current();
        let tokens: Vec<_> = (0..5).map(|_| CancellationToken::new()).collect();
        let any = any_cancelled(&spawner, &tokens);
        assert!(!any.is_cancelled());

        tokens[3].cancel();
        tokio::time::timeout(Duration::from_secs(1), any.cancelled())
            .await
            .unwrap();
        assert!(!tokens[0].is_cancelled());
    }
}
