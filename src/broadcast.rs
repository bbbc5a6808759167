use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

/// How often idle rooms are looked for
const REAP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn a background task that removes rooms idle longer than `ttl`.
///
/// Rooms with a connected client are kept however long they sit idle.
pub fn spawn_room_reaper(state: Arc<AppState>, ttl: Duration) -> tokio::task::JoinHandle<()> {
    spawn_room_reaper_every(state, ttl, REAP_INTERVAL)
}

fn spawn_room_reaper_every(
    state: Arc<AppState>,
    ttl: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let removed = state.reap_idle_rooms(ttl).await;
            if removed > 0 {
                tracing::info!("Reaped {} idle rooms", removed);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reaper_removes_idle_rooms() {
        let state = Arc::new(AppState::new());
        let room = state.create_room().await;

        let handle = spawn_room_reaper_every(state.clone(), Duration::ZERO, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(state.snapshot(&room.code).await.is_err());
    }

    #[tokio::test]
    async fn test_reaper_spares_watched_rooms() {
        let state = Arc::new(AppState::new());
        let room = state.create_room().await;
        let mut screen = state.subscribe(&room.code).await.unwrap();

        let handle = spawn_room_reaper_every(state.clone(), Duration::ZERO, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(state.snapshot(&room.code).await.is_ok());
        assert!(matches!(
            screen.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_reaper_keeps_active_rooms() {
        let state = Arc::new(AppState::new());
        let room = state.create_room().await;

        let handle = spawn_room_reaper_every(
            state.clone(),
            Duration::from_secs(3600),
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert!(state.snapshot(&room.code).await.is_ok());
    }
}
