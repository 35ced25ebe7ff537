use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use sketchduel_shared::{PlayerId, RoomCode, RoomCodeError, ServerMessage};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tracing::info;

use crate::logic::{dispatch, leave};
use crate::state::{AppState, Room};

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Invalid room code: {0}")]
    InvalidCode(#[from] RoomCodeError),
    #[error("Room not found")]
    NotFound,
    #[error("Room is full")]
    Full,
}

pub fn new_room_code() -> RoomCode {
    RoomCode::from_index(rand::rng().random_range(0..RoomCode::COUNT))
}

pub async fn create_room(state: &AppState) -> RoomCode {
    let mut rooms = state.rooms.write().await;
    let code = loop {
        let code = new_room_code();
        if !rooms.contains_key(&code) {
            break code;
        }
    };
    rooms.insert(code.clone(), Arc::new(RwLock::new(Room::new())));
    info!(room = %code, rooms = rooms.len(), "room created");
    code
}

pub async fn find_room(state: &AppState, code: &RoomCode) -> Option<Arc<RwLock<Room>>> {
    state.rooms.read().await.get(code).cloned()
}

/// Whether a lobby visitor may enter `code` right now.
pub async fn check_joinable(state: &AppState, code: &RoomCode) -> Result<(), RoomError> {
    let room = find_room(state, code).await.ok_or(RoomError::NotFound)?;
    if room.read().await.is_full() {
        return Err(RoomError::Full);
    }
    Ok(())
}

/// Seats the player, creating the room when the code is unknown. Returns the
/// room and the number of players now in it.
pub async fn join_room(
    state: &AppState,
    code: &RoomCode,
    player: PlayerId,
    peer: mpsc::UnboundedSender<ServerMessage>,
) -> Result<(Arc<RwLock<Room>>, usize), RoomError> {
    // Held until seated; leave_room drops empty rooms under the same lock.
    let mut rooms = state.rooms.write().await;
    let room = rooms
        .entry(code.clone())
        .or_insert_with(|| Arc::new(RwLock::new(Room::new())))
        .clone();
    let mut guard = room.write().await;
    if guard.is_full() {
        return Err(RoomError::Full);
    }
    guard.players.push(player);
    guard.peers.insert(player, peer);
    let count = guard.players.len();
    info!(room = %code, %player, players = count, "player joined");
    drop(guard);
    drop(rooms);
    Ok((room, count))
}

pub async fn leave_room(state: &AppState, code: &RoomCode, room: &Arc<RwLock<Room>>, player: PlayerId) {
    {
        let mut guard = room.write().await;
        let deliveries = leave(&mut guard, player);
        dispatch(&guard, deliveries);
        info!(room = %code, %player, players = guard.players.len(), "player left");
    }

    // Re-check under the map lock so a concurrent join keeps the room.
    let mut rooms = state.rooms.write().await;
    let Some(current) = rooms.get(code) else {
        return;
    };
    if !Arc::ptr_eq(current, room) {
        return;
    }
    if room.read().await.players.is_empty() {
        rooms.remove(code);
        info!(room = %code, rooms = rooms.len(), "room closed");
    }
}

/// Drops rooms that were created but nobody has joined within the TTL.
pub async fn sweep_idle_rooms(state: &AppState, now: Instant) -> usize {
    let ttl = state.config.room_ttl;
    let mut rooms = state.rooms.write().await;
    let before = rooms.len();
    rooms.retain(|_, room| {
        room.try_read()
            .map(|room| !room.is_idle(ttl, now))
            .unwrap_or(true)
    });
    before - rooms.len()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::prompts::WordListPrompts;
    use crate::state::Config;

    fn test_state(ttl: Duration) -> AppState {
        AppState::new(
            Config {
                public_dir: PathBuf::from("public"),
                prompt_category: "objects".into(),
                room_ttl: ttl,
            },
            Arc::new(WordListPrompts::default()),
        )
    }

    fn peer() -> mpsc::UnboundedSender<ServerMessage> {
        mpsc::unbounded_channel().0
    }

    #[test]
    fn generated_codes_are_four_letters() {
        for _ in 0..100 {
            let code = new_room_code();
            assert_eq!(code.as_str().len(), 4);
            assert!(code.as_str().chars().all(|ch| ch.is_ascii_uppercase()));
        }
    }

    #[tokio::test]
    async fn created_room_is_joinable_until_full() {
        let state = test_state(Duration::from_secs(60));
        let code = create_room(&state).await;
        assert!(check_joinable(&state, &code).await.is_ok());

        let (_, count) = join_room(&state, &code, PlayerId::from_u128(1), peer()).await.unwrap();
        assert_eq!(count, 1);
        let (_, count) = join_room(&state, &code, PlayerId::from_u128(2), peer()).await.unwrap();
        assert_eq!(count, 2);

        assert!(matches!(check_joinable(&state, &code).await, Err(RoomError::Full)));
        let third = join_room(&state, &code, PlayerId::from_u128(3), peer()).await;
        assert!(matches!(third, Err(RoomError::Full)));
    }

    #[tokio::test]
    async fn unknown_room_is_not_joinable_from_lobby() {
        let state = test_state(Duration::from_secs(60));
        let code = RoomCode::parse("ZZZZ").unwrap();
        assert!(matches!(check_joinable(&state, &code).await, Err(RoomError::NotFound)));
    }

    #[tokio::test]
    async fn last_player_leaving_closes_room() {
        let state = test_state(Duration::from_secs(60));
        let code = create_room(&state).await;
        let player = PlayerId::from_u128(1);
        let (room, _) = join_room(&state, &code, player, peer()).await.unwrap();
        leave_room(&state, &code, &room, player).await;
        assert!(find_room(&state, &code).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn join_racing_the_last_leave_stays_reachable() {
        let state = test_state(Duration::from_secs(60));
        let code = RoomCode::parse("RACE").unwrap();
        for round in 0..200u128 {
            let first = PlayerId::from_u128(round * 3 + 1);
            let second = PlayerId::from_u128(round * 3 + 2);
            let third = PlayerId::from_u128(round * 3 + 3);
            let (room, _) = join_room(&state, &code, first, peer()).await.unwrap();

            let leaving = {
                let state = state.clone();
                let code = code.clone();
                tokio::spawn(async move { leave_room(&state, &code, &room, first).await })
            };
            let joining = {
                let state = state.clone();
                let code = code.clone();
                tokio::spawn(async move { join_room(&state, &code, second, peer()).await })
            };
            leaving.await.unwrap();
            let (second_room, _) = joining.await.unwrap().unwrap();

            let (third_room, count) = join_room(&state, &code, third, peer()).await.unwrap();
            assert_eq!(count, 2, "round {round}");
            assert!(Arc::ptr_eq(&second_room, &third_room), "round {round}");

            leave_room(&state, &code, &third_room, third).await;
            leave_room(&state, &code, &third_room, second).await;
            assert!(find_room(&state, &code).await.is_none());
        }
    }

    #[tokio::test]
    async fn sweep_removes_only_idle_empty_rooms() {
        let state = test_state(Duration::from_secs(30));
        let idle = create_room(&state).await;
        let busy = create_room(&state).await;
        join_room(&state, &busy, PlayerId::from_u128(1), peer()).await.unwrap();

        assert_eq!(sweep_idle_rooms(&state, Instant::now()).await, 0);
        let later = Instant::now() + Duration::from_secs(31);
        assert_eq!(sweep_idle_rooms(&state, later).await, 1);
        assert!(find_room(&state, &idle).await.is_none());
        assert!(find_room(&state, &busy).await.is_some());
    }
}
