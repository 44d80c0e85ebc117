use std::time::{Duration, Instant};
use coup_reformation::room::{RoomCode, RoomError, RoomManager};
use coup_reformation::{ActionKind, Config, CoupError, GameMode, Phase, PlayerId, Seat};

fn seat(n: usize) -> Seat {
    Seat::new(format!("p{n}"), format!("Player {n}"))
}

fn id(n: usize) -> PlayerId {
    PlayerId::from(format!("p{n}"))
}

fn room_with(manager: &mut RoomManager, members: usize, now: Instant) -> RoomCode {
    let code = manager.create_room(seat(0), GameMode::Basic, now).unwrap();
    for n in 1..members {
        manager.join_room(&code, seat(n), now).unwrap();
    }
    code
}

#[test]
fn host_starts_the_game() {
    let mut manager = RoomManager::seeded(Config::default(), 1);
    let now = Instant::now();
    let code = room_with(&mut manager, 3, now);

    let room = manager.room(&code).unwrap();
    assert_eq!(room.host(), &id(0));
    assert_eq!(room.members().len(), 3);
    assert_eq!(room.status(), Phase::Waiting);

    assert!(matches!(manager.start_game(&code, &id(1)), Err(RoomError::NotHost(_))));

    let game = manager.start_game(&code, &id(0)).unwrap();
    assert_eq!(game.phase(), Phase::Playing);
    assert_eq!(game.players().len(), 3);
    assert!(game.players()[0].is_host);
    assert_eq!(game.current_player().map(|p| p.id.clone()), Some(id(0)));

    assert!(matches!(manager.join_room(&code, seat(3), now), Err(RoomError::AlreadyStarted)));
    assert!(matches!(manager.start_game(&code, &id(0)), Err(RoomError::AlreadyStarted)));
}

#[test]
fn rooms_are_independent_tables() {
    let mut manager = RoomManager::seeded(Config::default(), 2);
    let now = Instant::now();
    let first = room_with(&mut manager, 2, now);
    let second = room_with(&mut manager, 2, now);
    assert_ne!(first, second);

    manager.start_game(&first, &id(0)).unwrap();
    manager.start_game(&second, &id(0)).unwrap();

    let game = manager.room_mut(&first).unwrap().game_mut();
    game.execute_action(ActionKind::Income, None).unwrap();

    let coins = |code: &RoomCode| manager.room(code).unwrap().game().players()[0].coins;
    assert_eq!(coins(&first), 3);
    assert_eq!(coins(&second), 2);
}

#[test]
fn join_failures() {
    let mut manager = RoomManager::seeded(Config::default(), 3);
    let now = Instant::now();
    let code = room_with(&mut manager, 2, now);

    let missing = RoomCode::from("ZZZZZZ");
    assert!(matches!(manager.join_room(&missing, seat(5), now), Err(RoomError::NotFound(_))));

    assert!(matches!(manager.join_room(&code, seat(1), now), Err(RoomError::AlreadyJoined(_))));
    assert!(matches!(
        manager.join_room(&code, Seat::new("other", "Player 1"), now),
        Err(RoomError::NameTaken(_))
    ));

    for n in 2..6 {
        manager.join_room(&code, seat(n), now).unwrap();
    }
    assert!(matches!(manager.join_room(&code, seat(6), now), Err(RoomError::Full(6))));

    let later = now + Duration::from_secs(31 * 60);
    let fresh = room_with(&mut manager, 1, now);
    assert!(matches!(manager.join_room(&fresh, seat(1), later), Err(RoomError::Expired(_))));
}

#[test]
fn too_few_players_to_start() {
    let mut manager = RoomManager::seeded(Config::default(), 4);
    let code = room_with(&mut manager, 1, Instant::now());

    assert!(matches!(
        manager.start_game(&code, &id(0)),
        Err(RoomError::NotEnoughPlayers { min: 2, got: 1 })
    ));
}

#[test]
fn engine_errors_pass_through() {
    let config = Config { min_players: 1, ..Config::default() };
    let mut manager = RoomManager::seeded(config, 5);
    let code = room_with(&mut manager, 1, Instant::now());

    // the room allows a single member, the engine still sees the seat count
    assert!(matches!(
        manager.start_game(&code, &id(0)),
        Err(RoomError::Game(CoupError::PlayerCount { got: 1, .. }))
    ));
}

#[test]
fn host_leaving_hands_over_the_room() {
    let mut manager = RoomManager::seeded(Config::default(), 6);
    let code = room_with(&mut manager, 3, Instant::now());

    manager.leave_room(&code, &id(0)).unwrap();
    let room = manager.room(&code).unwrap();
    assert_eq!(room.host(), &id(1));
    assert_eq!(room.members().len(), 2);

    // a non-host leaving keeps the host
    manager.leave_room(&code, &id(2)).unwrap();
    assert_eq!(manager.room(&code).unwrap().host(), &id(1));

    assert!(matches!(manager.leave_room(&code, &id(7)), Err(RoomError::NotMember(_))));

    manager.leave_room(&code, &id(1)).unwrap();
    assert!(!manager.has_room(&code));
    assert!(manager.is_empty());
}

#[test]
fn play_again_reopens_the_lobby() {
    let mut manager = RoomManager::seeded(Config::default(), 7);
    let now = Instant::now();
    let code = room_with(&mut manager, 2, now);
    manager.start_game(&code, &id(0)).unwrap();

    assert!(matches!(manager.play_again(&code, &id(1)), Err(RoomError::NotHost(_))));
    manager.play_again(&code, &id(0)).unwrap();

    let room = manager.room(&code).unwrap();
    assert_eq!(room.status(), Phase::Waiting);
    assert!(room.game().players().is_empty());

    manager.join_room(&code, seat(2), now).unwrap();
    let game = manager.start_game(&code, &id(0)).unwrap();
    assert_eq!(game.players().len(), 3);
}

#[test]
fn old_rooms_expire() {
    let mut manager = RoomManager::seeded(Config::default(), 8);
    let start = Instant::now();
    let old = room_with(&mut manager, 2, start);
    let new = room_with(&mut manager, 2, start + Duration::from_secs(20 * 60));

    assert!(manager.expire(start + Duration::from_secs(30 * 60)).is_empty());

    let expired = manager.expire(start + Duration::from_secs(31 * 60));
    assert_eq!(expired, vec![old.clone()]);
    assert!(!manager.has_room(&old));
    assert!(manager.has_room(&new));
}
