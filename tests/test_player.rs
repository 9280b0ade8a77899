use star_raider::effects::{Effect, MusicMode};
use star_raider::entities::ProjectileKind;
use star_raider::input::{DigitalAxes, InputIntent, MoveMode};
use star_raider::player::*;
use star_raider::utils::Vec2;

const W: f64 = 1280.0;
const H: f64 = 720.0;

fn make_player() -> Player {
    Player::new(ShipClass::Standard, 3, H)
}

/// One frame of upkeep at `now_ms`; returns the status and raised effects.
fn tick(player: &mut Player, input: &InputIntent, dt: f64, now_ms: f64) -> (PlayerStatus, Vec<Effect>) {
    let mut effects = Vec::new();
    let status = player.update(input, dt, now_ms, W, H, &mut effects);
    (status, effects)
}

fn held(left: bool, right: bool) -> InputIntent {
    InputIntent::digital(
        DigitalAxes {
            left,
            right,
            ..DigitalAxes::default()
        },
        false,
    )
}

// ── Construction ──────────────────────────────────────────────────────────────

#[test]
fn new_player_starts_left_and_centred() {
    let p = make_player();
    assert_eq!(p.pos, Vec2::new(PLAYER_START_X, H / 2.0));
    assert_eq!(p.lives, 3);
    assert_eq!(p.fuel, 100.0);
    assert_eq!(p.weapon_level, 1);
    assert_eq!(p.state(), PlayerState::Normal);
    assert!(p.last_shot.is_none());
}

#[test]
fn ship_classes_trade_speed_for_fuel() {
    let swift = Player::new(ShipClass::Swift, 3, H);
    let freighter = Player::new(ShipClass::Freighter, 3, H);
    assert_eq!(swift.speed, 7.0);
    assert_eq!(swift.max_fuel, 100.0);
    assert_eq!(freighter.speed, 5.0);
    assert_eq!(freighter.fuel, 150.0);
    assert_eq!(freighter.fuel_percent(), 100.0);
}

// ── Fuel ──────────────────────────────────────────────────────────────────────

#[test]
fn fuel_burns_with_time() {
    let mut p = make_player();
    let (status, _) = tick(&mut p, &InputIntent::idle(), 1000.0, 1000.0);
    assert_eq!(status, PlayerStatus::Alive);
    assert!((p.fuel - 98.0).abs() < 1e-9);
}

#[test]
fn empty_tank_reports_out_of_fuel() {
    let mut p = make_player();
    p.fuel = 0.5;
    let (status, _) = tick(&mut p, &InputIntent::idle(), 1000.0, 1000.0);
    assert_eq!(status, PlayerStatus::OutOfFuel);
    assert_eq!(p.fuel, 0.0);
}

#[test]
fn zero_timestep_burns_nothing() {
    let mut p = make_player();
    tick(&mut p, &InputIntent::idle(), 0.0, 0.0);
    assert_eq!(p.fuel, 100.0);
}

#[test]
fn low_fuel_warning_repeats_at_most_once_a_second() {
    let mut p = make_player();
    p.fuel = 20.0;

    let (_, first) = tick(&mut p, &InputIntent::idle(), 16.0, 16.0);
    assert!(first.contains(&Effect::LowFuel));

    let (_, soon) = tick(&mut p, &InputIntent::idle(), 16.0, 32.0);
    assert!(!soon.contains(&Effect::LowFuel));

    let (_, later) = tick(&mut p, &InputIntent::idle(), 16.0, 1100.0);
    assert!(later.contains(&Effect::LowFuel));
}

#[test]
fn refuel_caps_at_max() {
    let mut p = make_player();
    p.fuel = 70.0;
    p.refuel(50.0);
    assert_eq!(p.fuel, 100.0);
}

// ── Timers ────────────────────────────────────────────────────────────────────

#[test]
fn shield_expiry_restores_normal_music() {
    let mut p = make_player();
    p.activate_shield(100.0);
    assert_eq!(p.state(), PlayerState::Shielded);

    let (_, effects) = tick(&mut p, &InputIntent::idle(), 200.0, 200.0);
    assert!(!p.shield_active);
    assert_eq!(p.shield_timer, 0.0);
    assert!(effects.contains(&Effect::Music(MusicMode::Normal)));
}

#[test]
fn rapid_fire_runs_out() {
    let mut p = make_player();
    p.activate_rapid_fire(100.0);
    tick(&mut p, &InputIntent::idle(), 50.0, 50.0);
    assert!(p.rapid_fire_active);
    tick(&mut p, &InputIntent::idle(), 60.0, 110.0);
    assert!(!p.rapid_fire_active);
    assert_eq!(p.rapid_fire_timer, 0.0);
}

#[test]
fn respawn_window_ends_after_three_seconds() {
    let mut p = make_player();
    p.respawn();
    assert_eq!(p.state(), PlayerState::Respawning);
    assert!(!p.visible());

    tick(&mut p, &InputIntent::idle(), 100.0, 100.0);
    assert!(p.visible());

    tick(&mut p, &InputIntent::idle(), RESPAWN_DURATION_MS, 3100.0);
    assert!(!p.is_respawning);
    assert_eq!(p.state(), PlayerState::Normal);
}

// ── Movement ──────────────────────────────────────────────────────────────────

#[test]
fn digital_input_accelerates() {
    let mut p = make_player();
    tick(&mut p, &held(false, true), 16.0, 16.0);
    assert!(p.pos.x > PLAYER_START_X);
    assert!(p.vel.x > 0.0);
}

#[test]
fn left_wall_stops_the_ship() {
    let mut p = make_player();
    p.pos.x = 0.0;
    tick(&mut p, &held(true, false), 16.0, 16.0);
    assert_eq!(p.pos.x, 0.0);
    assert_eq!(p.vel.x, 0.0);
}

#[test]
fn right_wall_stops_the_ship() {
    let mut p = make_player();
    p.pos.x = W - PLAYER_WIDTH;
    tick(&mut p, &held(false, true), 16.0, 16.0);
    assert_eq!(p.pos.x, W - PLAYER_WIDTH);
    assert_eq!(p.vel.x, 0.0);
}

#[test]
fn analog_stick_overrides_pointer() {
    let mut p = make_player();
    let input = InputIntent {
        move_mode: MoveMode::Pointer,
        pointer_target: Some(Vec2::new(0.0, 0.0)),
        analog_move: Some(Vec2::new(1.0, 0.0)),
        ..InputIntent::default()
    };
    tick(&mut p, &input, 16.0, 16.0);
    assert_eq!(p.pos.x, PLAYER_START_X + 10.0);
    assert_eq!(p.pos.y, H / 2.0);
}

#[test]
fn stick_inside_deadzone_does_nothing() {
    let mut p = make_player();
    tick(&mut p, &InputIntent::analog(Vec2::new(0.05, -0.05), false), 16.0, 16.0);
    assert_eq!(p.pos, Vec2::new(PLAYER_START_X, H / 2.0));
}

#[test]
fn pointer_eases_toward_target() {
    let mut p = make_player();
    tick(&mut p, &InputIntent::pointer(Vec2::new(500.0, H / 2.0), false), 16.0, 16.0);
    assert!((p.pos.x - 140.0).abs() < 1e-6, "x = {}", p.pos.x);
    assert!((p.pos.y - H / 2.0).abs() < 1e-6);
}

// ── Weapons ───────────────────────────────────────────────────────────────────

#[test]
fn volley_shape_per_weapon_level() {
    let expected = [(1, 1, 0), (2, 2, 0), (3, 3, 1), (4, 4, 2), (5, 5, 3)];
    let mut p = make_player();
    for (level, shots, power) in expected {
        p.weapon_level = level;
        let volley = p.shoot();
        assert_eq!(volley.len(), shots, "level {level}");
        let heavy = volley.iter().filter(|s| s.kind == ProjectileKind::Power).count();
        assert_eq!(heavy, power, "level {level}");
        assert!(volley.iter().all(|s| s.vel.x > 0.0 && s.vel.y == 0.0));
    }
}

#[test]
fn level_two_streams_straddle_the_nose() {
    let mut p = make_player();
    p.weapon_level = 2;
    let c = p.center();
    let mut ys: Vec<f64> = p.shoot().iter().map(|s| s.pos.y).collect();
    ys.sort_by(|a, b| a.total_cmp(b));
    assert_eq!(ys, vec![c.y - 5.0, c.y + 5.0]);
}

#[test]
fn top_level_center_shot_is_fastest() {
    let mut p = make_player();
    p.weapon_level = MAX_WEAPON_LEVEL;
    let volley = p.shoot();
    let fastest = volley
        .iter()
        .map(|s| s.vel.x)
        .fold(f64::MIN, f64::max);
    assert_eq!(fastest, 22.5);
    assert_eq!(volley.iter().filter(|s| s.vel.x == 15.0).count(), 4);
}

#[test]
fn aimed_pattern_follows_the_stick() {
    let mut p = make_player();
    p.weapon_level = 3;
    let volley = p.volley(FirePattern::Aimed, Some(Vec2::new(0.0, 1.0)));
    let centre = volley
        .iter()
        .find(|s| s.kind == ProjectileKind::Power)
        .expect("level 3 has a power shot");
    assert!(centre.vel.x.abs() < 1e-9);
    assert!((centre.vel.y - 15.0).abs() < 1e-9);
    assert!(volley.iter().all(|s| s.pos == p.center()));
}

#[test]
fn first_shot_is_immediate_then_gated() {
    let mut p = make_player();
    assert!(p.try_fire(0.0, FirePattern::Forward, None).is_some());
    assert!(p.try_fire(100.0, FirePattern::Forward, None).is_none());
    assert!(p.try_fire(200.0, FirePattern::Forward, None).is_none());
    assert!(p.try_fire(201.0, FirePattern::Forward, None).is_some());
}

#[test]
fn rapid_fire_triples_the_rate() {
    let mut p = make_player();
    p.activate_rapid_fire(10_000.0);
    assert!((p.effective_interval() - SHOOT_INTERVAL_MS / 3.0).abs() < 1e-9);
    assert!(p.try_fire(0.0, FirePattern::Forward, None).is_some());
    assert!(p.try_fire(50.0, FirePattern::Forward, None).is_none());
    assert!(p.try_fire(67.0, FirePattern::Forward, None).is_some());
}

#[test]
fn weapon_upgrades_stop_at_their_cap() {
    let mut p = make_player();
    for _ in 0..4 {
        assert!(p.upgrade_weapon(MAX_WEAPON_LEVEL));
    }
    assert_eq!(p.weapon_level, 5);
    assert!(!p.upgrade_weapon(MAX_WEAPON_LEVEL));

    // A lower cap never lowers an already higher level.
    p.weapon_level = 4;
    assert!(!p.upgrade_weapon(3));
    assert_eq!(p.weapon_level, 4);
}

// ── Damage ────────────────────────────────────────────────────────────────────

#[test]
fn shield_absorbs_hits() {
    let mut p = make_player();
    p.activate_shield(10_000.0);
    assert_eq!(p.take_hit(), HitOutcome::Absorbed);
    assert_eq!(p.lives, 3);
}

#[test]
fn losing_a_life_respawns_with_basic_gear() {
    let mut p = make_player();
    p.weapon_level = 4;
    p.fuel = 10.0;
    p.activate_rapid_fire(10_000.0);

    assert_eq!(p.take_hit(), HitOutcome::Respawned);
    assert_eq!(p.lives, 2);
    assert_eq!(p.weapon_level, 1);
    assert_eq!(p.fuel, p.max_fuel);
    assert!(!p.rapid_fire_active);
    assert!(p.invulnerable());

    // Still blinking: a second hit changes nothing.
    assert_eq!(p.take_hit(), HitOutcome::Absorbed);
    assert_eq!(p.lives, 2);
}

#[test]
fn last_life_destroys_the_ship() {
    let mut p = Player::new(ShipClass::Standard, 1, H);
    p.weapon_level = 3;
    assert_eq!(p.take_hit(), HitOutcome::Destroyed);
    assert_eq!(p.lives, 0);
    assert_eq!(p.state(), PlayerState::Dead);
    assert_eq!(p.weapon_level, 2);
}

// ── Input intent ──────────────────────────────────────────────────────────────

#[test]
fn aim_stick_pulls_the_trigger() {
    assert!(!InputIntent::idle().wants_fire());
    let aiming = InputIntent {
        analog_aim: Some(Vec2::new(0.5, 0.0)),
        ..InputIntent::default()
    };
    assert!(aiming.wants_fire());
    let resting = InputIntent {
        analog_aim: Some(Vec2::new(0.05, 0.05)),
        ..InputIntent::default()
    };
    assert!(!resting.wants_fire());
}

#[test]
fn ship_names_parse_case_insensitively() {
    assert_eq!("Freighter".parse::<ShipClass>(), Ok(ShipClass::Freighter));
    assert_eq!("aimed".parse::<FirePattern>(), Ok(FirePattern::Aimed));
    assert!("zeppelin".parse::<ShipClass>().is_err());
}
