use std::cell::Cell;
use std::rc::Rc;

use star_raider::boss::{Boss, BossState};
use star_raider::effects::{Effect, EffectLog, MusicMode};
use star_raider::entities::*;
use star_raider::input::{DigitalAxes, InputIntent};
use star_raider::utils::Vec2;
use star_raider::{ConfigError, SimConfig, World};

use rand::rngs::StdRng;
use rand::SeedableRng;

const TICK: f64 = 16.0;

fn quiet_config() -> SimConfig {
    SimConfig {
        star_count: 0,
        ..SimConfig::default()
    }
}

fn make_world() -> World {
    World::with_rng(quiet_config(), StdRng::seed_from_u64(42))
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn idle(world: &mut World) {
    world.update(&InputIntent::idle(), TICK);
}

fn count(effects: &[Effect], wanted: &Effect) -> usize {
    effects.iter().filter(|e| *e == wanted).count()
}

fn parked_meteor(size: MeteorSize, at: Vec2) -> Meteor {
    let mut m = Meteor::spawn(&mut seeded_rng(), size, Some(at), 1280.0, 720.0);
    m.vel = Vec2::default();
    m
}

fn player_shot(x: f64, y: f64) -> Projectile {
    Projectile::new(x, y, 15.0, 0.0, ProjectileKind::Player)
}

// ── Construction ──────────────────────────────────────────────────────────────

#[test]
fn new_world_starts_a_fresh_game() {
    let world = make_world();
    let hud = world.hud();
    assert_eq!(hud.score, 0);
    assert_eq!(hud.lives, 3);
    assert_eq!(hud.fuel_percent, 100.0);
    assert_eq!(hud.weapon_level, 1);
    assert!(!hud.boss_active);
    assert_eq!(hud.boss_health_percent, None);
    assert_eq!(hud.status, GameStatus::Playing);
    assert_eq!(world.effects(), &[Effect::Music(MusicMode::Normal)]);
}

#[test]
fn invalid_config_is_rejected() {
    let config = SimConfig {
        width: 0.0,
        ..SimConfig::default()
    };
    let Err(err) = World::new(config) else {
        panic!("zero-width field accepted");
    };
    assert!(matches!(err, ConfigError::Invalid { field: "width", .. }));
}

#[test]
fn seeded_worlds_replay_identically() {
    let config = SimConfig {
        seed: Some(7),
        ..SimConfig::default()
    };
    let mut a = World::new(config.clone()).expect("valid config");
    let mut b = World::new(config).expect("valid config");

    for i in 0..600 {
        let input = InputIntent::digital(
            DigitalAxes {
                up: i % 90 < 45,
                down: i % 90 >= 45,
                ..DigitalAxes::default()
            },
            true,
        );
        a.update(&input, TICK);
        b.update(&input, TICK);
    }

    assert_eq!(a.score(), b.score());
    assert_eq!(a.lives(), b.lives());
    assert_eq!(a.status(), b.status());
    assert_eq!(a.player.pos, b.player.pos);
    assert_eq!(a.enemies.len(), b.enemies.len());
    assert_eq!(a.meteors.len(), b.meteors.len());
    assert_eq!(a.projectiles.len(), b.projectiles.len());
}

// ── Timestep handling ─────────────────────────────────────────────────────────

#[test]
fn bad_timesteps_are_no_ops() {
    let mut world = make_world();
    world.update(&InputIntent::idle(), -5.0);
    world.update(&InputIntent::idle(), f64::NAN);

    assert_eq!(world.elapsed_ms(), 0.0);
    assert_eq!(world.player.fuel, 100.0);
    assert_eq!(world.status(), GameStatus::Playing);
    assert!(world.effects().is_empty());
}

#[test]
fn enemy_waves_tighten_over_time() {
    let mut world = make_world();
    for _ in 0..100 {
        idle(&mut world);
    }
    assert_eq!(world.enemies.len(), 1);
    assert_eq!(world.enemy_interval, 1480.0);
    assert!((world.speed - 5.005).abs() < 1e-9);
}

// ── Player outcomes ───────────────────────────────────────────────────────────

#[test]
fn running_dry_ends_the_game_once() {
    let mut world = make_world();
    let log = EffectLog::new();
    world.subscribe(log.clone());
    world.player.fuel = 0.1;

    world.update(&InputIntent::idle(), 1000.0);
    assert_eq!(world.status(), GameStatus::GameOver);
    assert_eq!(count(world.effects(), &Effect::GameOver), 1);

    for _ in 0..3 {
        idle(&mut world);
    }
    assert_eq!(world.elapsed_ms(), 1000.0);
    assert_eq!(log.count(|e| *e == Effect::GameOver), 1);
}

#[test]
fn firing_spawns_a_volley_and_respects_cooldown() {
    let mut world = make_world();
    let fire = InputIntent::digital(DigitalAxes::default(), true);

    world.update(&fire, TICK);
    assert_eq!(world.projectiles.len(), 1);
    assert!(world.effects().contains(&Effect::Shoot));

    world.update(&fire, TICK);
    assert_eq!(world.projectiles.len(), 1);
    assert!(!world.effects().contains(&Effect::Shoot));
}

#[test]
fn shield_soaks_a_meteor() {
    let mut world = make_world();
    world.player.activate_shield(5_000.0);
    let center = world.player.center();
    world.meteors.push(parked_meteor(MeteorSize::Large, center));

    idle(&mut world);
    assert_eq!(world.lives(), 3);
    assert!(world.meteors.is_empty());
    assert!(!world.effects().contains(&Effect::Hit));
    assert_eq!(world.score(), 0);
}

fn hostile_shot_at(x: f64, y: f64) -> Projectile {
    Projectile::new(x, y, 0.0, 0.0, ProjectileKind::Enemy)
}

#[test]
fn hostile_shot_costs_a_life() {
    let mut world = make_world();
    let pos = world.player.pos;
    world.add_projectile(hostile_shot_at(pos.x + 20.0, pos.y + 10.0));

    idle(&mut world);
    assert_eq!(world.lives(), 2);
    assert!(world.projectiles.is_empty());
    assert_eq!(count(world.effects(), &Effect::Hit), 1);
}

#[test]
fn shield_soaks_a_hostile_shot() {
    let mut world = make_world();
    world.player.activate_shield(5_000.0);
    let pos = world.player.pos;
    world.add_projectile(hostile_shot_at(pos.x + 20.0, pos.y + 10.0));

    idle(&mut world);
    assert_eq!(world.lives(), 3);
    assert!(world.projectiles.is_empty(), "shot is still used up");
    assert!(!world.effects().contains(&Effect::Hit));
}

#[test]
fn respawning_player_ignores_hostile_shots() {
    let mut world = make_world();
    world.player.respawn();
    let pos = world.player.pos;
    world.add_projectile(hostile_shot_at(pos.x + 20.0, pos.y + 10.0));
    world.add_projectile(hostile_shot_at(pos.x + 25.0, pos.y + 12.0));

    idle(&mut world);
    assert_eq!(world.lives(), 3);
    assert!(world.projectiles.is_empty());
    assert!(!world.effects().contains(&Effect::Hit));
}

#[test]
fn hostile_shot_grazing_the_inset_misses() {
    let mut world = make_world();
    let p = &world.player;
    let (x, y) = (p.pos.x + p.width - 10.0, p.pos.y + 10.0);
    world.add_projectile(hostile_shot_at(x, y));

    idle(&mut world);
    assert_eq!(world.lives(), 3);
    assert_eq!(world.projectiles.len(), 1);
}

#[test]
fn only_one_rammer_counts_per_frame() {
    let mut world = make_world();
    let pos = world.player.pos;
    world.enemies.push(Enemy::new(EnemyKind::Drone, pos.x, pos.y, 0.0, 0.0));
    world.enemies.push(Enemy::new(EnemyKind::Drone, pos.x, pos.y, 0.0, 0.0));

    idle(&mut world);
    assert_eq!(world.lives(), 2);
    assert_eq!(world.enemies.len(), 1);
    assert_eq!(count(world.effects(), &Effect::Hit), 1);
    assert!(world.player.is_respawning);
}

#[test]
fn losing_the_last_life_is_game_over() {
    let mut world = make_world();
    world.player.lives = 1;
    let pos = world.player.pos;
    world.enemies.push(Enemy::new(EnemyKind::Tank, pos.x, pos.y, 0.0, 0.0));

    idle(&mut world);
    assert_eq!(world.status(), GameStatus::GameOver);
    assert_eq!(world.lives(), 0);
    assert_eq!(count(world.effects(), &Effect::GameOver), 1);
}

// ── Pickups ───────────────────────────────────────────────────────────────────

#[test]
fn pickup_applies_once_while_player_lingers() {
    let mut world = make_world();
    let log = EffectLog::new();
    world.subscribe(log.clone());
    let center = world.player.center();
    world.pickups.push(Pickup::new(PickupKind::Shield, center, 60.0));

    idle(&mut world);
    idle(&mut world);
    idle(&mut world);

    assert!(world.player.shield_active);
    assert!(world.player.shield_timer < 10_000.0 - TICK);
    assert_eq!(log.count(|e| *e == Effect::Collect), 1);
    assert_eq!(log.count(|e| *e == Effect::Music(MusicMode::Shield)), 1);
    assert_eq!(world.pickups[0].kind, PickupKind::None);
}

#[test]
fn fuel_pickup_refuels() {
    let mut world = make_world();
    world.player.fuel = 20.0;
    let center = world.player.center();
    world.pickups.push(Pickup::new(PickupKind::Fuel, center, 60.0));

    idle(&mut world);
    assert!(world.player.fuel > 69.0 && world.player.fuel <= 70.0);
    assert!(world.effects().contains(&Effect::Refuel));
}

#[test]
fn weapon_pickup_upgrades_past_the_kill_cap() {
    let mut world = make_world();
    world.player.weapon_level = 3;
    let center = world.player.center();
    world.pickups.push(Pickup::new(PickupKind::Weapon, center, 60.0));

    idle(&mut world);
    assert_eq!(world.player.weapon_level, 4);
}

#[test]
fn maxed_weapon_pickup_is_silent() {
    let mut world = make_world();
    world.player.weapon_level = 5;
    let center = world.player.center();
    world.pickups.push(Pickup::new(PickupKind::Weapon, center, 60.0));

    idle(&mut world);
    assert_eq!(world.player.weapon_level, 5);
    assert_eq!(world.pickups[0].kind, PickupKind::None);
    assert!(!world.effects().contains(&Effect::Collect));
}

#[test]
fn starving_player_gets_rescue_fuel() {
    let mut world = make_world();
    world.player.fuel = 20.0;

    world.update(&InputIntent::idle(), 1001.0);
    assert_eq!(world.pickups.len(), 1);
    assert_eq!(world.pickups[0].kind, PickupKind::Fuel);
    assert!(world.effects().contains(&Effect::LowFuel));
}

// ── Shots ─────────────────────────────────────────────────────────────────────

#[test]
fn opposing_shots_cancel_out() {
    let mut world = make_world();
    world.add_projectile(player_shot(600.0, 300.0));
    world.add_projectile(Projectile::new(620.0, 300.0, -10.0, 0.0, ProjectileKind::Enemy));

    idle(&mut world);
    assert!(world.projectiles.is_empty());
    assert!(world
        .effects()
        .iter()
        .any(|e| matches!(e, Effect::Explosion { intensity: 3, .. })));
}

#[test]
fn one_shot_is_credited_to_one_target() {
    let mut world = make_world();
    world.enemies.push(Enemy::new(EnemyKind::Tank, 600.0, 300.0, 0.0, 0.0));
    world.meteors.push(parked_meteor(MeteorSize::Small, Vec2::new(630.0, 330.0)));
    world.add_projectile(Projectile::new(600.0, 320.0, 15.0, 0.0, ProjectileKind::Power));

    idle(&mut world);
    assert_eq!(world.enemies[0].health, 2);
    assert_eq!(world.meteors.len(), 1);
    assert_eq!(world.meteors[0].health, 1);
    assert!(world.projectiles.iter().all(|p| p.kind.is_hostile()));
    assert_eq!(world.score(), 0);
}

#[test]
fn killing_an_enemy_scores() {
    let mut world = make_world();
    world.enemies.push(Enemy::new(EnemyKind::Drone, 600.0, 300.0, 0.0, 0.0));
    world.add_projectile(player_shot(585.0, 310.0));

    idle(&mut world);
    assert_eq!(world.score(), 100);
    assert!(world.enemies.is_empty());
    assert!(world.player.weapon_level <= 2);
}

#[test]
fn shattered_meteor_fragments_wait_a_frame() {
    let mut world = make_world();
    let mut large = parked_meteor(MeteorSize::Large, Vec2::new(700.0, 300.0));
    large.health = 1;
    world.meteors.push(large);
    world.add_projectile(player_shot(685.0, 300.0));
    world.add_projectile(player_shot(685.0, 310.0));

    idle(&mut world);
    assert_eq!(world.score(), 50);
    assert_eq!(world.meteors.len(), 2);
    assert!(world
        .meteors
        .iter()
        .all(|m| m.size == MeteorSize::Medium && m.health == 2));
    assert_eq!(world.projectiles.len(), 1, "second shot flew on");
}

// ── Boss ──────────────────────────────────────────────────────────────────────

#[test]
fn reaching_the_threshold_summons_the_boss() {
    let mut world = make_world();
    world.enemies.push(Enemy::new(EnemyKind::Drone, 900.0, 300.0, 0.0, 0.0));
    world.score = 10_000;

    idle(&mut world);
    assert!(world.boss_active());
    assert!(world.enemies.is_empty());
    assert!(world.effects().contains(&Effect::Music(MusicMode::Boss)));
    assert_eq!(world.boss_health_percent(), Some(100.0));
    assert_eq!(world.boss.as_ref().map(|b| b.state), Some(BossState::Entering));
}

#[test]
fn no_waves_while_the_boss_is_out() {
    let mut world = make_world();
    world.score = 10_000;
    for _ in 0..200 {
        idle(&mut world);
    }
    assert!(world.boss_active());
    assert!(world.enemies.is_empty());
}

#[test]
fn defeating_the_boss_rewards_and_raises_the_bar() {
    let mut world = make_world();
    world.score = 10_000;
    let mut boss = Boss::new(1, 1280.0, 720.0);
    boss.pos.x = boss.target_x;
    boss.state = BossState::Fighting;
    boss.health = 1;
    let aim = Vec2::new(boss.pos.x + 120.0, boss.pos.y + 60.0);
    world.boss = Some(boss);
    world.add_projectile(player_shot(aim.x, aim.y));

    idle(&mut world);
    assert!(!world.boss_active());
    assert_eq!(world.score(), 15_000);
    assert_eq!(world.boss_level, 2);
    assert_eq!(world.next_boss_score, 13_000);
    assert_eq!(world.speed, 6.0);
    assert_eq!(world.enemy_interval, 1400.0);
    assert!(world.effects().contains(&Effect::BossDefeated));
    assert!(world.effects().contains(&Effect::Music(MusicMode::Normal)));
    assert!(world
        .effects()
        .iter()
        .any(|e| matches!(e, Effect::Celebration { .. })));

    // 15 000 already clears the 13 000 bar, so level 2 follows at once.
    idle(&mut world);
    assert_eq!(world.boss.as_ref().map(|b| b.level), Some(2));
    assert_eq!(world.boss.as_ref().map(|b| b.max_health), Some(900));
}

#[test]
fn boss_threshold_grows_by_a_fixed_step() {
    let mut world = make_world();
    for expected in [13_000, 16_000, 19_000] {
        let mut boss = Boss::new(world.boss_level, 1280.0, 720.0);
        boss.pos.x = boss.target_x;
        boss.state = BossState::Fighting;
        boss.health = 1;
        let aim = Vec2::new(boss.pos.x + 120.0, boss.pos.y + 60.0);
        world.boss = Some(boss);
        world.add_projectile(player_shot(aim.x, aim.y));

        idle(&mut world);
        assert!(!world.boss_active());
        assert_eq!(world.next_boss_score, expected);
        world.score = 0;
        world.projectiles.clear();
    }
}

#[test]
fn shots_after_the_killing_blow_fly_on() {
    let mut world = make_world();
    let mut boss = Boss::new(1, 1280.0, 720.0);
    boss.pos.x = boss.target_x;
    boss.state = BossState::Fighting;
    boss.health = 1;
    let aim = Vec2::new(boss.pos.x + 120.0, boss.pos.y + 60.0);
    world.boss = Some(boss);
    world.add_projectile(player_shot(aim.x, aim.y));
    world.add_projectile(player_shot(aim.x, aim.y + 20.0));

    idle(&mut world);
    assert!(!world.boss_active());
    assert_eq!(world.projectiles.len(), 1);
    assert_eq!(
        world
            .effects()
            .iter()
            .filter(|e| matches!(e, Effect::Explosion { intensity: 5, .. }))
            .count(),
        1,
        "only the killing shot struck the hull"
    );
}

// ── Reset & effect delivery ───────────────────────────────────────────────────

#[test]
fn reset_restores_the_opening_state() {
    let mut world = make_world();
    let log = EffectLog::new();
    world.subscribe(log.clone());

    world.score = 12_345;
    world.boss_level = 4;
    world.enemies.push(Enemy::new(EnemyKind::Tank, 900.0, 300.0, 0.0, 0.0));
    world.player.fuel = 0.1;
    world.update(&InputIntent::idle(), 1000.0);
    assert_eq!(world.status(), GameStatus::GameOver);
    log.take();

    world.reset();
    assert_eq!(world.status(), GameStatus::Playing);
    assert_eq!(world.score(), 0);
    assert_eq!(world.lives(), 3);
    assert_eq!(world.boss_level, 1);
    assert_eq!(world.next_boss_score, 10_000);
    assert!(world.enemies.is_empty());
    assert_eq!(world.elapsed_ms(), 0.0);
    assert_eq!(log.take(), vec![Effect::Music(MusicMode::Normal)]);

    idle(&mut world);
    assert_eq!(world.elapsed_ms(), TICK);
}

#[test]
fn every_sink_sees_every_effect() {
    let mut world = make_world();
    let shots = Rc::new(Cell::new(0));
    let counter = Rc::clone(&shots);
    world.subscribe(move |effect: &Effect| {
        if *effect == Effect::Shoot {
            counter.set(counter.get() + 1);
        }
    });
    let log = EffectLog::new();
    world.subscribe(log.clone());

    let fire = InputIntent::digital(DigitalAxes::default(), true);
    for _ in 0..30 {
        world.update(&fire, TICK);
    }
    assert!(shots.get() >= 2);
    assert_eq!(log.count(|e| *e == Effect::Shoot), shots.get());
}

#[test]
fn hud_serialises_to_json() {
    let world = make_world();
    let json = serde_json::to_string(&world.hud()).expect("hud serialises");
    assert!(json.contains("\"score\":0"));
    assert!(json.contains("\"status\":\"Playing\""));
}
