use std::time::Instant;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

use charsheet_terminal::character::Ability;
use charsheet_terminal::character_fetch::parse_character_json;
use charsheet_terminal::state::AppState;

const CHARACTER_JSON: &str = r#"{
  "id": 3,
  "name": "Brienne",
  "level": 5,
  "species_id": 1,
  "class_id": 1,
  "strength": 17,
  "dexterity": 9,
  "constitution": 15,
  "intelligence": 10,
  "wisdom": 11,
  "charisma": 8,
  "current_hp": 44,
  "max_hp": 44
}"#;

fn bench_character_parse(c: &mut Criterion) {
    c.bench_function("character_parse", |b| {
        b.iter(|| {
            let record = parse_character_json(black_box(CHARACTER_JSON)).unwrap();
            black_box(record.level);
        })
    });
}

fn bench_render_character(c: &mut Criterion) {
    let record = parse_character_json(CHARACTER_JSON).expect("valid fixture json");
    c.bench_function("render_character", |b| {
        b.iter(|| {
            let mut state = AppState::new();
            state.render_character(black_box(record.clone()));
            black_box(state.sheet.armor_class.len());
        })
    });
}

fn bench_ability_rolls(c: &mut Criterion) {
    let record = parse_character_json(CHARACTER_JSON).expect("valid fixture json");
    let mut state = AppState::new();
    state.render_character(record);
    let mut rng = StdRng::seed_from_u64(17);
    let now = Instant::now();
    c.bench_function("ability_rolls", |b| {
        b.iter(|| {
            for ability in Ability::ALL {
                let result = state.roll_ability_with(&mut rng, ability, now);
                black_box(result.total);
            }
        })
    });
}

criterion_group!(
    benches,
    bench_character_parse,
    bench_render_character,
    bench_ability_rolls
);
criterion_main!(benches);
