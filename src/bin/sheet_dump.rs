use anyhow::{Context, bail};

use charsheet_terminal::character::{Ability, format_modifier};
use charsheet_terminal::character_fetch;
use charsheet_terminal::config::Config;
use charsheet_terminal::http_client;
use charsheet_terminal::state::AppState;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = Config::from_env_and_args();

    let Some(id) = config.character_id else {
        bail!("usage: sheet_dump <id>  (or set CHARSHEET_CHARACTER_ID)");
    };
    http_client::init_http_client(config.http_timeout)?;

    let record = character_fetch::fetch_character(&config.api_base, id)
        .with_context(|| format!("loading character {id} from {}", config.api_base))?;
    let class = match record.class_id {
        Some(class_id) => character_fetch::fetch_class(&config.api_base, class_id)
            .unwrap_or_else(|err| {
                eprintln!("warning: class lookup failed: {err}");
                None
            }),
        None => None,
    };

    // Same derivations the TUI shows.
    let mut state = AppState::new();
    state.render_character(record);
    if let Some(class) = class {
        state.set_class_info(class);
    }
    let sheet = &state.sheet;

    println!("{} (level {}, {})", sheet.name, sheet.level, sheet.class_name);
    println!("HP: {} / {}", sheet.current_hp, sheet.max_hp);
    println!("AC: {}", sheet.armor_class);
    println!("Initiative: {}", sheet.initiative);
    println!("Proficiency: {}", sheet.proficiency);
    for ability in Ability::ALL {
        let stat = sheet.stat_box(ability);
        println!(
            "{} {:>3} ({})",
            ability.short_code(),
            stat.score_text(),
            stat.modifier.map(format_modifier).unwrap_or_default()
        );
    }

    Ok(())
}
