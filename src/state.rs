use std::collections::VecDeque;
use std::time::Instant;

use chrono::Local;
use rand::Rng;

use crate::character::{
    Ability, CharacterRecord, ClassInfo, ability_modifier, format_modifier,
};
use crate::dice::{self, DiceOverlay, OverlayPhase, RollResult};

const MAX_LOGS: usize = 200;
const PLACEHOLDER: &str = "--";
pub const DEFAULT_CHARACTER_NAME: &str = "Unnamed Adventurer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Abilities,
    Combat,
    Console,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Abilities, Tab::Combat, Tab::Console];

    pub fn name(self) -> &'static str {
        match self {
            Tab::Abilities => "abilities",
            Tab::Combat => "combat",
            Tab::Console => "console",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Abilities => "Abilities",
            Tab::Combat => "Combat",
            Tab::Console => "Console",
        }
    }

    pub fn from_name(name: &str) -> Option<Tab> {
        let name = name.trim();
        Tab::ALL
            .into_iter()
            .find(|tab| tab.name().eq_ignore_ascii_case(name))
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Abilities => 0,
            Tab::Combat => 1,
            Tab::Console => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabPanel {
    pub tab: Tab,
    pub visible: bool,
    pub trigger_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatBox {
    pub ability: Ability,
    pub label: String,
    pub score: Option<i32>,
    pub modifier: Option<i32>,
}

impl StatBox {
    fn empty(ability: Ability) -> Self {
        Self {
            ability,
            label: ability.label().to_string(),
            score: None,
            modifier: None,
        }
    }

    pub fn score_text(&self) -> String {
        self.score
            .map(|s| s.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    pub fn modifier_text(&self) -> String {
        self.modifier
            .map(format_modifier)
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }
}

/// Everything the sheet displays, already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetView {
    pub name: String,
    pub current_hp: String,
    pub max_hp: String,
    pub armor_class: String,
    pub initiative: String,
    pub level: String,
    pub proficiency: String,
    pub class_name: String,
    pub stat_boxes: [StatBox; 6],
}

impl Default for SheetView {
    fn default() -> Self {
        Self {
            name: DEFAULT_CHARACTER_NAME.to_string(),
            current_hp: PLACEHOLDER.to_string(),
            max_hp: PLACEHOLDER.to_string(),
            armor_class: PLACEHOLDER.to_string(),
            initiative: PLACEHOLDER.to_string(),
            level: PLACEHOLDER.to_string(),
            proficiency: PLACEHOLDER.to_string(),
            class_name: PLACEHOLDER.to_string(),
            stat_boxes: Ability::ALL.map(StatBox::empty),
        }
    }
}

impl SheetView {
    pub fn stat_box(&self, ability: Ability) -> &StatBox {
        &self.stat_boxes[ability.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading { id: u32 },
    Loaded { id: u32 },
    Failed { id: u32, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatAction {
    Initiative,
    HitDie,
    DeathSave,
}

impl CombatAction {
    pub fn label(self) -> &'static str {
        match self {
            CombatAction::Initiative => "Initiative",
            CombatAction::HitDie => "Hit Die",
            CombatAction::DeathSave => "Death Save",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    CharacterLoaded { id: u32, record: CharacterRecord },
    CharacterFailed { id: u32, error: String },
    ClassResolved(ClassInfo),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    CheckHealth,
    FetchCharacter { id: u32 },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub active_tab: Tab,
    pub sheet: SheetView,
    pub character: Option<CharacterRecord>,
    pub class_info: Option<ClassInfo>,
    pub character_id: Option<u32>,
    pub load_status: LoadStatus,
    pub overlay: Option<DiceOverlay>,
    pub selected_ability: Ability,
    pub selected_action: usize,
    pub console_scroll: u16,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            active_tab: Tab::Abilities,
            sheet: SheetView::default(),
            character: None,
            class_info: None,
            character_id: None,
            load_status: LoadStatus::Idle,
            overlay: None,
            selected_ability: Ability::Strength,
            selected_action: 0,
            console_scroll: 0,
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    /// Returns `false` and leaves the view untouched for an unknown tab name.
    pub fn switch_tab_named(&mut self, name: &str) -> bool {
        match Tab::from_name(name) {
            Some(tab) => {
                self.switch_tab(tab);
                true
            }
            None => false,
        }
    }

    pub fn next_tab(&mut self) {
        let idx = (self.active_tab.index() + 1) % Tab::ALL.len();
        self.switch_tab(Tab::ALL[idx]);
    }

    pub fn prev_tab(&mut self) {
        let len = Tab::ALL.len();
        let idx = (self.active_tab.index() + len - 1) % len;
        self.switch_tab(Tab::ALL[idx]);
    }

    pub fn tab_panels(&self) -> [TabPanel; 3] {
        Tab::ALL.map(|tab| TabPanel {
            tab,
            visible: tab == self.active_tab,
            trigger_active: tab == self.active_tab,
        })
    }

    pub fn begin_load(&mut self, id: u32) {
        self.character_id = Some(id);
        self.load_status = LoadStatus::Loading { id };
    }

    pub fn render_character(&mut self, record: CharacterRecord) {
        self.sheet.name = record.name.clone();
        self.sheet.current_hp = record.current_hp.to_string();
        self.sheet.max_hp = record.max_hp.to_string();
        self.sheet.level = record.level.to_string();
        self.sheet.proficiency = format_modifier(record.proficiency_bonus());

        for ability in Ability::ALL {
            self.update_stat_box(ability, record.score(ability));
        }

        self.sheet.armor_class = record.armor_class().to_string();
        self.sheet.initiative = format_modifier(record.initiative());

        if self
            .class_info
            .as_ref()
            .is_some_and(|c| Some(c.id) != record.class_id)
        {
            self.class_info = None;
            self.sheet.class_name = PLACEHOLDER.to_string();
        }
        self.character = Some(record);
    }

    /// Rewrites one box. A held record takes the new score too, so the
    /// box's roll and the DEX-derived defenses follow what is displayed.
    pub fn update_stat_box(&mut self, ability: Ability, score: i32) {
        let stat = &mut self.sheet.stat_boxes[ability.index()];
        stat.label = ability.label().to_string();
        stat.score = Some(score);
        stat.modifier = Some(ability_modifier(score));

        if let Some(record) = self.character.as_mut() {
            record.set_score(ability, score);
            if ability == Ability::Dexterity {
                self.sheet.armor_class = record.armor_class().to_string();
                self.sheet.initiative = format_modifier(record.initiative());
            }
        }
    }

    /// Looks the box up by its exact short code (`"DEX"`), not by scanning
    /// box text. Returns `false` when nothing matches.
    pub fn update_stat_box_by_code(&mut self, label: &str, short_code: &str, score: i32) -> bool {
        let Some(ability) = Ability::from_short_code(short_code) else {
            return false;
        };
        self.update_stat_box(ability, score);
        self.sheet.stat_boxes[ability.index()].label = label.to_string();
        true
    }

    pub fn set_class_info(&mut self, info: ClassInfo) {
        self.sheet.class_name = match info.hit_die {
            Some(die) => format!("{} (d{die})", info.name),
            None => info.name.clone(),
        };
        self.class_info = Some(info);
    }

    /// The modifier the box shows; `0` before anything was rendered.
    pub fn current_modifier(&self, ability: Ability) -> i32 {
        self.sheet.stat_box(ability).modifier.unwrap_or(0)
    }

    pub fn roll(&mut self, die: u32, bonus: i32, label: &str, now: Instant) -> RollResult {
        self.roll_with(&mut rand::thread_rng(), die, bonus, label, now)
    }

    /// Shows the result in a fresh overlay, replacing (and so cancelling the
    /// dismissal of) any overlay still on screen.
    pub fn roll_with<R: Rng>(
        &mut self,
        rng: &mut R,
        die: u32,
        bonus: i32,
        label: &str,
        now: Instant,
    ) -> RollResult {
        let result = dice::roll_dice(rng, die, bonus, label);
        self.overlay = Some(DiceOverlay::new(result.clone(), now));
        result
    }

    pub fn roll_ability(&mut self, ability: Ability, now: Instant) -> RollResult {
        self.roll_ability_with(&mut rand::thread_rng(), ability, now)
    }

    pub fn roll_ability_with<R: Rng>(
        &mut self,
        rng: &mut R,
        ability: Ability,
        now: Instant,
    ) -> RollResult {
        let modifier = self.current_modifier(ability);
        let label = self.sheet.stat_box(ability).label.clone();
        self.roll_with(rng, 20, modifier, &label, now)
    }

    pub fn combat_actions(&self) -> Vec<CombatAction> {
        let mut actions = vec![CombatAction::Initiative];
        if self.hit_die().is_some() {
            actions.push(CombatAction::HitDie);
        }
        actions.push(CombatAction::DeathSave);
        actions
    }

    fn hit_die(&self) -> Option<u32> {
        self.class_info.as_ref().and_then(|c| c.hit_die)
    }

    pub fn roll_combat_action_with<R: Rng>(
        &mut self,
        rng: &mut R,
        action: CombatAction,
        now: Instant,
    ) -> Option<RollResult> {
        match action {
            CombatAction::Initiative => {
                let bonus = self.current_modifier(Ability::Dexterity);
                Some(self.roll_with(rng, 20, bonus, action.label(), now))
            }
            CombatAction::HitDie => {
                let die = self.hit_die()?;
                let bonus = self.current_modifier(Ability::Constitution);
                Some(self.roll_with(rng, die, bonus, action.label(), now))
            }
            CombatAction::DeathSave => Some(self.roll_with(rng, 20, 0, action.label(), now)),
        }
    }

    pub fn roll_selected_action(&mut self, now: Instant) -> Option<RollResult> {
        let action = self.combat_actions().get(self.selected_action).copied()?;
        self.roll_combat_action_with(&mut rand::thread_rng(), action, now)
    }

    pub fn tick_overlay(&mut self, now: Instant) {
        let keep = self.overlay.as_mut().is_some_and(|o| o.tick(now));
        if !keep {
            self.overlay = None;
        }
    }

    pub fn overlay_phase(&self) -> Option<OverlayPhase> {
        self.overlay.as_ref().map(|o| o.phase)
    }

    pub fn select_next_ability(&mut self) {
        let idx = (self.selected_ability.index() + 1) % Ability::ALL.len();
        self.selected_ability = Ability::ALL[idx];
    }

    pub fn select_prev_ability(&mut self) {
        let len = Ability::ALL.len();
        let idx = (self.selected_ability.index() + len - 1) % len;
        self.selected_ability = Ability::ALL[idx];
    }

    pub fn select_next_action(&mut self) {
        let len = self.combat_actions().len();
        self.selected_action = (self.selected_action + 1).min(len.saturating_sub(1));
    }

    pub fn select_prev_action(&mut self) {
        self.selected_action = self.selected_action.saturating_sub(1);
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let stamp = Local::now().format("%H:%M:%S");
        self.logs.push_back(format!("{stamp} {}", msg.into()));
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::CharacterLoaded { id, record } => {
            if state.character_id != Some(id) {
                state.push_log(format!("[INFO] Ignored stale character {id}"));
                return;
            }
            let name = record.name.clone();
            state.render_character(record);
            state.load_status = LoadStatus::Loaded { id };
            state.push_log(format!("[INFO] Loaded character {id}: {name}"));
        }
        Delta::CharacterFailed { id, error } => {
            if state.character_id != Some(id) {
                return;
            }
            state.push_log(format!("[WARN] Character {id} load failed: {error}"));
            state.load_status = LoadStatus::Failed { id, error };
        }
        Delta::ClassResolved(info) => {
            let wanted = state.character.as_ref().and_then(|c| c.class_id);
            if wanted != Some(info.id) {
                return;
            }
            state.push_log(format!("[INFO] Class resolved: {}", info.name));
            state.set_class_info(info);
            let len = state.combat_actions().len();
            state.selected_action = state.selected_action.min(len.saturating_sub(1));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

pub fn load_status_label(status: &LoadStatus) -> String {
    match status {
        LoadStatus::Idle => "No character selected".to_string(),
        LoadStatus::Loading { id } => format!("Loading character {id}..."),
        LoadStatus::Loaded { id } => format!("Character {id} loaded"),
        LoadStatus::Failed { id, error } => format!("Character {id} unavailable: {error}"),
    }
}
