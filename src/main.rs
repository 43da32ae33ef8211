//! War Drum - Entry Point
//!
//! Interactive terminal host. Keys are read on a blocking task and forwarded
//! over a channel; a frame interval advances the round and redraws the field.

use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tokio::sync::mpsc;
use war_drum::battle::DisplayState;
use war_drum::core::config::EngineConfig;
use war_drum::core::error::Result;
use war_drum::core::types::{Millis, Side};
use war_drum::rhythm::{format_elapsed, Command, Symbol};
use war_drum::round::{AmbienceCue, EngineObserver, Outcome, RoundController};

const FRAME: Duration = Duration::from_millis(16);
const TRACK_WIDTH: usize = 60;
const BAR_WIDTH: usize = 20;

/// War Drum - drum four beats to march, strike, guard and fall back
#[derive(Parser, Debug)]
#[command(name = "war-drum")]
struct Args {
    /// Engine config (TOML)
    #[arg(long, default_value = "data/engine.toml")]
    config: PathBuf,

    /// Random seed for the damage roll
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write logs while the screen is in use
    #[arg(long, default_value = "war_drum.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log = std::fs::File::create(&args.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("war_drum=info")),
        )
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    tracing::info!("War Drum starting...");
    let config = load_config(&args.config)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, "damage rng seeded");

    let screen = Screen::begin()?;
    let result = run(screen, config, seed).await;
    tracing::info!("War Drum exiting");
    result
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    if path.exists() {
        EngineConfig::load(path)
    } else {
        tracing::warn!(?path, "config not found, using built-in defaults");
        Ok(EngineConfig::default())
    }
}

async fn run(mut screen: Screen, config: EngineConfig, seed: u64) -> Result<()> {
    let (tx, mut keys) = mpsc::unbounded_channel();
    let reader = tokio::task::spawn_blocking(move || read_keys(tx));

    let clock = Instant::now();
    let now = move || clock.elapsed().as_millis() as Millis;

    let mut round = RoundController::with_seed(config, seed, now());
    let mut view = View::default();
    round.start(now()).dispatch(&mut view);

    let mut frame = tokio::time::interval(FRAME);
    loop {
        tokio::select! {
            _ = frame.tick() => {
                round.advance(now()).dispatch(&mut view);
            }
            key = keys.recv() => {
                match key {
                    Some(KeyCode::Esc) | Some(KeyCode::Char('q' | 'Q')) | None => break,
                    Some(KeyCode::Char('r' | 'R')) if round.outcome().is_some() => {
                        round.restart(now()).dispatch(&mut view);
                    }
                    Some(KeyCode::Char(c)) => round.handle_key(c, now()).dispatch(&mut view),
                    Some(_) => {}
                }
            }
        }
        screen.draw(&round, &view)?;
    }

    round.teardown();
    drop(keys);
    if let Err(e) = reader.await {
        tracing::warn!("key reader did not shut down cleanly: {}", e);
    }
    Ok(())
}

/// Blocking key pump; exits once the receiver is gone
fn read_keys(tx: mpsc::UnboundedSender<KeyCode>) {
    while !tx.is_closed() {
        match event::poll(Duration::from_millis(50)) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                tracing::warn!("key poll failed: {}", e);
                break;
            }
        }
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
                let code = if ctrl_c { KeyCode::Esc } else { key.code };
                if tx.send(code).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("key read failed: {}", e);
                break;
            }
        }
    }
}

/// Presentation state the controller pushes to us
struct View {
    beat_lit: bool,
    elapsed_ms: Millis,
    last_sound: Option<Symbol>,
    last_command: Option<(Command, u32)>,
    ambience: f32,
    ducked: bool,
    victory_theme: bool,
    hero_display: DisplayState,
    enemy_display: DisplayState,
}

impl Default for View {
    fn default() -> Self {
        Self {
            beat_lit: false,
            elapsed_ms: 0,
            last_sound: None,
            last_command: None,
            ambience: 0.0,
            ducked: false,
            victory_theme: false,
            hero_display: DisplayState::Idle,
            enemy_display: DisplayState::Idle,
        }
    }
}

impl EngineObserver for View {
    fn on_beat_pulse(&mut self) {
        self.beat_lit = true;
    }

    fn on_beat_flash_ended(&mut self) {
        self.beat_lit = false;
    }

    fn on_elapsed(&mut self, elapsed_ms: Millis) {
        self.elapsed_ms = elapsed_ms;
    }

    fn on_command(&mut self, command: Command, combo: u32) {
        self.last_command = Some((command, combo));
    }

    fn on_outcome(&mut self, outcome: Option<Outcome>) {
        if outcome.is_none() {
            self.elapsed_ms = 0;
            self.last_command = None;
            self.beat_lit = false;
        }
    }

    fn on_combatant_state(&mut self, which: Side, _position: f32, _hp: f32, display: DisplayState) {
        match which {
            Side::Hero => self.hero_display = display,
            Side::Enemy => self.enemy_display = display,
        }
    }

    fn play_sound(&mut self, symbol: Symbol) {
        // No mixer in the terminal; flash the drum call instead
        self.last_sound = Some(symbol);
    }

    fn duck_ambience(&mut self, _factor: f32, _duration_ms: Millis) {
        self.ducked = true;
    }

    fn on_ambience(&mut self, cue: AmbienceCue) {
        match cue {
            AmbienceCue::Start { volume } | AmbienceCue::Restore { volume } => {
                self.ambience = volume;
                self.ducked = false;
            }
            AmbienceCue::Stop => self.ambience = 0.0,
            AmbienceCue::VictoryTheme => self.victory_theme = true,
            AmbienceCue::StopVictoryTheme => self.victory_theme = false,
            AmbienceCue::Duck { .. } => self.ducked = true,
        }
    }
}

/// Raw-mode alternate screen, restored on drop
struct Screen {
    out: Stdout,
}

impl Screen {
    fn begin() -> Result<Self> {
        terminal::enable_raw_mode()?;
        // From here on, Drop undoes whatever part of the setup took effect
        let mut screen = Self { out: io::stdout() };
        execute!(screen.out, EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))?;
        Ok(screen)
    }

    fn draw(&mut self, round: &RoundController, view: &View) -> Result<()> {
        let battle = round.battle();
        let config = round.config();
        let beat = if view.beat_lit { "( * )" } else { "(   )" };

        self.line(0, Color::White, format!("=== WAR DRUM ===   {}   {}", format_elapsed(view.elapsed_ms), beat))?;
        self.line(2, Color::Grey, track(battle.hero.position, battle.enemy.position))?;
        self.line(
            3,
            Color::Green,
            format!(
                "Hero   {} {:>3.0}/{:<3.0} {:?}",
                bar(battle.hero.hp_fraction()),
                battle.hero.hp,
                battle.hero.max_hp,
                view.hero_display
            ),
        )?;
        self.line(
            4,
            Color::Red,
            format!(
                "Enemy  {} {:>3.0}/{:<3.0} {:?}",
                bar(battle.enemy.hp_fraction()),
                battle.enemy.hp,
                battle.enemy.max_hp,
                view.enemy_display
            ),
        )?;

        let mut drum: Vec<&str> = round.buffer().as_slice().iter().map(|s| s.name()).collect();
        drum.resize(4, "....");
        self.line(6, Color::Yellow, format!("Combo: {:<3}  Drum: {}", round.combo(), drum.join(" ")))?;

        let color = match round.outcome() {
            Some(Outcome::Win) => Color::Green,
            Some(Outcome::Lose) => Color::Red,
            None => Color::White,
        };
        self.line(7, color, format!("> {}", round.feedback()))?;

        let command = match view.last_command {
            Some((command, combo)) => format!("Last command: {:?} (combo {})", command, combo),
            None => String::new(),
        };
        self.line(8, Color::Grey, command)?;

        let ambience = if view.victory_theme {
            "victory theme".to_string()
        } else if view.ducked {
            format!("{:.2} (ducked)", config.audio.ducked_volume)
        } else {
            format!("{:.2}", view.ambience)
        };
        let sound = view.last_sound.map(|s| s.name()).unwrap_or("-");
        self.line(10, Color::DarkGrey, format!("Ambience: {}   Drum sound: {}", ambience, sound))?;

        let help = if round.outcome().is_some() {
            "R = restart   Q/Esc = quit"
        } else {
            "A = PATA  D = PON  S = DON  W = CHAKA   Q/Esc = quit"
        };
        self.line(12, Color::DarkGrey, help.to_string())?;

        self.out.flush()?;
        Ok(())
    }

    fn line(&mut self, row: u16, color: Color, text: String) -> Result<()> {
        queue!(
            self.out,
            cursor::MoveTo(0, row),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(color),
            Print(text),
            ResetColor
        )?;
        Ok(())
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(self.out, ResetColor, cursor::Show, LeaveAlternateScreen);
    }
}

/// Field as a row of cells with H and E at their percentage positions
fn track(hero: f32, enemy: f32) -> String {
    let last = (TRACK_WIDTH - 1) as f32;
    let cell = |position: f32| ((position / 100.0) * last).round().clamp(0.0, last) as usize;
    let mut cells = vec!['.'; TRACK_WIDTH];
    cells[cell(hero)] = 'H';
    cells[cell(enemy)] = 'E';
    format!("[{}]", cells.into_iter().collect::<String>())
}

fn bar(fraction: f32) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
