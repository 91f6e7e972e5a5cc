//! ASCII battlefield renderer.
//!
//! Draws the ground plane top-down for quick terminal review: x runs
//! left to right, z top to bottom. The player's side is lowercase, the
//! enemy's uppercase.

use std::fmt::Write as _;
use std::io::Write;

use gambit_core::combatant::{Archetype, Kind, Side};
use gambit_core::events::{BattleObserver, CombatantView, TickEvents};

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Width of the ASCII viewport.
    pub width: usize,
    /// Height of the ASCII viewport.
    pub height: usize,
    /// World units from the midline to the left/right edge.
    pub half_extent_x: f64,
    /// World units from the centre line to the top/bottom edge.
    pub half_extent_z: f64,
    /// Mark fallen combatants with `x`.
    pub show_dead: bool,
    /// Show unit counts legend.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
    /// Draw one frame every this many ticks (the final tick is always drawn).
    pub every_n_ticks: u64,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            half_extent_x: 25.0,
            half_extent_z: 12.0,
            show_dead: false,
            show_legend: true,
            use_color: true,
            every_n_ticks: 20,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const BLUE: &str = "\x1b[34m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
}

fn unit_char(view: &CombatantView) -> char {
    let base = match (view.kind, view.archetype) {
        (Kind::General, _) => 'g',
        (Kind::Troop, Archetype::Melee) => 'm',
        (Kind::Troop, Archetype::Ranged) => 'r',
        (Kind::Troop, Archetype::Magic) => 'w',
        (Kind::Troop, Archetype::Defender) => 'd',
        (Kind::Troop, Archetype::Mounted) => 'h',
        (Kind::Troop, Archetype::Flying) => 'f',
        (Kind::Troop, Archetype::Insectoid) => 'i',
    };

    match view.side {
        Side::Player => base,
        Side::Enemy => base.to_ascii_uppercase(),
    }
}

fn side_color(side: Side) -> &'static str {
    match side {
        Side::Player => colors::BLUE,
        Side::Enemy => colors::RED,
    }
}

fn health_color(health: f64) -> &'static str {
    if health > 0.66 {
        colors::GREEN
    } else if health > 0.33 {
        colors::YELLOW
    } else {
        colors::RED
    }
}

/// Map a world coordinate onto `0..cells`, clamped to the border.
fn to_cell(coord: f64, half_extent: f64, cells: usize) -> usize {
    let max = cells.saturating_sub(1);
    let t = ((coord + half_extent) / (2.0 * half_extent)).clamp(0.0, 1.0);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let cell = (t * max as f64).round() as usize;
    cell.min(max)
}

/// Render one frame of the battlefield.
#[must_use]
pub fn render_ascii(tick: u64, views: &[CombatantView], config: &AsciiConfig) -> String {
    let width = config.width.max(10);
    let height = config.height.max(3);
    let mut grid: Vec<Vec<(char, String)>> = vec![vec![('.', String::new()); width]; height];

    // (alive, total) per side
    let mut counts = [(0u32, 0u32); 2];

    // Dead first so the living draw on top.
    let mut ordered: Vec<&CombatantView> = views.iter().collect();
    ordered.sort_by_key(|v| v.visible);

    for view in ordered {
        let slot = match view.side {
            Side::Player => 0,
            Side::Enemy => 1,
        };
        counts[slot].1 += 1;
        if view.visible {
            counts[slot].0 += 1;
        } else if !config.show_dead {
            continue;
        }

        let col = to_cell(view.position.x.to_num::<f64>(), config.half_extent_x, width);
        let row = to_cell(view.position.z.to_num::<f64>(), config.half_extent_z, height);

        let health = view.hp_fraction.to_num::<f64>();
        let (ch, color) = if view.visible {
            let color = if !config.use_color {
                String::new()
            } else if health < 1.0 {
                format!("{}{}", health_color(health), colors::BOLD)
            } else {
                side_color(view.side).to_string()
            };
            (unit_char(view), color)
        } else {
            let color = if config.use_color { colors::DIM.to_string() } else { String::new() };
            ('x', color)
        };
        grid[row][col] = (ch, color);
    }

    let mut output = String::new();
    let (bold, reset) = if config.use_color {
        (colors::BOLD, colors::RESET)
    } else {
        ("", "")
    };
    let _ = writeln!(output, "{bold}== Tick {tick} =={reset}");

    let border: String = "-".repeat(width);
    let _ = writeln!(output, "+{border}+");
    for row in &grid {
        output.push('|');
        for (ch, color) in row {
            if config.use_color && !color.is_empty() {
                output.push_str(color);
                output.push(*ch);
                output.push_str(colors::RESET);
            } else {
                output.push(*ch);
            }
        }
        output.push_str("|\n");
    }
    let _ = writeln!(output, "+{border}+");

    if config.show_legend {
        let _ = writeln!(
            output,
            "m=melee r=ranged w=magic d=defender h=mounted f=flying i=insectoid g=general \
             (lower=player UPPER=enemy)"
        );
        let _ = writeln!(
            output,
            "player {}/{} alive   enemy {}/{} alive",
            counts[0].0, counts[0].1, counts[1].0, counts[1].1
        );
    }

    output
}

/// Observer that writes a frame to `out` every few ticks.
#[derive(Debug)]
pub struct AsciiRenderer<W: Write> {
    config: AsciiConfig,
    out: W,
    frames: u64,
    failed: bool,
}

impl<W: Write> AsciiRenderer<W> {
    /// Renderer writing to `out`.
    pub fn new(config: AsciiConfig, out: W) -> Self {
        Self {
            config,
            out,
            frames: 0,
            failed: false,
        }
    }

    /// Frames written so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> BattleObserver for AsciiRenderer<W> {
    fn on_tick(&mut self, tick: u64, views: &[CombatantView], events: &TickEvents) {
        let every = self.config.every_n_ticks.max(1);
        if self.failed || (tick % every != 0 && events.outcome.is_none()) {
            return;
        }

        let frame = render_ascii(tick, views, &self.config);
        match self.out.write_all(frame.as_bytes()) {
            Ok(()) => self.frames += 1,
            Err(e) => {
                tracing::warn!(error = %e, "ASCII renderer output failed, disabling");
                self.failed = true;
            }
        }
    }
}
