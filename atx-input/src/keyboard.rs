//! Modal keyboard input handling
//!
//! Normal mode drives the transport; Scrub mode is the gesture adapter
//! that synthesizes rotary angle samples and timeline flicks from key
//! presses; Equalizer mode selects and adjusts bands; Rename mode
//! accumulates a title.

use crossterm::event::{KeyCode, KeyEvent};

use crate::commands::{Band, Command, PresetId, ScrubMode};

/// Rotary degrees per scrub key press (shift for the coarse step)
const ROTARY_STEP_DEG: f32 = 15.0;
const ROTARY_STEP_COARSE_DEG: f32 = 45.0;

/// Timeline flick per scrub key press
const FLICK_DELTA: f64 = 0.05;
const FLICK_DELTA_COARSE: f64 = 0.15;
const FLICK_VELOCITY: f32 = 1.0;
const FLICK_VELOCITY_COARSE: f32 = 2.5;

/// Input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Scrub,
    Equalizer,
    Rename,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Scrub => "SCRUB",
            Mode::Equalizer => "EQ",
            Mode::Rename => "RENAME",
        }
    }
}

/// Wrap an angle into the (-180, 180] pointer convention
fn wrap_angle(mut angle: f32) -> f32 {
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Handles keyboard input and converts it to commands
pub struct InputHandler {
    mode: Mode,
    /// Virtual pointer angle while a rotary scrub is active
    scrub_angle: f32,
    scrub_mode: ScrubMode,
    /// Band the equalizer mode is focused on
    selected_band: Band,
    rename_buffer: String,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            scrub_angle: 0.0,
            scrub_mode: ScrubMode::Rotary,
            selected_band: Band::Bass,
            rename_buffer: String::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selected_band(&self) -> Band {
        self.selected_band
    }

    /// Rename text typed so far (for display)
    pub fn rename_buffer(&self) -> &str {
        &self.rename_buffer
    }

    /// Handle a key event and return a command if applicable
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        match self.mode {
            Mode::Normal => self.handle_normal(key),
            Mode::Scrub => self.handle_scrub(key),
            Mode::Equalizer => self.handle_equalizer(key),
            Mode::Rename => self.handle_rename(key),
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char(' ') => Some(Command::TogglePlayback),
            KeyCode::Char('z') => Some(Command::Stop),

            // Fine and coarse nudge
            KeyCode::Char('x') => Some(Command::Nudge(-1.0)),
            KeyCode::Char('c') => Some(Command::Nudge(1.0)),
            KeyCode::Left => Some(Command::Nudge(-5.0)),
            KeyCode::Right => Some(Command::Nudge(5.0)),

            // Playback rate
            KeyCode::Char('[') => Some(Command::AdjustRate(-0.1)),
            KeyCode::Char(']') => Some(Command::AdjustRate(0.1)),

            // Mode switching
            KeyCode::Char('s') => self.enter_scrub(ScrubMode::Rotary),
            KeyCode::Char('t') => self.enter_scrub(ScrubMode::Timeline),
            KeyCode::Char('e') => {
                self.mode = Mode::Equalizer;
                None
            }
            KeyCode::Char('r') => {
                self.mode = Mode::Rename;
                self.rename_buffer.clear();
                None
            }

            KeyCode::Char('q') => Some(Command::Quit),
            KeyCode::Esc => Some(Command::Cancel),
            _ => None,
        }
    }

    fn enter_scrub(&mut self, mode: ScrubMode) -> Option<Command> {
        self.mode = Mode::Scrub;
        self.scrub_mode = mode;
        self.scrub_angle = 0.0;
        Some(Command::BeginScrub(mode))
    }

    fn handle_scrub(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => self.scrub_step(false, false),
            KeyCode::Char('l') | KeyCode::Right => self.scrub_step(true, false),
            KeyCode::Char('H') => self.scrub_step(false, true),
            KeyCode::Char('L') => self.scrub_step(true, true),

            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                self.mode = Mode::Normal;
                Some(Command::EndScrub)
            }
            _ => None,
        }
    }

    /// One synthesized gesture sample in the active scrub mode
    fn scrub_step(&mut self, forward: bool, coarse: bool) -> Option<Command> {
        match self.scrub_mode {
            ScrubMode::Rotary => {
                let step = if coarse {
                    ROTARY_STEP_COARSE_DEG
                } else {
                    ROTARY_STEP_DEG
                };
                let signed = if forward { step } else { -step };
                self.scrub_angle = wrap_angle(self.scrub_angle + signed);
                Some(Command::ScrubAngle(self.scrub_angle))
            }
            ScrubMode::Timeline => {
                let (delta, velocity) = if coarse {
                    (FLICK_DELTA_COARSE, FLICK_VELOCITY_COARSE)
                } else {
                    (FLICK_DELTA, FLICK_VELOCITY)
                };
                Some(Command::ScrubFlick {
                    delta: if forward { delta } else { -delta },
                    velocity,
                })
            }
        }
    }

    fn handle_equalizer(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            // Band selection (internal state, surfaced via selected_band)
            KeyCode::Char('h') | KeyCode::Left => {
                self.select_band(-1);
                None
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.select_band(1);
                None
            }

            // Gain adjustment in band steps
            KeyCode::Char('k') | KeyCode::Up => {
                Some(Command::AdjustBand(self.selected_band, self.selected_band.step()))
            }
            KeyCode::Char('j') | KeyCode::Down => {
                Some(Command::AdjustBand(self.selected_band, -self.selected_band.step()))
            }
            KeyCode::Char('0') => Some(Command::SetBandGain(self.selected_band, 0.0)),

            // Presets on the number row
            KeyCode::Char(c @ '1'..='5') => {
                PresetId::from_slot(c as u8 - b'0').map(Command::ApplyPreset)
            }

            KeyCode::Char('f') => Some(Command::ResetEqualizer),
            KeyCode::Char('w') => Some(Command::SaveEqualizer),

            KeyCode::Esc | KeyCode::Char('q') => {
                self.mode = Mode::Normal;
                None
            }
            _ => None,
        }
    }

    fn select_band(&mut self, direction: i32) {
        let bands = Band::ALL;
        let current = bands
            .iter()
            .position(|b| *b == self.selected_band)
            .unwrap_or(0);
        let next = (current as i32 + direction).clamp(0, bands.len() as i32 - 1);
        self.selected_band = bands[next as usize];
    }

    fn handle_rename(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char(c) => {
                self.rename_buffer.push(c);
                None
            }
            KeyCode::Backspace => {
                self.rename_buffer.pop();
                None
            }
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                let title = std::mem::take(&mut self.rename_buffer);
                if title.is_empty() {
                    Some(Command::Cancel)
                } else {
                    Some(Command::Rename(title))
                }
            }
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.rename_buffer.clear();
                Some(Command::Cancel)
            }
            _ => None,
        }
    }
}
