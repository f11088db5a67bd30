//! TUI module for ivory
//!
//! Draws the keyboard, the sound panel and an oscilloscope, and turns mouse
//! and key events into engine commands.

mod keyboard;
mod panel;
mod scope;
mod status;

use std::{
    collections::BTreeSet,
    io::stdout,
    sync::Arc,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use ivory::{
    dsp::oscillator::Waveform,
    engine::params::EffectsParameters,
    input::{InputEvent, InputSource},
    io::samples::SoundBank,
    notes::MAX_OCTAVE,
    synth::Notification,
    Control, NoteKey, NoteName, Topology,
};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use tracing::warn;

use crate::loader::LoadProgress;

use keyboard::{render_keyboard, KeyboardGeometry};
use panel::{render_panel, PanelState, Param};
use scope::render_scope;
use status::{render_status, AudioStats, Status};

/// Scope window length
const SCOPE_LEN: usize = 1024;
/// How long a key sounds when the terminal cannot report key releases
const KEY_HOLD: Duration = Duration::from_millis(300);

/// Computer keys laid out like a piano: `a` is C, `w` is C#, up to `;`.
const NOTE_KEYS: [char; 17] = [
    'a', 'w', 's', 'e', 'd', 'f', 't', 'g', 'y', 'h', 'u', 'j', 'k', 'o', 'l', 'p', ';',
];

/// Startup values the UI mirrors.
pub struct UiInit {
    pub sample_rate: f32,
    pub topology: Topology,
    pub params: EffectsParameters,
    pub max_delay_time: f32,
    pub waveform: Waveform,
    pub sound_bank: SoundBank,
    pub bank_names: Vec<String>,
    pub base_octave: i32,
}

pub struct PianoApp {
    /// Commands to the audio thread
    control_tx: Producer<Control>,
    /// Note highlighting from the audio thread
    note_rx: Consumer<Notification>,
    /// Output samples for the scope
    scope_rx: Consumer<f32>,
    progress: Arc<LoadProgress>,

    sample_rate: f32,
    topology: Topology,
    max_delay_time: f32,
    bank_names: Vec<String>,

    params: EffectsParameters,
    waveform: Waveform,
    sound_bank: SoundBank,
    base_octave: i32,
    selected: usize,
    sustain: bool,

    lit: BTreeSet<NoteKey>,
    hovered: Option<NoteKey>,
    scope: Vec<f32>,
    geometry: KeyboardGeometry,

    /// Whether the terminal reports key releases
    key_releases: bool,
    /// Keys to release on a timer when it does not
    pending_releases: Vec<(InputSource, Instant)>,
    should_quit: bool,
}

impl PianoApp {
    pub fn new(
        init: UiInit,
        control_tx: Producer<Control>,
        note_rx: Consumer<Notification>,
        scope_rx: Consumer<f32>,
        progress: Arc<LoadProgress>,
    ) -> Self {
        Self {
            control_tx,
            note_rx,
            scope_rx,
            progress,
            sample_rate: init.sample_rate,
            topology: init.topology,
            max_delay_time: init.max_delay_time,
            bank_names: init.bank_names,
            params: init.params,
            waveform: init.waveform,
            sound_bank: init.sound_bank,
            base_octave: init.base_octave,
            selected: 0,
            sustain: false,
            lit: BTreeSet::new(),
            hovered: None,
            scope: vec![0.0; SCOPE_LEN],
            geometry: KeyboardGeometry::new(Default::default(), init.base_octave),
            key_releases: false,
            pending_releases: Vec::with_capacity(NOTE_KEYS.len()),
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        execute!(stdout(), EnableMouseCapture)?;
        self.key_releases = matches!(supports_keyboard_enhancement(), Ok(true));
        if self.key_releases {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let res = self.event_loop(terminal);

        if self.key_releases {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = execute!(stdout(), DisableMouseCapture);
        res
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_notifications();
            self.poll_scope();
            self.release_due_keys();

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }

        self.send(Control::AllStop);
        Ok(())
    }

    fn poll_notifications(&mut self) {
        while let Ok(note) = self.note_rx.pop() {
            match note {
                Notification::NoteOn(key) => {
                    self.lit.insert(key);
                }
                Notification::NoteOff(key) => {
                    self.lit.remove(&key);
                }
                Notification::NoteRetuned { from, to } => {
                    self.lit.remove(&from);
                    self.lit.insert(to);
                }
                Notification::Hovered(key) => self.hovered = key,
            }
        }
    }

    fn poll_scope(&mut self) {
        let mut fresh = false;
        while let Ok(sample) = self.scope_rx.pop() {
            self.scope.push(sample);
            fresh = true;
        }
        if fresh && self.scope.len() > SCOPE_LEN {
            let excess = self.scope.len() - SCOPE_LEN;
            self.scope.drain(0..excess);
        }
    }

    fn release_due_keys(&mut self) {
        let now = Instant::now();
        let mut i = 0;
        while i < self.pending_releases.len() {
            let (source, due) = self.pending_releases[i];
            if due <= now {
                self.pending_releases.swap_remove(i);
                self.send(Control::Input(InputEvent::Release { source }));
            } else {
                i += 1;
            }
        }
    }

    fn send(&mut self, control: Control) {
        if self.control_tx.push(control).is_err() {
            warn!("Control ring full, command dropped");
        }
    }

    fn note_for(&self, c: char) -> Option<NoteKey> {
        let semitones = NOTE_KEYS.iter().position(|&k| k == c)?;
        NoteKey::new(NoteName::C, self.base_octave)
            .ok()?
            .transpose(semitones as i32)
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.kind {
            KeyEventKind::Release => {
                self.handle_key_release(key.code);
                return;
            }
            KeyEventKind::Repeat => return,
            KeyEventKind::Press => {}
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => {
                let down = self.key_releases || !self.sustain;
                self.set_sustain(down);
            }
            KeyCode::Up => {
                self.selected = (self.selected + Param::ALL.len() - 1) % Param::ALL.len();
            }
            KeyCode::Down => self.selected = (self.selected + 1) % Param::ALL.len(),
            KeyCode::Left => self.nudge(-1.0),
            KeyCode::Right => self.nudge(1.0),
            KeyCode::Tab => self.next_waveform(),
            KeyCode::Char('b') => self.next_bank(),
            KeyCode::Char('z') => self.shift_octave(-1),
            KeyCode::Char('x') => self.shift_octave(1),
            KeyCode::Char(c) => self.press_note_key(c),
            _ => {}
        }
    }

    fn handle_key_release(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(' ') => self.set_sustain(false),
            KeyCode::Char(c) if NOTE_KEYS.contains(&c) => {
                self.send(Control::Input(InputEvent::Release {
                    source: InputSource::Key(c as u32),
                }));
            }
            _ => {}
        }
    }

    fn press_note_key(&mut self, c: char) {
        if !NOTE_KEYS.contains(&c) {
            return;
        }
        let source = InputSource::Key(c as u32);

        if !self.key_releases {
            // Auto-repeat extends the hold instead of restarting the note.
            let due = Instant::now() + KEY_HOLD;
            if let Some(entry) = self.pending_releases.iter_mut().find(|(s, _)| *s == source) {
                entry.1 = due;
                return;
            }
            self.pending_releases.push((source, due));
        }

        let key = self.note_for(c);
        self.send(Control::Input(InputEvent::Press { source, key }));
    }

    fn set_sustain(&mut self, down: bool) {
        if down == self.sustain {
            return;
        }
        self.sustain = down;
        let event = if down {
            InputEvent::SustainDown
        } else {
            InputEvent::SustainUp
        };
        self.send(Control::Input(event));
    }

    fn nudge(&mut self, direction: f32) {
        let param = Param::ALL[self.selected];
        let control = param.nudge(&mut self.params, direction, self.max_delay_time);
        self.send(control);
    }

    fn next_waveform(&mut self) {
        let index = Waveform::ALL
            .iter()
            .position(|&w| w == self.waveform)
            .unwrap_or(0);
        self.waveform = Waveform::ALL[(index + 1) % Waveform::ALL.len()];
        self.send(Control::Waveform(self.waveform));
    }

    fn next_bank(&mut self) {
        let next = match &self.sound_bank {
            SoundBank::Synth => self.bank_names.first().cloned(),
            SoundBank::Samples(current) => self
                .bank_names
                .iter()
                .position(|name| name == current)
                .and_then(|i| self.bank_names.get(i + 1))
                .cloned(),
        };
        self.sound_bank = next.map_or(SoundBank::Synth, SoundBank::Samples);
        self.send(Control::SoundBank(self.sound_bank.clone()));
    }

    fn shift_octave(&mut self, delta: i32) {
        self.base_octave = (self.base_octave + delta).clamp(0, MAX_OCTAVE as i32 - 1);
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let key = self.geometry.hit_test(mouse.column, mouse.row);
        let source = InputSource::Mouse;

        let event = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => InputEvent::Press { source, key },
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                InputEvent::Move { source, key }
            }
            MouseEventKind::Up(MouseButton::Left) => InputEvent::Release { source },
            _ => return,
        };
        self.send(Control::Input(event));
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        // Main layout: status, keyboard, panel + scope, help
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Status bar
                Constraint::Min(8),     // Keyboard
                Constraint::Length(12), // Panel and scope
                Constraint::Length(1),  // Help bar
            ])
            .split(area);

        let stats = AudioStats::from_buffer(&self.scope);
        let status = Status {
            sample_rate: self.sample_rate,
            topology: self.topology,
            sustain: self.sustain,
            voices: self.lit.len(),
            octave: self.base_octave,
            assets: self.progress.snapshot(),
        };
        render_status(frame, chunks[0], &status, &stats);

        let keyboard_block = Block::default().title(" Keys ").borders(Borders::ALL);
        let keyboard_inner = keyboard_block.inner(chunks[1]);
        frame.render_widget(keyboard_block, chunks[1]);
        self.geometry = KeyboardGeometry::new(keyboard_inner, self.base_octave);
        render_keyboard(frame, &self.geometry, &self.lit, self.hovered);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(52), Constraint::Min(20)])
            .split(chunks[2]);
        let panel = PanelState {
            params: &self.params,
            selected: self.selected,
            max_delay_time: self.max_delay_time,
            waveform: self.waveform,
            sound_bank: &self.sound_bank,
        };
        render_panel(frame, bottom[0], &panel);
        render_scope(frame, bottom[1], &self.scope);

        let sustain_hint = if self.key_releases {
            "hold"
        } else {
            "toggle"
        };
        let help = Paragraph::new(format!(
            " [A-;] Play  [Space] Sustain ({sustain_hint})  [Z/X] Octave  [↑↓←→] Sound  [Tab] Wave  [B] Bank  [Q] Quit"
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
