//! Parameter panel - effect controls adjusted with the arrow keys

use ivory::{
    dsp::oscillator::Waveform,
    engine::params::{filter_cutoff_hz, EffectsParameters},
    io::samples::SoundBank,
    Control,
};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const BAR_WIDTH: usize = 20;
/// Arrow presses from one end of a range to the other
const STEPS: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Master,
    Reverb,
    Delay,
    Distortion,
    Filter,
    Attack,
    Release,
}

impl Param {
    pub const ALL: [Param; 7] = [
        Param::Master,
        Param::Reverb,
        Param::Delay,
        Param::Distortion,
        Param::Filter,
        Param::Attack,
        Param::Release,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Param::Master => "Volume",
            Param::Reverb => "Reverb",
            Param::Delay => "Delay",
            Param::Distortion => "Distortion",
            Param::Filter => "Filter",
            Param::Attack => "Attack",
            Param::Release => "Release",
        }
    }

    pub fn range(self, max_delay_time: f32) -> (f32, f32) {
        match self {
            Param::Delay => (0.0, max_delay_time),
            Param::Attack => (
                *EffectsParameters::ATTACK_RANGE.start(),
                *EffectsParameters::ATTACK_RANGE.end(),
            ),
            Param::Release => (
                *EffectsParameters::RELEASE_RANGE.start(),
                *EffectsParameters::RELEASE_RANGE.end(),
            ),
            _ => (0.0, 1.0),
        }
    }

    pub fn get(self, params: &EffectsParameters) -> f32 {
        match self {
            Param::Master => params.master_volume,
            Param::Reverb => params.reverb_mix,
            Param::Delay => params.delay_time,
            Param::Distortion => params.distortion,
            Param::Filter => params.filter_cutoff,
            Param::Attack => params.attack,
            Param::Release => params.release,
        }
    }

    fn set(self, params: &mut EffectsParameters, value: f32) {
        match self {
            Param::Master => params.master_volume = value,
            Param::Reverb => params.reverb_mix = value,
            Param::Delay => params.delay_time = value,
            Param::Distortion => params.distortion = value,
            Param::Filter => params.filter_cutoff = value,
            Param::Attack => params.attack = value,
            Param::Release => params.release = value,
        }
    }

    pub fn control(self, value: f32) -> Control {
        match self {
            Param::Master => Control::MasterVolume(value),
            Param::Reverb => Control::ReverbMix(value),
            Param::Delay => Control::DelayTime(value),
            Param::Distortion => Control::Distortion(value),
            Param::Filter => Control::FilterCutoff(value),
            Param::Attack => Control::Attack(value),
            Param::Release => Control::Release(value),
        }
    }

    /// Move one step in `direction` (±1), update the local copy and return
    /// the command for the engine.
    pub fn nudge(self, params: &mut EffectsParameters, direction: f32, max_delay_time: f32) -> Control {
        let (lo, hi) = self.range(max_delay_time);
        let step = (hi - lo) / STEPS;
        let value = (self.get(params) + direction * step).clamp(lo, hi);
        self.set(params, value);
        self.control(value)
    }

    pub fn format(self, params: &EffectsParameters) -> String {
        let value = self.get(params);
        match self {
            Param::Filter => format!("{:.0} Hz", filter_cutoff_hz(value)),
            Param::Delay | Param::Attack | Param::Release => format!("{value:.2} s"),
            _ => format!("{value:.2}"),
        }
    }
}

pub struct PanelState<'a> {
    pub params: &'a EffectsParameters,
    pub selected: usize,
    pub max_delay_time: f32,
    pub waveform: Waveform,
    pub sound_bank: &'a SoundBank,
}

pub fn render_panel(frame: &mut Frame, area: Rect, state: &PanelState<'_>) {
    let block = Block::default().title(" Sound ").borders(Borders::ALL);

    let mut lines: Vec<Line> = Param::ALL
        .iter()
        .enumerate()
        .map(|(i, &param)| {
            let (lo, hi) = param.range(state.max_delay_time);
            let span = (hi - lo).max(f32::EPSILON);
            let fill = (((param.get(state.params) - lo) / span) * BAR_WIDTH as f32).round() as usize;
            let fill = fill.min(BAR_WIDTH);
            let bar = format!("{}{}", "█".repeat(fill), "·".repeat(BAR_WIDTH - fill));

            let selected = i == state.selected;
            let marker = if selected { "▶ " } else { "  " };
            let label_style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::styled(format!("{:<11}", param.label()), label_style),
                Span::styled(bar, Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("  {}", param.format(state.params)),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Waveform   ", Style::default().fg(Color::White)),
        Span::styled(state.waveform.to_string(), Style::default().fg(Color::Green)),
    ]));
    lines.push(Line::from(vec![
        Span::styled("  Sound      ", Style::default().fg(Color::White)),
        Span::styled(state.sound_bank.to_string(), Style::default().fg(Color::Green)),
    ]));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
