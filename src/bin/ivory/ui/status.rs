//! Status bar - device, topology, sustain, voices, asset loading and levels

use ivory::Topology;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub struct Status {
    pub sample_rate: f32,
    pub topology: Topology,
    pub sustain: bool,
    pub voices: usize,
    pub octave: i32,
    /// (loaded, failed, total) samples
    pub assets: (usize, usize, usize),
}

pub fn render_status(frame: &mut Frame, area: Rect, status: &Status, stats: &AudioStats) {
    let block = Block::default().title(" ivory ").borders(Borders::ALL);

    let topology = match status.topology {
        Topology::Full => "full",
        Topology::Minimal => "minimal",
    };
    let (loaded, failed, total) = status.assets;
    let sustain_style = if status.sustain {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {:.1}kHz  ", status.sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!("{topology}  "), Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("Sustain {}  ", if status.sustain { "ON" } else { "off" }),
            sustain_style,
        ),
        Span::styled(
            format!("Voices {}  ", status.voices),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Octave {}  ", status.octave),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Samples {loaded}/{total} ({failed} missing)  "),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_square_wave() {
        let stats = AudioStats::from_buffer(&[0.5, -0.5, 0.5, -0.5]);
        assert_eq!(stats.peak, 0.5);
        assert!((stats.rms - 0.5).abs() < 1e-6);
        assert_eq!(AudioStats::from_buffer(&[]).peak, 0.0);
    }
}
