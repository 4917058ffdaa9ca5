//! Dashboard state: both rolling series, the chart options and the last
//! frame drawn from them. No terminal is involved here, the TUI only paints
//! whatever [`Dashboard::frame`] currently holds.

use ratatui::text::{Line, Span};

use crate::chart::{plot, ChartConfig, Plot};
use crate::rolling::{DualSeries, SeriesId};

/// One drawn frame: the latest value of each series plus the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub bots_last: f64,
    pub humans_last: f64,
    pub plot: Plot,
}

impl Frame {
    pub fn summary_text(&self) -> String {
        format!(
            "{}: {} {}: {}",
            SeriesId::Bot.label(),
            self.bots_last,
            SeriesId::Human.label(),
            self.humans_last
        )
    }

    /// Summary with each series in its chart color.
    pub fn summary_line(&self, cfg: &ChartConfig) -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("{}: {}", SeriesId::Bot.label(), self.bots_last),
                cfg.color_for(0).style(),
            ),
            Span::raw(" "),
            Span::styled(
                format!("{}: {}", SeriesId::Human.label(), self.humans_last),
                cfg.color_for(1).style(),
            ),
        ])
    }

    /// Plain text of the whole frame, summary first.
    pub fn to_text(&self) -> String {
        let mut lines = vec![self.summary_text()];
        lines.extend(self.plot.to_text_lines());
        lines.join("\n")
    }

    pub fn to_lines(&self, cfg: &ChartConfig) -> Vec<Line<'static>> {
        let mut lines = vec![self.summary_line(cfg)];
        lines.extend(self.plot.to_lines(cfg));
        lines
    }
}

/// Owns the rolling buffers and the render target for the query loop.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    series: DualSeries,
    chart: ChartConfig,
    frame: Option<Frame>,
    renders: u64,
}

impl Dashboard {
    pub fn new(capacity: usize, chart: ChartConfig) -> Self {
        Self {
            series: DualSeries::with_capacity(capacity),
            chart,
            frame: None,
            renders: 0,
        }
    }

    pub fn push(&mut self, id: SeriesId, value: f64) {
        self.series.push(id, value);
    }

    /// Redraw the frame from the current series.
    ///
    /// Does nothing until both series hold a sample; the previous frame (or
    /// none) stays in place. Returns whether a new frame was drawn.
    pub fn render(&mut self) -> bool {
        let (Some(bots_last), Some(humans_last)) =
            (self.series.bots().last(), self.series.humans().last())
        else {
            return false;
        };

        let bots = self.series.bots().to_vec();
        let humans = self.series.humans().to_vec();
        let chart = plot(&[bots.as_slice(), humans.as_slice()], &self.chart);

        self.frame = Some(Frame {
            bots_last,
            humans_last,
            plot: chart,
        });
        self.renders += 1;
        true
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn series(&self) -> &DualSeries {
        &self.series
    }

    pub fn chart_config(&self) -> &ChartConfig {
        &self.chart
    }

    /// Number of frames drawn so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }
}
