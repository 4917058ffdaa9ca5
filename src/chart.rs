//! # ASCII line chart
//! Plots one or more series as box-drawing line charts on a shared vertical
//! scale. The layout follows the classic `asciichart` look: a right-aligned
//! value label, an axis column, then one column per sample.

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};
use serde::{Deserialize, Serialize};

const LABEL_WIDTH: usize = 11;

const SYM_ZERO: char = '┼';
const SYM_AXIS: char = '┤';
const SYM_FLAT: char = '─';
const SYM_DOWN_IN: char = '╰';
const SYM_UP_IN: char = '╭';
const SYM_DOWN_OUT: char = '╮';
const SYM_UP_OUT: char = '╯';
const SYM_VERT: char = '│';

fn default_height() -> usize {
    18
}

fn default_colors() -> Vec<SeriesColor> {
    vec![SeriesColor::Blue, SeriesColor::Red]
}

/// Display color for one series. Unknown names fall back to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesColor {
    Blue,
    Red,
    Green,
    Yellow,
    Cyan,
    Magenta,
    White,
    #[serde(other)]
    Default,
}

impl SeriesColor {
    pub fn style(self) -> Style {
        match self {
            SeriesColor::Blue => Style::default().fg(Color::Blue),
            SeriesColor::Red => Style::default().fg(Color::Red),
            SeriesColor::Green => Style::default().fg(Color::Green),
            SeriesColor::Yellow => Style::default().fg(Color::Yellow),
            SeriesColor::Cyan => Style::default().fg(Color::Cyan),
            SeriesColor::Magenta => Style::default().fg(Color::Magenta),
            SeriesColor::White => Style::default().fg(Color::White),
            SeriesColor::Default => Style::default(),
        }
    }
}

/// Chart options: plot row count and the ordered per-series colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_colors")]
    pub colors: Vec<SeriesColor>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            height: default_height(),
            colors: default_colors(),
        }
    }
}

impl ChartConfig {
    /// Color for series `idx`, cycling through the configured list.
    pub fn color_for(&self, idx: usize) -> SeriesColor {
        if self.colors.is_empty() {
            SeriesColor::Default
        } else {
            self.colors[idx % self.colors.len()]
        }
    }
}

/// One glyph of the plot area, tagged with the series that drew it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub symbol: char,
    pub series: Option<usize>,
}

impl Cell {
    const BLANK: Cell = Cell {
        symbol: ' ',
        series: None,
    };
}

/// One chart row: the value label and the axis + data cells.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRow {
    pub label: String,
    pub cells: Vec<Cell>,
}

/// A rendered chart, top row first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plot {
    pub rows: Vec<PlotRow>,
}

impl Plot {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Uncolored text, one string per row.
    pub fn to_text_lines(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                let mut s = String::with_capacity(row.label.len() + 1 + row.cells.len());
                s.push_str(&row.label);
                s.push(' ');
                s.extend(row.cells.iter().map(|c| c.symbol));
                s
            })
            .collect()
    }

    /// Colored ratatui lines; consecutive cells of the same series share a span.
    pub fn to_lines(&self, cfg: &ChartConfig) -> Vec<Line<'static>> {
        self.rows
            .iter()
            .map(|row| {
                let mut spans = vec![Span::raw(format!("{} ", row.label))];
                let mut run = String::new();
                let mut run_series: Option<usize> = None;
                for cell in &row.cells {
                    if cell.series != run_series && !run.is_empty() {
                        spans.push(styled_run(std::mem::take(&mut run), run_series, cfg));
                    }
                    run_series = cell.series;
                    run.push(cell.symbol);
                }
                if !run.is_empty() {
                    spans.push(styled_run(run, run_series, cfg));
                }
                Line::from(spans)
            })
            .collect()
    }
}

fn styled_run(text: String, series: Option<usize>, cfg: &ChartConfig) -> Span<'static> {
    match series {
        Some(idx) => Span::styled(text, cfg.color_for(idx).style()),
        None => Span::raw(text),
    }
}

fn format_label(v: f64) -> String {
    format!("{:>width$.2}", v, width = LABEL_WIDTH)
}

/// Plot `series` on one shared scale. Returns an empty plot when every
/// series is empty.
pub fn plot(series: &[&[f64]], cfg: &ChartConfig) -> Plot {
    let mut all = series.iter().flat_map(|s| s.iter().copied());
    let Some(first) = all.next() else {
        return Plot::default();
    };
    let (min, max) = all.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let range = (max - min).abs();
    let height = cfg.height.max(1) as f64;
    let ratio = if range > 0.0 { height / range } else { 1.0 };
    let min2 = (min * ratio).round() as i64;
    let max2 = (max * ratio).round() as i64;
    let rows = (max2 - min2).unsigned_abs() as usize;

    // column 0 is the axis; a series of n samples draws n - 1 segments after it
    let width = series.iter().map(|s| s.len()).max().unwrap_or(0).max(1);

    let mut grid: Vec<PlotRow> = (0..=rows)
        .map(|r| {
            let value = if rows > 0 {
                max - r as f64 * range / rows as f64
            } else {
                min
            };
            let level = max2 - r as i64;
            let mut cells = vec![Cell::BLANK; width];
            cells[0].symbol = if level == 0 { SYM_ZERO } else { SYM_AXIS };
            PlotRow {
                label: format_label(value),
                cells,
            }
        })
        .collect();

    let to_row = |v: f64| -> usize {
        let scaled = (v * ratio).round() as i64 - min2;
        rows - (scaled.clamp(0, rows as i64) as usize)
    };

    for (idx, s) in series.iter().enumerate() {
        let Some(&head) = s.first() else { continue };
        let tagged = |symbol| Cell {
            symbol,
            series: Some(idx),
        };
        grid[to_row(head)].cells[0] = tagged(SYM_ZERO);

        for x in 0..s.len().saturating_sub(1) {
            let col = x + 1;
            let r0 = to_row(s[x]);
            let r1 = to_row(s[x + 1]);
            if r0 == r1 {
                grid[r0].cells[col] = tagged(SYM_FLAT);
                continue;
            }
            // rows grow downwards, so a larger row index is a smaller value
            let falling = r1 > r0;
            grid[r1].cells[col] = tagged(if falling { SYM_DOWN_IN } else { SYM_UP_IN });
            grid[r0].cells[col] = tagged(if falling { SYM_DOWN_OUT } else { SYM_UP_OUT });
            for row in grid.iter_mut().take(r0.max(r1)).skip(r0.min(r1) + 1) {
                row.cells[col] = tagged(SYM_VERT);
            }
        }
    }

    Plot { rows: grid }
}
