//! ASCII charts for the analytics view
//!
//! Daily histograms are drawn as one horizontal bar per day, splits as one
//! bar per part with its share of the whole. Everything is boxed and sized
//! to the terminal.

use colored::{Color, Colorize};
use dinedash_core::aggregation::{DailyHistogram, percentage};

/// Box drawing characters (ASCII)
const BOX_CORNER: &str = "+";
const BOX_HORIZONTAL: &str = "-";
const BOX_VERTICAL: &str = "|";

/// Bar characters (ASCII)
const BAR_FULL: &str = "#";
const BAR_EMPTY: &str = ".";

/// Width of the label column ("YYYY-MM-DD" or a split label)
const LABEL_WIDTH: usize = 14;

/// Room taken by everything on a bar line except the bar itself
const BAR_LINE_OVERHEAD: usize = LABEL_WIDTH + 20;

/// One slice of a split chart
#[derive(Debug, Clone, Copy)]
pub struct SplitPart<'a> {
    /// Legend label
    pub label: &'a str,
    /// Records in this part
    pub count: usize,
    /// Bar colour
    pub color: Color,
}

/// Draws boxed bar charts
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    width: usize,
    /// Whether to use colored output (respects NO_COLOR environment variable)
    colored_output: bool,
}

impl ChartRenderer {
    /// Size to the terminal, 60 to 120 columns
    pub fn new() -> Self {
        let raw_width = terminal_width().unwrap_or(100);
        let width = if raw_width < 60 {
            raw_width
        } else {
            raw_width.clamp(60, 120)
        };
        let colored_output = std::env::var("NO_COLOR").is_err();
        Self::with_width(width, colored_output)
    }

    /// Fixed width, mostly for tests
    pub fn with_width(width: usize, colored_output: bool) -> Self {
        Self {
            width: width.max(BAR_LINE_OVERHEAD + 10),
            colored_output,
        }
    }

    /// Records per day, in date order
    pub fn histogram(&self, title: &str, histogram: &DailyHistogram, unit: &str) -> String {
        let mut output = String::new();
        output.push_str(&self.draw_box_top());
        output.push_str(&self.draw_line(title));
        output.push_str(&self.draw_separator());

        if histogram.is_empty() {
            output.push_str(&self.draw_line(&format!("No {unit} in this period")));
        } else {
            let days = histogram.sorted();
            let max = days.iter().map(|d| d.count).max().unwrap_or(0);
            for day in &days {
                let bar = self.bar(percentage(day.count, max), Color::Cyan);
                let line = format!(
                    "{:<width$} {} {:>5}",
                    day.date.format("%Y-%m-%d"),
                    bar,
                    day.count,
                    width = LABEL_WIDTH
                );
                output.push_str(&self.draw_line(&line));
            }
        }

        if histogram.unbucketed > 0 {
            output.push_str(&self.draw_line(&format!(
                "{} {} without a readable date",
                histogram.unbucketed, unit
            )));
        }

        output.push_str(&self.draw_box_bottom());
        output
    }

    /// Share of each part in the sum of all parts
    pub fn split(&self, title: &str, parts: &[SplitPart<'_>]) -> String {
        let whole: usize = parts.iter().map(|p| p.count).sum();

        let mut output = String::new();
        output.push_str(&self.draw_box_top());
        output.push_str(&self.draw_line(title));
        output.push_str(&self.draw_separator());

        for part in parts {
            let share = percentage(part.count, whole);
            let line = format!(
                "{:<width$} {} {:>5} ({:>3}%)",
                console::truncate_str(part.label, LABEL_WIDTH, "..."),
                self.bar(share, part.color),
                part.count,
                share,
                width = LABEL_WIDTH
            );
            output.push_str(&self.draw_line(&line));
        }

        output.push_str(&self.draw_box_bottom());
        output
    }

    fn bar_width(&self) -> usize {
        self.width.saturating_sub(BAR_LINE_OVERHEAD)
    }

    fn bar(&self, percent: u32, color: Color) -> String {
        let width = self.bar_width();
        let filled = ((percent.min(100) as usize) * width / 100).min(width);
        let bar = format!(
            "[{}{}]",
            BAR_FULL.repeat(filled),
            BAR_EMPTY.repeat(width - filled)
        );
        if self.colored_output {
            bar.color(color).to_string()
        } else {
            bar
        }
    }

    fn draw_box_top(&self) -> String {
        format!(
            "{}{}{}\n",
            BOX_CORNER,
            BOX_HORIZONTAL.repeat(self.width - 2),
            BOX_CORNER
        )
    }

    fn draw_box_bottom(&self) -> String {
        self.draw_box_top()
    }

    fn draw_separator(&self) -> String {
        format!(
            "{}{}{}\n",
            BOX_VERTICAL,
            BOX_HORIZONTAL.repeat(self.width - 2),
            BOX_VERTICAL
        )
    }

    /// Pad or truncate a line to the box width
    fn draw_line(&self, content: &str) -> String {
        let available_width = self.width - 4;
        let truncated = console::truncate_str(content, available_width, "...");
        let padding = available_width.saturating_sub(console::measure_text_width(&truncated));
        format!(
            "{} {}{} {}\n",
            BOX_VERTICAL,
            truncated,
            " ".repeat(padding),
            BOX_VERTICAL
        )
    }
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn terminal_width() -> Option<usize> {
    terminal_size::terminal_size().map(|(terminal_size::Width(w), _)| w as usize)
}
