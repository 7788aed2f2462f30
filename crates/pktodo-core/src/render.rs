use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Local, Utc};
use pktodo_shared::{Importance, TodoRecord};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::controller::AppState;
use crate::tabs::Tab;
use crate::view::Gate;

pub const APP_TITLE: &str = "PK Todo";

const HEADERS: [&str; 6] = ["ID", "", "Task", "Date", "Type", "Importance"];

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.view.color && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn render<W: Write>(
        &self,
        out: &mut W,
        state: &AppState,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        match state.gate() {
            Gate::Locked => self.render_gate(out),
            Gate::Unlocked => self.render_main(out, state, now),
        }
    }

    pub fn render_gate<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        writeln!(out, "Enter PIN")?;
        writeln!(out, "  unlock <pin>")?;
        Ok(())
    }

    pub fn render_incorrect_pin<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint("Incorrect PIN", "31"))?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(tab = %state.active_tab(), count = state.cache().len()))]
    pub fn render_main<W: Write>(
        &self,
        out: &mut W,
        state: &AppState,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let pending = state.pending_count();
        writeln!(out, "{APP_TITLE}  [home]")?;
        writeln!(out, "พีเค มี {pending} งานต้องทำนะ!")?;
        writeln!(out, "{}", self.tab_bar(state.active_tab()))?;
        writeln!(out)?;

        if state.active_tab() == Tab::Home {
            writeln!(out, "{pending} Tasks left")?;
            writeln!(out)?;
        }

        let records = state.cache().records();
        if records.is_empty() {
            writeln!(out, "{} ยังไม่มีข้อมูล", state.active_tab().label())?;
        } else {
            let rows: Vec<[Cell; 6]> = records.iter().map(|record| self.row(record, now)).collect();
            self.write_rows(out, &rows)?;
        }

        if state.form_visibility().is_visible() {
            let draft = state.draft();
            writeln!(out)?;
            writeln!(out, "-- new task --")?;
            writeln!(out, "text        {}", draft.text)?;
            writeln!(out, "due         {}", format_due(draft.due_at))?;
            writeln!(
                out,
                "type        {}",
                draft
                    .category
                    .as_ref()
                    .map(|category| category.to_string())
                    .unwrap_or_else(|| "Select Type".to_string())
            )?;
            writeln!(
                out,
                "importance  {}",
                draft
                    .importance
                    .map(|importance| importance.to_string())
                    .unwrap_or_else(|| "Select Importance".to_string())
            )?;
        }

        Ok(())
    }

    fn tab_bar(&self, active: Tab) -> String {
        Tab::BAR
            .iter()
            .map(|tab| {
                if *tab == active {
                    self.paint(&format!("[{}]", tab.short_name()), "36")
                } else {
                    format!(" {} ", tab.short_name())
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn row(&self, record: &TodoRecord, now: DateTime<Utc>) -> [Cell; 6] {
        let mark = if record.done { "[x]" } else { "[ ]" };
        let task = Cell::new(record.task.clone());
        let task = if record.done { task.color("9;90") } else { task };

        let due = format_due(record.due_at);
        let due = if record.is_overdue(now) {
            Cell::new(format!("{due} !")).color("31")
        } else {
            Cell::new(due)
        };

        let kind = record
            .category
            .as_ref()
            .map(|category| category.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        let importance = match record.importance {
            Some(importance) => Cell::new(importance.as_wire()).color(importance_color(importance)),
            None => Cell::new("N/A"),
        };

        [
            Cell::new(record.id.to_string()).color("33"),
            Cell::new(mark),
            task,
            due,
            Cell::new(kind),
            importance,
        ]
    }

    /// Columns are sized by display width so Thai text lines up; colour is
    /// added after padding.
    fn write_rows<W: Write>(&self, out: &mut W, rows: &[[Cell; 6]]) -> anyhow::Result<()> {
        let mut widths = HEADERS.map(|name| name.width());
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.width());
            }
        }

        let header: Vec<String> = HEADERS
            .iter()
            .zip(widths)
            .map(|(name, width)| pad(name, width))
            .collect();
        writeln!(out, "{}", header.join(" ").trim_end())?;
        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        writeln!(out, "{}", rule.join(" "))?;

        for row in rows {
            let line: Vec<String> = row
                .iter()
                .zip(widths)
                .map(|(cell, width)| {
                    let padded = pad(&cell.text, width);
                    match cell.color {
                        Some(code) => self.paint(&padded, code),
                        None => padded,
                    }
                })
                .collect();
            writeln!(out, "{}", line.join(" ").trim_end())?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn importance_color(importance: Importance) -> &'static str {
    match importance {
        Importance::High => "31",
        Importance::Medium => "33",
        Importance::Low => "32",
    }
}

fn format_due(due: Option<DateTime<Utc>>) -> String {
    due.map(|value| value.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

struct Cell {
    text: String,
    color: Option<&'static str>,
}

impl Cell {
    fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    fn color(mut self, code: &'static str) -> Self {
        self.color = Some(code);
        self
    }

    fn width(&self) -> usize {
        UnicodeWidthStr::width(self.text.as_str())
    }
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{text}{}", " ".repeat(fill))
}
