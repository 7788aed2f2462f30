//! Line-oriented front end. Each line is one UI event; the screen is
//! redrawn after every event that can change it.

use std::io::Write;

use anyhow::{Context, anyhow, bail};
use chrono::Utc;
use pktodo_shared::wire::parse_timestamp;
use pktodo_shared::{Category, Importance};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::controller::Controller;
use crate::gateway::RemoteStore;
use crate::mutations::{Outcome, Rejection};
use crate::render::Renderer;
use crate::tabs::Tab;
use crate::view::UnlockResult;

const HELP: &str = "\
commands:
  unlock <pin>              open the gate
  tab <name>                activity | idea | learn | fund | home
  home                      show every task
  refresh                   refetch the current tab
  scroll <offset>           move the list; the form hides past the threshold
  text <words>              set the new task text
  due <when>|clear          set the deadline (2025-08-01T18:45)
  type <name>|clear         activity | idea | learn | fund
  importance <lvl>|clear    high | medium | low
  add [words]               submit the form
  toggle <id>               flip done
  delete <id>               remove a task
  show                      redraw
  quit
";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Unlock(String),
    Tab(Tab),
    Home,
    Refresh,
    Scroll(f64),
    Text(String),
    Due(Option<String>),
    Type(Option<Category>),
    Importance(Option<Importance>),
    Add(Option<String>),
    Toggle(i64),
    Delete(i64),
    Show,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match trimmed.split_once(' ') {
            Some((verb, rest)) => (verb, rest),
            None => (trimmed, ""),
        };
        let arg = rest.trim();

        let command = match verb {
            // The PIN is compared exactly, so keep its spacing.
            "unlock" => Command::Unlock(rest.to_string()),
            "tab" => Command::Tab(arg.parse()?),
            "home" => Command::Home,
            "refresh" => Command::Refresh,
            "scroll" => Command::Scroll(
                arg.parse()
                    .with_context(|| format!("invalid scroll offset: {arg}"))?,
            ),
            "text" => Command::Text(rest.to_string()),
            "due" => Command::Due(optional(arg).map(str::to_string)),
            "type" => Command::Type(optional(arg).map(parse_category).transpose()?),
            "importance" => Command::Importance(
                optional(arg)
                    .map(|value| value.parse::<Importance>())
                    .transpose()?,
            ),
            "add" => Command::Add((!arg.is_empty()).then(|| rest.to_string())),
            "toggle" => Command::Toggle(parse_id(arg)?),
            "delete" => Command::Delete(parse_id(arg)?),
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command: {other} (try `help`)"),
        };
        Ok(Some(command))
    }
}

fn optional(arg: &str) -> Option<&str> {
    match arg {
        "" | "clear" | "none" => None,
        value => Some(value),
    }
}

fn parse_category(raw: &str) -> anyhow::Result<Category> {
    let Ok(category) = raw.parse::<Category>();
    match category {
        Category::Other(other) => Err(anyhow!("unknown type: {other}")),
        known => Ok(known),
    }
}

fn parse_id(raw: &str) -> anyhow::Result<i64> {
    raw.parse().with_context(|| format!("invalid id: {raw:?}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<S> {
    controller: Controller<S>,
    renderer: Renderer,
}

impl<S: RemoteStore> Shell<S> {
    pub fn new(controller: Controller<S>, renderer: Renderer) -> Self {
        Self {
            controller,
            renderer,
        }
    }

    pub fn controller(&self) -> &Controller<S> {
        &self.controller
    }

    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        self.redraw(out)?;
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await.context("failed reading input")? {
            let command = match Command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    writeln!(out, "{err}")?;
                    continue;
                }
            };
            if self.execute(command, out).await? == Flow::Quit {
                break;
            }
        }
        info!("shell finished");
        Ok(())
    }

    #[tracing::instrument(skip(self, out))]
    pub async fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> anyhow::Result<Flow> {
        let outcome = match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => {
                write!(out, "{HELP}")?;
                return Ok(Flow::Continue);
            }
            Command::Show => None,
            Command::Unlock(pin) => {
                if self.controller.unlock(&pin).await == UnlockResult::IncorrectPin {
                    self.renderer.render_incorrect_pin(out)?;
                    return Ok(Flow::Continue);
                }
                None
            }
            Command::Tab(tab) => Some(self.controller.select_tab(tab).await),
            Command::Home => Some(self.controller.go_home().await),
            Command::Refresh => Some(self.controller.refresh().await),
            Command::Scroll(offset) => {
                self.controller.on_scroll(offset);
                None
            }
            Command::Text(text) => {
                self.controller.draft_mut().text = text;
                None
            }
            Command::Due(raw) => {
                let due = match raw {
                    Some(raw) => Some(
                        parse_timestamp(&raw).ok_or_else(|| anyhow!("invalid date: {raw}")),
                    )
                    .transpose(),
                    None => Ok(None),
                };
                match due {
                    Ok(due) => self.controller.draft_mut().due_at = due,
                    Err(err) => {
                        writeln!(out, "{err}")?;
                        return Ok(Flow::Continue);
                    }
                }
                None
            }
            Command::Type(category) => {
                self.controller.draft_mut().category = category;
                None
            }
            Command::Importance(importance) => {
                self.controller.draft_mut().importance = importance;
                None
            }
            Command::Add(text) => {
                if let Some(text) = text {
                    self.controller.draft_mut().text = text;
                }
                Some(self.controller.create().await)
            }
            Command::Toggle(id) => Some(self.controller.toggle(id).await),
            Command::Delete(id) => Some(self.controller.delete(id).await),
        };

        match outcome {
            Some(Outcome::Rejected(rejection @ Rejection::UnknownId(_))) => {
                writeln!(out, "{rejection}")?;
            }
            Some(Outcome::Rejected(Rejection::Locked)) => {
                writeln!(out, "{}", Rejection::Locked)?;
            }
            Some(other) => debug!(?other, "command settled"),
            None => {}
        }

        self.redraw(out)?;
        Ok(Flow::Continue)
    }

    fn redraw<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        writeln!(out)?;
        self.renderer.render(out, self.controller.state(), Utc::now())?;
        out.flush()?;
        Ok(())
    }
}
