use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use pktodo_shared::Category;

use crate::gateway::ListQuery;

/// Views of the list. Every tab except `Home` scopes the cache to one
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Home,
    Activity,
    Idea,
    Learn,
    Fund,
}

impl Tab {
    /// Selected when the gate opens.
    pub const DEFAULT: Tab = Tab::Activity;

    /// Order of the bottom tab bar.
    pub const BAR: [Tab; 4] = [Tab::Activity, Tab::Idea, Tab::Learn, Tab::Fund];

    pub fn category(self) -> Option<Category> {
        match self {
            Tab::Home => None,
            Tab::Activity => Some(Category::Activity),
            Tab::Idea => Some(Category::Idea),
            Tab::Learn => Some(Category::Learn),
            Tab::Fund => Some(Category::Fund),
        }
    }

    pub fn query(self) -> ListQuery {
        ListQuery {
            category: self.category(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Activity => "กิจกรรม",
            Tab::Idea => "ไอเดีย",
            Tab::Learn => "เรียน",
            Tab::Fund => "ทุน",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Tab::Home => "home",
            Tab::Activity => "activity",
            Tab::Idea => "idea",
            Tab::Learn => "learn",
            Tab::Fund => "fund",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Tab {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        match raw.to_ascii_lowercase().as_str() {
            "" | "home" => return Ok(Tab::Home),
            "activity" => return Ok(Tab::Activity),
            "idea" => return Ok(Tab::Idea),
            "learn" => return Ok(Tab::Learn),
            "fund" => return Ok(Tab::Fund),
            _ => {}
        }

        let Ok(category) = raw.parse::<Category>();
        Tab::BAR
            .into_iter()
            .find(|tab| tab.category().as_ref() == Some(&category) || tab.label() == raw)
            .ok_or_else(|| anyhow!("unknown tab: {raw}"))
    }
}
