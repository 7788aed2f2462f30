use std::fmt;
use std::str::FromStr;

use chrono::{
  DateTime,
  Utc
};
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};

pub mod wire;

pub const CATEGORY_ACTIVITY: &str =
  "กิจกรรม";
pub const CATEGORY_IDEA: &str =
  "project-idea";
pub const CATEGORY_LEARN: &str = "เรียน";
pub const CATEGORY_FUND: &str = "ทุน";

/// Value of the `type` column. Rows
/// written by other clients may carry a
/// label outside the known set; those
/// are kept verbatim.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Hash,
)]
pub enum Category {
  Activity,
  Idea,
  Learn,
  Fund,
  Other(String)
}

impl Category {
  pub const KNOWN: [Category; 4] = [
    Category::Activity,
    Category::Idea,
    Category::Learn,
    Category::Fund
  ];

  pub fn as_wire(&self) -> &str {
    match self {
      | Category::Activity => {
        CATEGORY_ACTIVITY
      }
      | Category::Idea => CATEGORY_IDEA,
      | Category::Learn => CATEGORY_LEARN,
      | Category::Fund => CATEGORY_FUND,
      | Category::Other(raw) => raw
    }
  }

  /// Exact match on a stored label.
  /// Anything else, including other
  /// spellings, is kept as it came.
  pub fn from_wire(raw: &str) -> Self {
    match raw {
      | CATEGORY_ACTIVITY => {
        Category::Activity
      }
      | CATEGORY_IDEA => Category::Idea,
      | CATEGORY_LEARN => Category::Learn,
      | CATEGORY_FUND => Category::Fund,
      | other => {
        Category::Other(other.to_string())
      }
    }
  }
}

/// User input: wire labels plus the
/// English names, surrounding space
/// ignored.

impl FromStr for Category {
  type Err = std::convert::Infallible;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Ok(match s.trim() {
      | CATEGORY_ACTIVITY | "activity" => {
        Category::Activity
      }
      | CATEGORY_IDEA | "idea" => {
        Category::Idea
      }
      | CATEGORY_LEARN | "learn" => {
        Category::Learn
      }
      | CATEGORY_FUND | "fund" => {
        Category::Fund
      }
      | other => {
        Category::Other(other.to_string())
      }
    })
  }
}

impl fmt::Display for Category {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_wire())
  }
}

impl Serialize for Category {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(self.as_wire())
  }
}

impl<'de> Deserialize<'de> for Category {
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      String::deserialize(deserializer)?;
    Ok(Category::from_wire(&raw))
  }
}

impl wire::WireLabel for Category {
  fn from_wire(raw: &str) -> Option<Self> {
    Some(Category::from_wire(raw))
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
)]
pub enum Importance {
  High,
  Medium,
  Low
}

impl Importance {
  pub const ALL: [Importance; 3] = [
    Importance::High,
    Importance::Medium,
    Importance::Low
  ];

  pub fn as_wire(self) -> &'static str {
    match self {
      | Importance::High => "มาก",
      | Importance::Medium => "กลาง",
      | Importance::Low => "ต่ำ"
    }
  }

  pub fn from_wire(
    raw: &str
  ) -> Option<Self> {
    Importance::ALL
      .into_iter()
      .find(|level| level.as_wire() == raw)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownImportance(pub String);

impl fmt::Display for UnknownImportance {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "unknown importance: {}",
      self.0
    )
  }
}

impl std::error::Error
  for UnknownImportance
{
}

impl FromStr for Importance {
  type Err = UnknownImportance;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s.trim() {
      | "มาก" | "high" => Ok(Importance::High),
      | "กลาง" | "medium" | "med" => {
        Ok(Importance::Medium)
      }
      | "ต่ำ" | "low" => Ok(Importance::Low),
      | other => Err(UnknownImportance(
        other.to_string()
      ))
    }
  }
}

impl fmt::Display for Importance {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_wire())
  }
}

impl Serialize for Importance {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(self.as_wire())
  }
}

impl<'de> Deserialize<'de> for Importance {
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      String::deserialize(deserializer)?;
    Importance::from_wire(&raw).ok_or_else(
      || {
        serde::de::Error::custom(
          UnknownImportance(raw.clone())
        )
      }
    )
  }
}

impl wire::WireLabel for Importance {
  fn from_wire(raw: &str) -> Option<Self> {
    Importance::from_wire(raw)
  }
}

/// One row of the `todos` collection.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct TodoRecord {
  pub id:         i64,
  #[serde(default)]
  pub task:       String,
  #[serde(default)]
  pub done:       bool,
  #[serde(default, with = "wire::timestamp")]
  pub due_at:     Option<DateTime<Utc>>,
  #[serde(
    default,
    rename = "type",
    with = "wire::label"
  )]
  pub category:   Option<Category>,
  #[serde(default, with = "wire::label")]
  pub importance: Option<Importance>
}

impl TodoRecord {
  /// Open, has a deadline, and the
  /// deadline is strictly in the past.
  pub fn is_overdue(
    &self,
    now: DateTime<Utc>
  ) -> bool {
    !self.done
      && self
        .due_at
        .is_some_and(|due| due < now)
  }
}

/// Insert payload; the store assigns
/// `id`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct NewTodo {
  pub task:       String,
  pub done:       bool,
  #[serde(default, with = "wire::timestamp")]
  pub due_at:     Option<DateTime<Utc>>,
  #[serde(
    default,
    rename = "type",
    with = "wire::label"
  )]
  pub category:   Option<Category>,
  #[serde(default, with = "wire::label")]
  pub importance: Option<Importance>
}

impl NewTodo {
  pub fn into_record(
    self,
    id: i64
  ) -> TodoRecord {
    TodoRecord {
      id,
      task: self.task,
      done: self.done,
      due_at: self.due_at,
      category: self.category,
      importance: self.importance
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
  PartialEq,
)]
pub struct TodoPatch {
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub task: Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub done: Option<bool>
}

impl TodoPatch {
  pub fn done(done: bool) -> Self {
    Self {
      done: Some(done),
      ..Self::default()
    }
  }

  pub fn apply_to(
    &self,
    record: &mut TodoRecord
  ) {
    if let Some(task) = self.task.as_ref()
    {
      record.task = task.clone();
    }
    if let Some(done) = self.done {
      record.done = done;
    }
  }
}
