use chrono::{
  DateTime,
  NaiveDate,
  NaiveDateTime,
  Utc
};

const NAIVE_FORMATS: [&str; 4] = [
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%d %H:%M"
];

/// Accepts RFC 3339, the offset-less
/// forms a `datetime-local` input
/// produces (read as UTC), and a bare
/// date (midnight UTC).
pub fn parse_timestamp(
  raw: &str
) -> Option<DateTime<Utc>> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(trimmed)
  {
    return Some(dt.with_timezone(&Utc));
  }

  for format in NAIVE_FORMATS {
    if let Ok(ndt) =
      NaiveDateTime::parse_from_str(
        trimmed, format
      )
    {
      return Some(ndt.and_utc());
    }
  }

  NaiveDate::parse_from_str(
    trimmed, "%Y-%m-%d"
  )
  .ok()
  .and_then(|date| {
    date.and_hms_opt(0, 0, 0)
  })
  .map(|ndt| ndt.and_utc())
}

pub mod timestamp {
  use chrono::{
    DateTime,
    SecondsFormat,
    Utc
  };
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    dt: &Option<DateTime<Utc>>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match dt {
      | Some(value) => serializer
        .serialize_str(
          &value.to_rfc3339_opts(
            SecondsFormat::Secs,
            false
          )
        ),
      | None => serializer.serialize_none()
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<Option<DateTime<Utc>>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = Option::<String>::deserialize(
      deserializer
    )?;
    match raw.as_deref().map(str::trim) {
      | None | Some("") => Ok(None),
      | Some(value) => {
        super::parse_timestamp(value)
          .map(Some)
          .ok_or_else(|| {
            serde::de::Error::custom(
              format!(
                "invalid timestamp: \
                 {value}"
              )
            )
          })
      }
    }
  }
}

/// Label columns decode leniently: one
/// odd value from another client must
/// not fail a whole listing.
pub trait WireLabel: Sized {
  fn from_wire(raw: &str) -> Option<Self>;
}

/// Optional enumerated labels where the
/// store may hold `null` or `""` for
/// "not set".
pub mod label {
  use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer
  };
  use tracing::warn;

  use super::WireLabel;

  pub fn serialize<S, T>(
    value: &Option<T>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
    T: Serialize
  {
    match value {
      | Some(inner) => {
        inner.serialize(serializer)
      }
      | None => serializer.serialize_none()
    }
  }

  pub fn deserialize<'de, D, T>(
    deserializer: D
  ) -> Result<Option<T>, D::Error>
  where
    D: Deserializer<'de>,
    T: WireLabel
  {
    let raw = Option::<String>::deserialize(
      deserializer
    )?;
    let Some(raw) = raw else {
      return Ok(None);
    };
    if raw.trim().is_empty() {
      return Ok(None);
    }

    let label = T::from_wire(&raw);
    if label.is_none() {
      warn!(
        value = %raw,
        "unknown label in stored row, \
         treating as unset"
      );
    }
    Ok(label)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    TimeZone,
    Utc
  };

  use super::parse_timestamp;

  #[test]
  fn parses_datetime_local_input() {
    let expected = Utc
      .with_ymd_and_hms(
        2025, 8, 1, 18, 45, 0
      )
      .single()
      .expect("valid");
    assert_eq!(
      parse_timestamp("2025-08-01T18:45"),
      Some(expected)
    );
    assert_eq!(
      parse_timestamp(
        "2025-08-01T18:45:00.000"
      ),
      Some(expected)
    );
  }

  #[test]
  fn parses_offset_timestamps_into_utc() {
    let expected = Utc
      .with_ymd_and_hms(
        2025, 8, 1, 11, 45, 0
      )
      .single()
      .expect("valid");
    assert_eq!(
      parse_timestamp(
        "2025-08-01T18:45:00+07:00"
      ),
      Some(expected)
    );
  }

  #[test]
  fn bare_date_is_midnight_and_garbage_is_none()
  {
    let midnight = Utc
      .with_ymd_and_hms(
        2025, 8, 1, 0, 0, 0
      )
      .single()
      .expect("valid");
    assert_eq!(
      parse_timestamp("2025-08-01"),
      Some(midnight)
    );
    assert_eq!(parse_timestamp("soon"), None);
    assert_eq!(parse_timestamp("  "), None);
  }
}
