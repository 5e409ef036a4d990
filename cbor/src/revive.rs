/*!
Built-in protocol extensions. These run after any caller-supplied revivers
and replacers.

- Tag 0 carries an RFC 3339 date/time string, revived as [`Value::Date`].
- Tag 6 wrapping `null` is the server's NONE, revived as [`Value::Undefined`].
*/

use super::*;
use crate::constants::{TAG_DATETIME, TAG_NONE};
use time::format_description::well_known::Rfc3339;

const ISO_8601_MILLIS: &[time::format_description::BorrowedFormatItem<'static>] = time::macros::format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

pub(crate) fn revive_tagged(tagged: &Tagged) -> Result<Chained<Value>, Error> {
    match (tagged.tag, &tagged.value) {
        (TAG_DATETIME, Value::Text(s)) => Ok(time::OffsetDateTime::parse(s, &Rfc3339)
            .map(|date| Chained::Produced(Value::Date(date)))
            .unwrap_or(Chained::Pass)),
        (TAG_NONE, Value::Null) => Ok(Chained::Produced(Value::Undefined)),
        _ => Ok(Chained::Pass),
    }
}

pub(crate) fn replace(value: &Value) -> Result<Chained<Value>, Error> {
    match value {
        Value::Date(date) => Ok(Chained::Produced(Value::tagged(
            TAG_DATETIME,
            Value::Text(format_date(date)?),
        ))),
        _ => Ok(Chained::Pass),
    }
}

/// Formats as `YYYY-MM-DDTHH:MM:SS.sssZ`, normalised to UTC.
pub fn format_date(date: &time::OffsetDateTime) -> Result<String, Error> {
    date.to_offset(time::UtcOffset::UTC)
        .format(ISO_8601_MILLIS)
        .map_err(|e| Error::InvalidDate(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn epoch_format() {
        assert_eq!(
            format_date(&time::OffsetDateTime::UNIX_EPOCH).unwrap(),
            "1970-01-01T00:00:00.000Z"
        );
        let date = time::macros::datetime!(2013-03-21 20:04:00.25 +2);
        assert_eq!(format_date(&date).unwrap(), "2013-03-21T18:04:00.250Z");
    }

    #[test]
    fn unparsable_date_passes() {
        let tagged = Tagged {
            tag: TAG_DATETIME,
            value: Value::from("yesterday"),
        };
        assert_eq!(revive_tagged(&tagged).unwrap(), Chained::Pass);
    }

    #[test]
    fn none_needs_null() {
        let tagged = Tagged {
            tag: TAG_NONE,
            value: Value::Integer(0),
        };
        assert_eq!(revive_tagged(&tagged).unwrap(), Chained::Pass);
    }
}
