//! Streaming parser for the service's XML response dialect.
//!
//! Three response shapes exist: record lists (`<item>` elements under a
//! table container), table descriptions (`<field>` elements), and a scalar
//! row count carried as a `count` attribute on the table container. Mutating
//! calls answer with a `<success .../>` element instead.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::types::{ColumnDescription, Record};
use crate::Error;

/// Marker the service embeds in any response to rejected credentials.
pub(crate) const ERROR_MARKER: &str = "<error>Invalid login";

/// Marker a successful save or delete response carries.
pub(crate) const SUCCESS_MARKER: &str = "<success";

pub(crate) fn has_error(xml: &str) -> bool {
    xml.contains(ERROR_MARKER)
}

pub(crate) fn is_success(xml: &str) -> bool {
    xml.contains(SUCCESS_MARKER)
}

fn reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader
}

fn start_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn parse_err(e: impl std::fmt::Display) -> Error {
    Error::Parse(e.to_string())
}

/// Builds one [`Record`] per `<item>` element. Child text becomes field
/// values; a child holding `<key>` children becomes a single comma-joined
/// field (the `<table>_KEYS` linked-key form).
pub(crate) fn parse_records(xml: &str) -> Result<Vec<Record>, Error> {
    let mut reader = reader(xml);
    let mut records = Vec::new();
    let mut current: Option<Record> = None;
    // open leaf field: name and accumulated text
    let mut field: Option<(String, String)> = None;
    // open linked-key container: name and keys collected so far
    let mut keys: Option<(String, Vec<String>)> = None;
    let mut in_key_child = false;

    loop {
        match reader.read_event().map_err(parse_err)? {
            Event::Start(e) => {
                let name = start_name(&e);
                if current.is_none() {
                    if name == "item" {
                        current = Some(item_record(&e)?);
                    }
                } else if let Some((_, collected)) = &mut keys {
                    if name == "key" {
                        collected.push(String::new());
                        in_key_child = true;
                    }
                } else if let Some((open, _)) = &field {
                    // a <key> child retroactively marks the open field as a
                    // linked-key container
                    if name == "key" {
                        keys = Some((open.clone(), vec![String::new()]));
                        field = None;
                        in_key_child = true;
                    }
                } else {
                    field = Some((name, String::new()));
                }
            }
            Event::Empty(e) => {
                let name = start_name(&e);
                if current.is_none() {
                    if name == "item" {
                        records.push(item_record(&e)?.finish());
                    }
                } else if let Some((_, collected)) = &mut keys {
                    if name == "key" {
                        collected.push(String::new());
                    }
                } else if field.is_none() {
                    if let Some(record) = &mut current {
                        record.insert(name, "");
                    }
                }
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(parse_err)?;
                if in_key_child {
                    if let Some((_, collected)) = &mut keys {
                        if let Some(last) = collected.last_mut() {
                            last.push_str(&text);
                        }
                    }
                } else if let Some((_, value)) = &mut field {
                    value.push_str(&text);
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if in_key_child && name == "key" {
                    in_key_child = false;
                } else if keys.as_ref().is_some_and(|(open, _)| *open == name) {
                    if let (Some(record), Some((open, collected))) = (&mut current, keys.take()) {
                        record.insert(open, collected.join(","));
                    }
                } else if field.as_ref().is_some_and(|(open, _)| *open == name) {
                    if let (Some(record), Some((open, value))) = (&mut current, field.take()) {
                        record.insert(open, value);
                    }
                } else if name == "item" {
                    if let Some(record) = current.take() {
                        records.push(record.finish());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(records)
}

fn item_record(e: &BytesStart) -> Result<Record, Error> {
    let mut record = Record::default();
    for attr in e.attributes() {
        let attr = attr.map_err(parse_err)?;
        if attr.key.as_ref() == b"key" {
            let value = attr.unescape_value().map_err(parse_err)?;
            record.set_key(value.into_owned());
        }
    }
    Ok(record)
}

/// Extracts the row count from the `count` attribute of the first element
/// carrying one. An empty body counts as zero rows.
pub(crate) fn parse_count(xml: &str) -> Result<u64, Error> {
    if xml.trim().is_empty() {
        return Ok(0);
    }
    let mut reader = reader(xml);
    loop {
        match reader.read_event().map_err(parse_err)? {
            Event::Start(e) | Event::Empty(e) => {
                for attr in e.attributes() {
                    let attr = attr.map_err(parse_err)?;
                    if attr.key.as_ref() == b"count" {
                        let raw = attr.unescape_value().map_err(parse_err)?;
                        return raw
                            .trim()
                            .parse::<u64>()
                            .map_err(|e| Error::Parse(format!("bad count `{}`: {}", raw, e)));
                    }
                }
            }
            Event::Eof => return Err(Error::Parse("response contains no count".into())),
            _ => {}
        }
    }
}

/// Builds one [`ColumnDescription`] per `<field>` element. Attributes the
/// service omits stay `None`.
pub(crate) fn parse_description(xml: &str) -> Result<Vec<ColumnDescription>, Error> {
    let mut reader = reader(xml);
    let mut columns = Vec::new();
    let mut current: Option<ColumnDescription> = None;
    let mut open: Option<(String, String)> = None;

    loop {
        match reader.read_event().map_err(parse_err)? {
            Event::Start(e) => {
                let name = start_name(&e);
                if current.is_none() {
                    if name == "field" {
                        current = Some(ColumnDescription::default());
                    }
                } else if open.is_none() {
                    open = Some((name, String::new()));
                }
            }
            Event::Empty(e) => {
                let name = start_name(&e);
                if let Some(column) = &mut current {
                    if open.is_none() {
                        apply_column_attr(column, &name, String::new());
                    }
                }
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(parse_err)?;
                if let Some((_, value)) = &mut open {
                    value.push_str(&text);
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if open.as_ref().is_some_and(|(tag, _)| *tag == name) {
                    if let (Some(column), Some((tag, value))) = (&mut current, open.take()) {
                        apply_column_attr(column, &tag, value);
                    }
                } else if name == "field" {
                    if let Some(column) = current.take() {
                        columns.push(column);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(columns)
}

fn apply_column_attr(column: &mut ColumnDescription, tag: &str, value: String) {
    match tag {
        "Field" => column.field = value,
        "Type" => column.column_type = Some(value),
        "Null" => column.nullable = Some(value),
        "Key" => column.key_type = Some(value),
        "Default" => column.default_value = Some(value),
        "Extra" => column.extra = Some(value),
        _ => {}
    }
}

/// The `key` attribute of the `<success>` element a save response answers
/// with, when present.
pub(crate) fn success_key(xml: &str) -> Option<String> {
    let mut reader = reader(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"success" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"key" {
                            if let Ok(value) = attr.unescape_value() {
                                return Some(value.into_owned());
                            }
                        }
                    }
                    return None;
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPORTERS: &str = r#"<?xml version="1.0"?>
<data organization_KEY="962">
  <supporter count="11467">
    <item key="5879">
      <supporter_KEY>5879</supporter_KEY>
      <First_Name>test1</First_Name>
      <Last_Name/>
    </item>
    <item key="5880">
      <supporter_KEY>5880</supporter_KEY>
      <First_Name>test2</First_Name>
    </item>
  </supporter>
</data>"#;

    #[test]
    fn each_item_becomes_one_record() {
        let records = parse_records(SUPPORTERS).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("First_Name"), Some("test1"));
        assert_eq!(records[0].key(), Some("5879"));
        assert_eq!(records[1].key(), Some("5880"));
    }

    #[test]
    fn self_closing_children_become_empty_fields() {
        let records = parse_records(SUPPORTERS).unwrap();
        assert_eq!(records[0].get("Last_Name"), Some(""));
    }

    #[test]
    fn linked_key_containers_join_with_commas() {
        let xml = r#"<data><event count="1"><item key="12">
            <Event_Name>Salsa Lessons</Event_Name>
            <event$email_trigger_KEYS><key>0</key><key>436</key></event$email_trigger_KEYS>
        </item></event></data>"#;
        let records = parse_records(xml).unwrap();
        assert_eq!(records[0].get("event$email_trigger_KEYS"), Some("0,436"));
        assert_eq!(records[0].get("Event_Name"), Some("Salsa Lessons"));
    }

    #[test]
    fn key_child_without_attribute_still_keys_the_record() {
        let xml = "<data><groups count=\"1\"><item><key>234</key></item></groups></data>";
        let records = parse_records(xml).unwrap();
        assert_eq!(records[0].key(), Some("234"));
    }

    #[test]
    fn empty_body_parses_to_no_records() {
        assert!(parse_records("").unwrap().is_empty());
    }

    #[test]
    fn count_comes_from_the_container_attribute() {
        assert_eq!(parse_count(SUPPORTERS).unwrap(), 11467);
        assert_eq!(parse_count("").unwrap(), 0);
    }

    #[test]
    fn body_without_a_count_is_malformed() {
        let err = parse_count("<data><supporter/></data>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn description_columns_keep_only_present_attributes() {
        let xml = r#"<data><supporter>
          <field><Field>supporter_KEY</Field><Type>int(11)</Type><Null>NO</Null><Key>PRI</Key><Extra>auto_increment</Extra></field>
          <field><Field>First_Name</Field><Type>varchar(50)</Type><Null>YES</Null></field>
        </supporter></data>"#;
        let columns = parse_description(xml).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].field, "supporter_KEY");
        assert_eq!(columns[0].key_type.as_deref(), Some("PRI"));
        assert_eq!(columns[1].key_type, None);
        assert_eq!(columns[1].default_value, None);
    }

    #[test]
    fn success_key_is_read_from_the_success_element() {
        assert_eq!(
            success_key(r#"<success object="supporter" key="76544"/>"#).as_deref(),
            Some("76544")
        );
        assert_eq!(success_key("76544"), None);
    }

    #[test]
    fn markers_are_detected_verbatim() {
        assert!(has_error("<data><error>Invalid login. Try again.</error></data>"));
        assert!(!has_error("<data/>"));
        assert!(is_success(r#"<success object="groups" key="234"/>"#));
        assert!(!is_success(""));
    }
}
