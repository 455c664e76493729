use super::body::Body;

/// Field values, an optional identifying key, and link associations for a
/// `save`, `post`, or `put` call.
#[derive(Clone, Debug, Default)]
pub struct SaveRequest {
    key: Option<String>,
    fields: Vec<(String, Vec<String>)>,
    links: Vec<(String, Vec<String>)>,
}

impl SaveRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifies the record to update. Without a key (or another accepted
    /// identifier field) the service creates a new record.
    pub fn with_key(mut self, key: impl ToString) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Sets one field on the record.
    pub fn with_field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((name.into(), vec![value.to_string()]));
        self
    }

    /// Sets a multi-valued field; each value becomes its own form pair.
    pub fn with_field_values(mut self, name: impl Into<String>, values: &[impl ToString]) -> Self {
        self.fields
            .push((name.into(), values.iter().map(ToString::to_string).collect()));
        self
    }

    /// Links the saved record to an existing record in another table.
    pub fn with_link(mut self, table: impl Into<String>, key: impl ToString) -> Self {
        self.links.push((table.into(), vec![key.to_string()]));
        self
    }

    /// Links the saved record to several records in another table.
    pub fn with_links(mut self, table: impl Into<String>, keys: &[impl ToString]) -> Self {
        self.links
            .push((table.into(), keys.iter().map(ToString::to_string).collect()));
        self
    }

    /// True when the request carries an identifier the service accepts for
    /// updates: a key, a `<table>_KEY` field, or (supporter only) `Email`.
    pub(crate) fn has_identifier(&self, table: &str) -> bool {
        if self.key.is_some() {
            return true;
        }
        let table_key = format!("{}_KEY", table);
        self.fields
            .iter()
            .any(|(name, _)| *name == table_key || (table == "supporter" && name == "Email"))
    }

    /// Body order: link pairs, then multi-valued fields, then scalar fields,
    /// then the key.
    pub(crate) fn add_to_body(&self, body: &mut Body) {
        for (table, keys) in &self.links {
            for key in keys {
                body.push("link", table.clone());
                body.push("linkKey", key.clone());
            }
        }
        for (name, values) in self.fields.iter().filter(|(_, values)| values.len() > 1) {
            for value in values {
                body.push(name.clone(), value.clone());
            }
        }
        for (name, values) in self.fields.iter().filter(|(_, values)| values.len() == 1) {
            body.push(name.clone(), values[0].clone());
        }
        if let Some(key) = &self.key {
            body.push("key", key.clone());
        }
    }
}
