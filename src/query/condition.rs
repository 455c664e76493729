//! Filter clauses restricting which rows a get or count call returns.

/// A condition clause. Either a raw string passed through to the service
/// unchanged, or a set of field/value equalities rendered into the canonical
/// clause form: single-quoted terms joined with ` AND `.
///
/// The service only accepts `[0-9a-zA-Z_ .'"<>!=%+&@-]` in this field, so
/// values containing other characters will not match anything.
#[derive(Clone, Debug)]
pub enum Condition {
    /// A clause in the service's SQL-like dialect, sent as-is.
    Raw(String),
    /// Field/value equalities, rendered as quoted terms joined with `AND`.
    Fields(Vec<(String, String)>),
}

impl Condition {
    /// A raw clause, e.g. `Group_Name LIKE '%Grannies%'`.
    pub fn raw(clause: impl Into<String>) -> Self {
        Condition::Raw(clause.into())
    }

    /// A single field equality.
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        Condition::Fields(vec![(name.into(), value.into())])
    }

    /// Adds another equality, joined with `AND`.
    pub fn and(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        match self {
            Condition::Fields(mut fields) => {
                fields.push((name.into(), value.into()));
                Condition::Fields(fields)
            }
            Condition::Raw(clause) => {
                Condition::Raw(format!("{} AND {}", clause, term(&name.into(), &value.into())))
            }
        }
    }

    pub(crate) fn clause(&self) -> String {
        match self {
            Condition::Raw(clause) => clause.clone(),
            Condition::Fields(fields) => fields
                .iter()
                .map(|(name, value)| term(name, value))
                .collect::<Vec<_>>()
                .join(" AND "),
        }
    }
}

/// Single quotes inside the value are doubled so the term stays one quoted
/// literal.
fn term(name: &str, value: &str) -> String {
    format!("{}='{}'", name, value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_field_renders_as_a_quoted_term() {
        let clause = Condition::field("Group_Name", "Peaceful Warriors").clause();
        assert_eq!(clause, "Group_Name='Peaceful Warriors'");
    }

    #[test]
    fn multiple_fields_join_with_and_each_exactly_once() {
        let clause = Condition::field("First_Name", "Jesus")
            .and("Last_Name", "Murphy")
            .and("State", "NY")
            .clause();
        assert_eq!(
            clause,
            "First_Name='Jesus' AND Last_Name='Murphy' AND State='NY'"
        );
        assert_eq!(clause.matches("First_Name").count(), 1);
        assert_eq!(clause.matches(" AND ").count(), 2);
    }

    #[test]
    fn embedded_single_quote_stays_one_quoted_literal() {
        let clause = Condition::field("Last_Name", "O'Brien").clause();
        assert_eq!(clause, "Last_Name='O''Brien'");
        // an odd quote count would split the literal
        assert_eq!(clause.matches('\'').count() % 2, 0);
    }

    #[test]
    fn raw_clause_passes_through_unchanged() {
        let clause = Condition::raw("Group_Name LIKE '%Grannies%'").clause();
        assert_eq!(clause, "Group_Name LIKE '%Grannies%'");
    }

    #[test]
    fn and_on_a_raw_clause_appends_a_term() {
        let clause = Condition::raw("Email LIKE '%@example.org'")
            .and("State", "NY")
            .clause();
        assert_eq!(clause, "Email LIKE '%@example.org' AND State='NY'");
    }
}
