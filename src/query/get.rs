use super::body::Body;
use super::condition::Condition;

/// Options for a `get`, `first`, or `count` call.
#[derive(Clone, Debug, Default)]
pub struct GetQuery {
    keys: Vec<String>,
    condition: Option<Condition>,
    limit: Option<u32>,
    order_by: Option<String>,
}

impl GetQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests one record by key. May be called repeatedly; the service
    /// accepts comma-separated key lists on get.
    pub fn with_key(mut self, key: impl ToString) -> Self {
        self.keys.push(key.to_string());
        self
    }

    pub fn with_keys(mut self, keys: &[impl ToString]) -> Self {
        self.keys.extend(keys.iter().map(ToString::to_string));
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Caps the number of returned records.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// An SQL-style `ORDER BY` clause, e.g. `Date_Created DESC`.
    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub(crate) fn add_to_body(&self, body: &mut Body) {
        if !self.keys.is_empty() {
            body.push("key", self.keys.join(", "));
        }
        if let Some(condition) = &self.condition {
            body.push("condition", condition.clause());
        }
        if let Some(limit) = self.limit {
            body.push("limit", limit.to_string());
        }
        if let Some(order_by) = &self.order_by {
            body.push("orderBy", order_by.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(query: &GetQuery) -> String {
        let mut body = Body::new();
        query.add_to_body(&mut body);
        body.encode()
    }

    #[test]
    fn multiple_keys_join_into_one_comma_separated_value() {
        let query = GetQuery::new().with_keys(&[234, 235, 236]);
        assert_eq!(encoded(&query), "key=234%2C%20235%2C%20236");
    }

    #[test]
    fn a_single_key_stays_singular() {
        let query = GetQuery::new().with_key(234);
        assert_eq!(encoded(&query), "key=234");
    }

    #[test]
    fn limit_and_order_by_are_appended() {
        let query = GetQuery::new()
            .with_limit(5)
            .with_order_by("Date_Created DESC");
        assert_eq!(encoded(&query), "limit=5&orderBy=Date_Created%20DESC");
    }

    #[test]
    fn condition_renders_through_the_clause_form() {
        let query = GetQuery::new().with_condition(Condition::field("Group_Name", "Grannies"));
        assert_eq!(encoded(&query), "condition=Group_Name%3D%27Grannies%27");
    }
}
