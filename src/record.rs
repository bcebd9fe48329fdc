// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! [`Record`]: one row of a query result (section 3).

use std::sync::Arc;

use crate::value::Value;

/// One row of a query result: an ordered list of [`Value`]s, each named by
/// the field it corresponds to in the query's `RETURN` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Record {
    pub(crate) fn new(fields: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        Self { fields, values }
    }

    /// The field names, in the order the query's `RETURN` clause named them.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The values, in the same order as [`Record::fields`].
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Looks up a value by its 0-based position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Looks up a value by field name.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .position(|field| field == name)
            .and_then(|index| self.values.get(index))
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(String::as_str).zip(self.values.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        Record::new(
            Arc::new(vec!["a".to_string(), "b".to_string()]),
            vec![Value::Integer(1), Value::String("two".into())],
        )
    }

    #[test]
    fn looks_up_by_index_and_name() {
        let record = record();
        assert_eq!(record.get(0), Some(&Value::Integer(1)));
        assert_eq!(record.get_by_name("b"), Some(&Value::String("two".into())));
        assert_eq!(record.get_by_name("missing"), None);
        assert_eq!(record.get(5), None);
    }

    #[test]
    fn iterates_fields_paired_with_values() {
        let record = record();
        let pairs: Vec<_> = record.iter().collect();
        assert_eq!(pairs, vec![("a", &Value::Integer(1)), ("b", &Value::String("two".into()))]);
    }
}
