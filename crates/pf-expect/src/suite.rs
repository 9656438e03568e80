//! Expectation suites
//!
//! A suite is a JSON document listing declarative expectations:
//!
//! ```json
//! {
//!   "expectation_suite_name": "cleaned_suite",
//!   "expectations": [
//!     {"expectation_type": "expect_column_values_to_not_be_null",
//!      "kwargs": {"column": "price_usd"}, "meta": {}}
//!   ],
//!   "meta": {}
//! }
//! ```

use crate::error::{ExpectError, ExpectResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// An expectation as declared in a suite file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationConfig {
    pub expectation_type: String,

    #[serde(default)]
    pub kwargs: Map<String, Value>,

    #[serde(default)]
    pub meta: Map<String, Value>,
}

/// A named list of expectations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationSuite {
    pub expectation_suite_name: String,

    #[serde(default)]
    pub expectations: Vec<ExpectationConfig>,

    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl ExpectationSuite {
    /// Load a suite file and check every expectation is supported
    pub fn load(path: &Path) -> ExpectResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ExpectError::io(path, e))?;
        Self::from_json(&text).map_err(|e| match e {
            ExpectError::Json(json) => ExpectError::SuiteParse {
                path: path.display().to_string(),
                message: json.to_string(),
            },
            other => other,
        })
    }

    /// Parse and check a suite document
    pub fn from_json(text: &str) -> ExpectResult<Self> {
        let suite: ExpectationSuite = serde_json::from_str(text)?;
        suite.compile()?;
        Ok(suite)
    }

    /// Typed expectations, in declaration order
    pub fn compile(&self) -> ExpectResult<Vec<Expectation>> {
        self.expectations
            .iter()
            .map(|config| {
                Expectation::from_config(config).map_err(|e| match e {
                    ExpectError::UnknownExpectation {
                        expectation_type, ..
                    } => ExpectError::UnknownExpectation {
                        suite: self.expectation_suite_name.clone(),
                        expectation_type,
                    },
                    other => other,
                })
            })
            .collect()
    }
}

/// A supported expectation with its parsed kwargs
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    TableRowCountToBeBetween {
        min_value: Option<f64>,
        max_value: Option<f64>,
    },
    ColumnToExist {
        column: String,
    },
    ColumnValuesToNotBeNull {
        column: String,
        mostly: f64,
    },
    ColumnValuesToBeBetween {
        column: String,
        min_value: Option<f64>,
        max_value: Option<f64>,
        strict_min: bool,
        strict_max: bool,
        mostly: f64,
    },
    ColumnValuesToBeUnique {
        column: String,
        mostly: f64,
    },
    ColumnValuesToBeInSet {
        column: String,
        value_set: Vec<Value>,
        mostly: f64,
    },
    ColumnValuesToMatchRegex {
        column: String,
        regex: String,
        mostly: f64,
    },
    ColumnPairValuesAToBeGreaterThanB {
        column_a: String,
        column_b: String,
        or_equal: bool,
        mostly: f64,
    },
}

/// Typed access to an expectation's kwargs
struct Kwargs<'a> {
    expectation_type: &'a str,
    kwargs: &'a Map<String, Value>,
}

impl Kwargs<'_> {
    fn invalid(&self, message: String) -> ExpectError {
        ExpectError::InvalidKwargs {
            expectation_type: self.expectation_type.to_string(),
            message,
        }
    }

    fn string(&self, key: &str) -> ExpectResult<String> {
        match self.kwargs.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(_) => Err(self.invalid(format!("'{}' must be a non-empty string", key))),
            None => Err(self.invalid(format!("missing '{}'", key))),
        }
    }

    fn opt_number(&self, key: &str) -> ExpectResult<Option<f64>> {
        match self.kwargs.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| self.invalid(format!("'{}' must be finite", key))),
            Some(_) => Err(self.invalid(format!("'{}' must be a number", key))),
        }
    }

    fn flag(&self, key: &str) -> ExpectResult<bool> {
        match self.kwargs.get(key) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.invalid(format!("'{}' must be a boolean", key))),
        }
    }

    fn mostly(&self) -> ExpectResult<f64> {
        let mostly = self.opt_number("mostly")?.unwrap_or(1.0);
        if !(0.0..=1.0).contains(&mostly) {
            return Err(self.invalid(format!("'mostly' must be in [0, 1], got {}", mostly)));
        }
        Ok(mostly)
    }
}

impl Expectation {
    /// Parse a declared expectation
    pub fn from_config(config: &ExpectationConfig) -> ExpectResult<Self> {
        let k = Kwargs {
            expectation_type: &config.expectation_type,
            kwargs: &config.kwargs,
        };
        let expectation = match config.expectation_type.as_str() {
            "expect_table_row_count_to_be_between" => Expectation::TableRowCountToBeBetween {
                min_value: k.opt_number("min_value")?,
                max_value: k.opt_number("max_value")?,
            },
            "expect_column_to_exist" => Expectation::ColumnToExist {
                column: k.string("column")?,
            },
            "expect_column_values_to_not_be_null" => Expectation::ColumnValuesToNotBeNull {
                column: k.string("column")?,
                mostly: k.mostly()?,
            },
            "expect_column_values_to_be_between" => {
                let min_value = k.opt_number("min_value")?;
                let max_value = k.opt_number("max_value")?;
                if let (Some(lo), Some(hi)) = (min_value, max_value) {
                    if lo > hi {
                        return Err(k.invalid(format!(
                            "min_value {} is greater than max_value {}",
                            lo, hi
                        )));
                    }
                }
                Expectation::ColumnValuesToBeBetween {
                    column: k.string("column")?,
                    min_value,
                    max_value,
                    strict_min: k.flag("strict_min")?,
                    strict_max: k.flag("strict_max")?,
                    mostly: k.mostly()?,
                }
            }
            "expect_column_values_to_be_unique" => Expectation::ColumnValuesToBeUnique {
                column: k.string("column")?,
                mostly: k.mostly()?,
            },
            "expect_column_values_to_be_in_set" => {
                let value_set = match config.kwargs.get("value_set") {
                    Some(Value::Array(values)) => values.clone(),
                    _ => return Err(k.invalid("'value_set' must be a list".to_string())),
                };
                if let Some(bad) = value_set
                    .iter()
                    .find(|v| !matches!(v, Value::String(_) | Value::Number(_) | Value::Bool(_)))
                {
                    return Err(k.invalid(format!("unsupported value in value_set: {}", bad)));
                }
                Expectation::ColumnValuesToBeInSet {
                    column: k.string("column")?,
                    value_set,
                    mostly: k.mostly()?,
                }
            }
            "expect_column_values_to_match_regex" => {
                let regex = k.string("regex")?;
                regex::Regex::new(&regex)
                    .map_err(|e| k.invalid(format!("invalid regex: {}", e)))?;
                Expectation::ColumnValuesToMatchRegex {
                    column: k.string("column")?,
                    regex,
                    mostly: k.mostly()?,
                }
            }
            "expect_column_pair_values_a_to_be_greater_than_b" => {
                Expectation::ColumnPairValuesAToBeGreaterThanB {
                    column_a: k.string("column_A")?,
                    column_b: k.string("column_B")?,
                    or_equal: k.flag("or_equal")?,
                    mostly: k.mostly()?,
                }
            }
            other => {
                return Err(ExpectError::UnknownExpectation {
                    suite: String::new(),
                    expectation_type: other.to_string(),
                })
            }
        };
        Ok(expectation)
    }

    /// Columns the expectation reads
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Expectation::TableRowCountToBeBetween { .. } => Vec::new(),
            Expectation::ColumnToExist { column }
            | Expectation::ColumnValuesToNotBeNull { column, .. }
            | Expectation::ColumnValuesToBeBetween { column, .. }
            | Expectation::ColumnValuesToBeUnique { column, .. }
            | Expectation::ColumnValuesToBeInSet { column, .. }
            | Expectation::ColumnValuesToMatchRegex { column, .. } => vec![column.as_str()],
            Expectation::ColumnPairValuesAToBeGreaterThanB {
                column_a, column_b, ..
            } => vec![column_a.as_str(), column_b.as_str()],
        }
    }
}

#[cfg(test)]
#[path = "suite_test.rs"]
mod tests;
