//! FILENAME: core/engine/src/aggregate.rs
//! PURPOSE: Named reductions applied per period to the amounts a variable selects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VariableError;

/// Supported aggregate functions for variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    #[default]
    Sum,
    Average,
    Count,
    Min,
    Max,
    First,
    Last,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Average => "average",
            AggregateFunction::Count => "count",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::First => "first",
            AggregateFunction::Last => "last",
        }
    }

    /// Reduces the amounts of the matching rows, in their original order.
    /// A missing amount counts as zero. No rows always yields zero.
    pub fn reduce<I>(&self, amounts: I) -> f64
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut acc = Accumulator::default();
        for amount in amounts {
            acc.add(amount.unwrap_or(0.0));
        }
        acc.compute(*self)
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateFunction {
    type Err = VariableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(AggregateFunction::Sum),
            "average" => Ok(AggregateFunction::Average),
            "count" => Ok(AggregateFunction::Count),
            "min" => Ok(AggregateFunction::Min),
            "max" => Ok(AggregateFunction::Max),
            "first" => Ok(AggregateFunction::First),
            "last" => Ok(AggregateFunction::Last),
            other => Err(VariableError::UnknownAggregate(other.to_string())),
        }
    }
}

/// Running state for every aggregate at once.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    count: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
    first: Option<f64>,
    last: Option<f64>,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        if self.first.is_none() {
            self.first = Some(value);
        }
        self.last = Some(value);
    }

    fn compute(&self, function: AggregateFunction) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        match function {
            AggregateFunction::Sum => self.sum,
            AggregateFunction::Average => self.sum / self.count as f64,
            AggregateFunction::Count => self.count as f64,
            AggregateFunction::Min => self.min.unwrap_or(0.0),
            AggregateFunction::Max => self.max.unwrap_or(0.0),
            AggregateFunction::First => self.first.unwrap_or(0.0),
            AggregateFunction::Last => self.last.unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AggregateFunction; 7] = [
        AggregateFunction::Sum,
        AggregateFunction::Average,
        AggregateFunction::Count,
        AggregateFunction::Min,
        AggregateFunction::Max,
        AggregateFunction::First,
        AggregateFunction::Last,
    ];

    #[test]
    fn empty_input_is_zero_for_every_function() {
        for function in ALL {
            let result = function.reduce(std::iter::empty());
            assert_eq!(result, 0.0, "{} of nothing", function);
        }
    }

    #[test]
    fn reduces_in_original_order() {
        let amounts = [Some(5.0), Some(-2.0), Some(9.0), Some(4.0)];
        assert_eq!(AggregateFunction::Sum.reduce(amounts), 16.0);
        assert_eq!(AggregateFunction::Average.reduce(amounts), 4.0);
        assert_eq!(AggregateFunction::Count.reduce(amounts), 4.0);
        assert_eq!(AggregateFunction::Min.reduce(amounts), -2.0);
        assert_eq!(AggregateFunction::Max.reduce(amounts), 9.0);
        assert_eq!(AggregateFunction::First.reduce(amounts), 5.0);
        assert_eq!(AggregateFunction::Last.reduce(amounts), 4.0);
    }

    #[test]
    fn missing_amounts_count_as_zero() {
        let amounts = [Some(10.0), None];
        assert_eq!(AggregateFunction::Sum.reduce(amounts), 10.0);
        assert_eq!(AggregateFunction::Count.reduce(amounts), 2.0);
        assert_eq!(AggregateFunction::Last.reduce(amounts), 0.0);
    }

    #[test]
    fn parses_names() {
        for function in ALL {
            assert_eq!(function.as_str().parse::<AggregateFunction>().unwrap(), function);
        }
        assert_eq!(
            "median".parse::<AggregateFunction>().unwrap_err(),
            VariableError::UnknownAggregate("median".to_string())
        );
    }
}
