//! Assignment operators applied by operations

use crate::value::canonical;
use std::fmt;

/// How an operation combines its argument with the target's current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    /// Replace with the argument
    #[default]
    Assign,
    /// Add the argument
    Add,
    /// Subtract the argument
    Sub,
    /// Multiply by the argument
    Mul,
    /// Divide by the argument
    Div,
}

impl Operator {
    /// Parse the document spelling of an operator
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Operator::Assign),
            "+=" => Some(Operator::Add),
            "-=" => Some(Operator::Sub),
            "*=" => Some(Operator::Mul),
            "/=" => Some(Operator::Div),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Assign => "=",
            Operator::Add => "+=",
            Operator::Sub => "-=",
            Operator::Mul => "*=",
            Operator::Div => "/=",
        }
    }

    /// Apply to a numeric value.
    ///
    /// Returns `None` when the result is not a finite number, including
    /// division by zero. A zero result is always positive zero.
    pub fn apply(self, current: f64, operand: f64) -> Option<f64> {
        let result = match self {
            Operator::Assign => operand,
            Operator::Add => current + operand,
            Operator::Sub => current - operand,
            Operator::Mul => current * operand,
            Operator::Div => {
                if operand == 0.0 {
                    return None;
                }
                current / operand
            }
        };

        result.is_finite().then_some(canonical(result))
    }

    /// Apply to a non-numeric value, which only supports assignment
    pub fn assign<T>(self, current: &mut T, operand: T) -> bool {
        if self != Operator::Assign {
            return false;
        }
        *current = operand;
        true
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
