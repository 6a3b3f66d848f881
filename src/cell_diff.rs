use std::fmt;

use crate::value::{format_number, CellValue, ValueKind};

pub const SAME: &str = "Same";
pub const DIFFERENT: &str = "Different";

/// Result of comparing two values: a signed delta for numbers, a label otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Difference {
    Delta(f64),
    Same,
    Different,
}

/// Presentation class of a diff cell under a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffClass {
    Same,
    Different,
}

impl Difference {
    /// "same" for the `Same` label or a delta within `threshold` (inclusive).
    pub fn classify(&self, threshold: f64) -> DiffClass {
        match self {
            Difference::Same => DiffClass::Same,
            Difference::Delta(d) if d.abs() <= threshold => DiffClass::Same,
            _ => DiffClass::Different,
        }
    }

    pub fn is_different(&self, threshold: f64) -> bool {
        self.classify(threshold) == DiffClass::Different
    }

    pub fn to_cell(&self) -> CellValue {
        match self {
            Difference::Delta(d) => CellValue::Number(*d),
            Difference::Same => CellValue::Text(SAME.to_string()),
            Difference::Different => CellValue::Text(DIFFERENT.to_string()),
        }
    }

    fn from_equality(equal: bool) -> Self {
        if equal {
            Difference::Same
        } else {
            Difference::Different
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difference::Delta(d) => f.write_str(&format_number(*d)),
            Difference::Same => f.write_str(SAME),
            Difference::Different => f.write_str(DIFFERENT),
        }
    }
}

/// Compare two values: numbers subtract (`right - left`), dates compare exactly,
/// and everything else compares by text. The date branch applies only when both
/// sides read as dates on their own.
pub fn value_difference(left: &CellValue, right: &CellValue) -> Difference {
    match (left.kind(), right.kind()) {
        (ValueKind::Number, ValueKind::Number) => {
            if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
                return Difference::Delta(r - l);
            }
        }
        (ValueKind::Date, ValueKind::Date) => {
            if let (Some(l), Some(r)) = (left.as_datetime(), right.as_datetime()) {
                return Difference::from_equality(l == r);
            }
        }
        _ => {}
    }
    text_difference(left, right)
}

fn text_difference(left: &CellValue, right: &CellValue) -> Difference {
    match (left, right) {
        (CellValue::Empty, CellValue::Empty) => Difference::Same,
        (CellValue::Empty, _) | (_, CellValue::Empty) => Difference::Different,
        _ => Difference::from_equality(left.to_string() == right.to_string()),
    }
}
