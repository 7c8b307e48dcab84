//! Threshold comparison. Pure logic, no database access.

use rust_decimal::Decimal;

use crate::rule::RuleOperator;

/// Evaluate a metric value against a threshold under an operator code.
///
/// Codes are matched case-insensitively (`GT`, `gte`, ...). An unknown
/// code evaluates to `false`, never a breach: a rule row written with
/// an operator this build does not understand must not fire alerts.
///
/// `EQ` is exact decimal equality (no epsilon); `Decimal` compares
/// numerically, so `1.0 == 1.00`.
pub fn evaluate(operator_code: &str, value: Decimal, threshold: Decimal) -> bool {
    let Some(op) = RuleOperator::from_code(operator_code) else {
        return false;
    };
    evaluate_op(op, value, threshold)
}

/// Evaluate with an already-parsed operator.
pub fn evaluate_op(op: RuleOperator, value: Decimal, threshold: Decimal) -> bool {
    match op {
        RuleOperator::Gt => value > threshold,
        RuleOperator::Gte => value >= threshold,
        RuleOperator::Lt => value < threshold,
        RuleOperator::Lte => value <= threshold,
        RuleOperator::Eq => value == threshold,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
