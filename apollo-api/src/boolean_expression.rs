use std::ops::Not;

/// A condition on the boolean variables of an operation.
///
/// Generated parsers use these to decide whether a field guarded by
/// `@include` or `@skip` may be missing from a response.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BooleanExpression {
    /// Always true.
    True,
    /// Always false.
    False,
    /// The value of a boolean variable.
    Variable(String),
    /// The negation of an expression.
    Not(Box<BooleanExpression>),
    /// True when every operand is true.
    And(Vec<BooleanExpression>),
    /// True when at least one operand is true.
    Or(Vec<BooleanExpression>),
}

impl BooleanExpression {
    /// The value of the variable `name`.
    pub fn variable(name: impl Into<String>) -> Self {
        BooleanExpression::Variable(name.into())
    }

    /// The condition of `@include(if: $name)`.
    pub fn include(name: impl Into<String>) -> Self {
        Self::variable(name)
    }

    /// The condition of `@skip(if: $name)`: the field is present when the variable is false.
    pub fn skip(name: impl Into<String>) -> Self {
        !Self::variable(name)
    }

    /// Evaluate the expression, looking variables up with `lookup`.
    pub fn evaluate(&self, lookup: &impl Fn(&str) -> bool) -> bool {
        match self {
            BooleanExpression::True => true,
            BooleanExpression::False => false,
            BooleanExpression::Variable(name) => lookup(name),
            BooleanExpression::Not(operand) => !operand.evaluate(lookup),
            BooleanExpression::And(operands) => operands.iter().all(|e| e.evaluate(lookup)),
            BooleanExpression::Or(operands) => operands.iter().any(|e| e.evaluate(lookup)),
        }
    }
}

impl Not for BooleanExpression {
    type Output = BooleanExpression;

    fn not(self) -> Self::Output {
        match self {
            BooleanExpression::True => BooleanExpression::False,
            BooleanExpression::False => BooleanExpression::True,
            BooleanExpression::Not(operand) => *operand,
            other => BooleanExpression::Not(Box::new(other)),
        }
    }
}
