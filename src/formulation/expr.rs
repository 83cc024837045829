// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Linear expressions over model variables.

use std::collections::BTreeMap;

use super::index::VarRef;
use crate::Error;

/// A linear expression over model variables.
///
/// The arithmetic operators keep expressions flat where possible, so that
/// `a + b + c` is stored as a single `Add` node and `-(a - b)` as `b - a`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Neg { param: Box<Expr> },
    Number { value: f64 },
    Variable { var: VarRef },
    Add { params: Vec<Expr> },
    Sub { params: Vec<Expr> },
    Scale { factor: f64, param: Box<Expr> },
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        match (self, rhs) {
            // -a + -b = -(a + b)
            (Self::Neg { param: lhs }, Self::Neg { param: rhs }) => -(*lhs + *rhs),
            // -a + b = b - a
            // a + -b = a - b
            (other, Self::Neg { param }) | (Self::Neg { param }, other) => other - *param,
            // (a + b) + (c + d) = a + b + c + d
            (Self::Add { params: mut lhs }, Self::Add { params: mut rhs }) => {
                lhs.append(&mut rhs);
                Self::Add { params: lhs }
            }
            // (a + b) + c = a + b + c
            (Self::Add { mut params }, rhs) => {
                params.push(rhs);
                Self::Add { params }
            }
            // a + (b + c) = a + b + c
            (lhs, Self::Add { mut params }) => {
                params.insert(0, lhs);
                Self::Add { params }
            }
            (lhs, rhs) => Self::Add {
                params: vec![lhs, rhs],
            },
        }
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        match (self, rhs) {
            // (a - b) - -c = a - b + c
            (sub @ Self::Sub { .. }, Self::Neg { param }) => sub + *param,
            // -a - (b - c) = c - b - a
            (Self::Neg { param }, sub @ Self::Sub { .. }) => -sub - *param,
            // (a - b) - c = a - b - c
            (Self::Sub { mut params }, rhs) => {
                params.push(rhs);
                Self::Sub { params }
            }
            // -a - -b = b - a
            (Self::Neg { param: lhs }, Self::Neg { param: rhs }) => Self::Sub {
                params: vec![*rhs, *lhs],
            },
            // -a - b = -(a + b)
            (Self::Neg { param }, value) => -(*param + value),
            // a - -b = a + b
            (lhs, Self::Neg { param }) => lhs + *param,
            (lhs, rhs) => Self::Sub {
                params: vec![lhs, rhs],
            },
        }
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self {
        match self {
            // -(-a) = a
            Expr::Neg { param: inner } => *inner,
            // -(a - b - c) = b + c - a
            Expr::Sub { mut params } => {
                let first = params.remove(0);
                match params.len() {
                    1 => params.remove(0) - first,
                    _ => Expr::Add { params } - first,
                }
            }
            Expr::Number { value } => Expr::Number { value: -value },
            _ => Expr::Neg {
                param: Box::new(self),
            },
        }
    }
}

impl std::ops::Mul<f64> for Expr {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        match self {
            Expr::Number { value } => Expr::Number {
                value: value * factor,
            },
            Expr::Scale { factor: inner, param } => Expr::Scale {
                factor: inner * factor,
                param,
            },
            Expr::Neg { param } => -(*param * factor),
            _ => Expr::Scale {
                factor,
                param: Box::new(self),
            },
        }
    }
}

impl From<VarRef> for Expr {
    fn from(var: VarRef) -> Self {
        Self::Variable { var }
    }
}

/// Constructors for `Expr`.
impl Expr {
    pub fn number(value: f64) -> Self {
        Self::Number { value }
    }

    pub fn variable(var: VarRef) -> Self {
        Self::Variable { var }
    }

    /// Returns the sum of the given expressions, or `0.0` if there are none.
    pub fn sum(exprs: impl IntoIterator<Item = Expr>) -> Self {
        exprs
            .into_iter()
            .reduce(|a, b| a + b)
            .unwrap_or(Self::number(0.0))
    }
}

/// The coefficients and constant of an expression in canonical linear form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearTerms {
    pub coefficients: BTreeMap<VarRef, f64>,
    pub constant: f64,
}

/// Evaluation.
impl Expr {
    /// Evaluates the expression for the given variable values.
    ///
    /// Returns an error if a referenced variable has no value.
    pub fn evaluate(&self, values: &BTreeMap<VarRef, f64>) -> Result<f64, Error> {
        match self {
            Self::Neg { param } => Ok(-param.evaluate(values)?),
            Self::Number { value } => Ok(*value),
            Self::Variable { var } => values
                .get(var)
                .copied()
                .ok_or_else(|| Error::not_found(format!("No value for variable {var}."))),
            Self::Add { params } => params
                .iter()
                .try_fold(0.0, |acc, p| Ok(acc + p.evaluate(values)?)),
            Self::Sub { params } => {
                let mut iter = params.iter();
                let first = match iter.next() {
                    Some(first) => first.evaluate(values)?,
                    None => 0.0,
                };
                iter.try_fold(first, |acc, p| Ok(acc - p.evaluate(values)?))
            }
            Self::Scale { factor, param } => Ok(factor * param.evaluate(values)?),
        }
    }

    /// Returns the expression in canonical linear form, merging repeated
    /// variables.
    pub fn linear_terms(&self) -> LinearTerms {
        let mut terms = LinearTerms::default();
        self.collect_terms(1.0, &mut terms);
        terms
    }

    fn collect_terms(&self, multiplier: f64, terms: &mut LinearTerms) {
        match self {
            Self::Neg { param } => param.collect_terms(-multiplier, terms),
            Self::Number { value } => terms.constant += multiplier * value,
            Self::Variable { var } => {
                *terms.coefficients.entry(var.clone()).or_insert(0.0) += multiplier;
            }
            Self::Add { params } => {
                for p in params {
                    p.collect_terms(multiplier, terms);
                }
            }
            Self::Sub { params } => {
                for (i, p) in params.iter().enumerate() {
                    p.collect_terms(if i == 0 { multiplier } else { -multiplier }, terms);
                }
            }
            Self::Scale { factor, param } => param.collect_terms(multiplier * factor, terms),
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.generate_string(false))
    }
}

/// Display helpers for `Expr`.
impl Expr {
    fn format_number(value: f64) -> String {
        if value.fract() == 0.0 {
            // For whole numbers, format with one decimal place.
            format!("{:.1}", value)
        } else {
            format!("{}", value)
        }
    }

    fn join_params(params: &[Expr], separator: &str, bracket_rest: bool, bracket_whole: bool) -> String {
        let mut result = String::new();
        for (i, expression) in params.iter().enumerate() {
            if i > 0 {
                result.push_str(separator);
            }
            result.push_str(&expression.generate_string(bracket_rest && i > 0));
        }
        if bracket_whole && params.len() > 1 {
            String::from("(") + &result + ")"
        } else {
            result
        }
    }

    fn generate_string(&self, bracket_whole: bool) -> String {
        match self {
            Self::Neg { param } => format!("-{}", param.generate_string(true)),
            Self::Number { value } => Self::format_number(*value),
            Self::Variable { var } => var.to_string(),
            Self::Add { params } => Self::join_params(params, " + ", false, bracket_whole),
            Self::Sub { params } => Self::join_params(params, " - ", true, bracket_whole),
            Self::Scale { factor, param } => {
                format!("{} * {}", Self::format_number(*factor), param.generate_string(true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Expr;
    use crate::formulation::{Index, VarRef};
    use std::collections::BTreeMap;

    #[track_caller]
    fn assert_expr(exprs: &[Expr], expected: &str) {
        for expr in exprs {
            assert_eq!(expr.to_string(), expected);
        }
    }

    fn var(n: u64) -> Expr {
        Expr::variable(VarRef::new("x", Index::Timepoint(n)))
    }

    #[test]
    fn test_arithmetic() {
        assert_expr(
            &[
                var(10) + var(11) + var(12) + var(13),
                var(10) - -var(11) + (var(12) + var(13)),
                (var(10) + var(11)) - -(var(12) - -var(13)),
            ],
            "x[10] + x[11] + x[12] + x[13]",
        );

        assert_expr(
            &[
                -(var(10) + var(11) + var(12)),
                -var(10) - var(11) - var(12),
                -var(10) - (var(11) + var(12)),
            ],
            "-(x[10] + x[11] + x[12])",
        );

        assert_expr(
            &[
                var(11) - var(10),
                var(11) + -var(10),
                -var(10) + var(11),
                -var(10) - -var(11),
                -(var(10) - var(11)),
            ],
            "x[11] - x[10]",
        );

        assert_expr(
            &[
                (var(11) + var(12)) - (var(10) + var(13)),
                -(var(10) + var(13)) + (var(11) + var(12)),
            ],
            "x[11] + x[12] - (x[10] + x[13])",
        );
    }

    #[test]
    fn test_scaling() {
        assert_expr(&[var(1) * 2.0, (var(1) * 4.0) * 0.5], "2.0 * x[1]");
        assert_expr(&[(var(1) + var(2)) * 1.5], "1.5 * (x[1] + x[2])");
        assert_expr(&[Expr::number(3.0) * 0.5, -Expr::number(-1.5)], "1.5");
        assert_expr(&[-var(1) * 2.0], "-2.0 * x[1]");
        assert_expr(&[Expr::sum([])], "0.0");
        assert_expr(&[Expr::sum([var(1), var(2) * 3.0])], "x[1] + 3.0 * x[2]");
    }

    #[test]
    fn test_evaluation() {
        let values = BTreeMap::from([
            (VarRef::new("x", Index::Timepoint(1)), 2.0),
            (VarRef::new("x", Index::Timepoint(2)), 5.0),
        ]);

        let expr = (var(1) + var(2)) * 3.0 - var(1) - Expr::number(1.0);
        assert_eq!(expr.evaluate(&values), Ok(21.0 - 2.0 - 1.0));

        assert_eq!(
            (var(3) + var(1)).evaluate(&values).unwrap_err().to_string(),
            "NotFound: No value for variable x[3]."
        );
    }

    #[test]
    fn test_linear_terms() {
        let expr = (var(1) + var(2)) * 3.0 - var(1) + Expr::number(4.0) - -(var(2) * 0.5);
        let terms = expr.linear_terms();

        assert_eq!(terms.constant, 4.0);
        assert_eq!(
            terms.coefficients,
            BTreeMap::from([
                (VarRef::new("x", Index::Timepoint(1)), 2.0),
                (VarRef::new("x", Index::Timepoint(2)), 3.5),
            ])
        );
    }
}
