//! Statistic accumulators at the leaves of the aggregation tree.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde_json::json;

use crate::{
    ast::Expr,
    evaluator::{self, EvalError},
    path::Path,
    symbols::Scope,
    value::{Value, float_to_json},
};

/// How an uncertainty is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UncertaintyMethod {
    Normal,
    Poisson,
    Wilson,
    ClopperPearson,
    AgrestiCoull,
    FeldmanCousins,
    Jeffrey,
    BayesianUniform,
}

impl UncertaintyMethod {
    pub fn name(self) -> &'static str {
        match self {
            UncertaintyMethod::Normal => "normal",
            UncertaintyMethod::Poisson => "poisson",
            UncertaintyMethod::Wilson => "wilson",
            UncertaintyMethod::ClopperPearson => "clopper-pearson",
            UncertaintyMethod::AgrestiCoull => "agresti-coull",
            UncertaintyMethod::FeldmanCousins => "feldman-cousins",
            UncertaintyMethod::Jeffrey => "jeffrey",
            UncertaintyMethod::BayesianUniform => "bayesian-uniform",
        }
    }
}

impl FromStr for UncertaintyMethod {
    type Err = EvalError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "normal" => Ok(UncertaintyMethod::Normal),
            "poisson" => Ok(UncertaintyMethod::Poisson),
            "wilson" => Ok(UncertaintyMethod::Wilson),
            "clopper-pearson" => Ok(UncertaintyMethod::ClopperPearson),
            "agresti-coull" => Ok(UncertaintyMethod::AgrestiCoull),
            "feldman-cousins" => Ok(UncertaintyMethod::FeldmanCousins),
            "jeffrey" => Ok(UncertaintyMethod::Jeffrey),
            "bayesian-uniform" => Ok(UncertaintyMethod::BayesianUniform),
            other => Err(EvalError::type_error(format!(
                "unrecognized uncertainty method: '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for UncertaintyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn unsupported(method: UncertaintyMethod, statistic: &str) -> EvalError {
    EvalError::type_error(format!(
        "uncertainty method '{}' is not supported for {}",
        method, statistic
    ))
}

fn inapplicable(method: UncertaintyMethod, statistic: &str) -> EvalError {
    EvalError::type_error(format!(
        "uncertainty method '{}' does not apply to {}",
        method, statistic
    ))
}

/// Evaluate a collector's expression; anything but a number is an error.
fn sample(expression: &Expr, scope: &Scope) -> Result<f64, EvalError> {
    let value = evaluator::evaluate(expression, scope)?;
    value.as_number().ok_or_else(|| {
        EvalError::type_error(format!("expression returned a non-number: {}", value))
            .or_at(expression.span)
    })
}

/// Sum of weights.
#[derive(Debug, Clone)]
pub struct Count {
    pub name: Path,
    pub sumw: f64,
    pub sumw2: f64,
}

impl Count {
    pub fn new(name: Path) -> Self {
        Count {
            name,
            sumw: 0.0,
            sumw2: 0.0,
        }
    }

    pub fn fill(&mut self, weight: f64) {
        self.sumw += weight;
        self.sumw2 += weight * weight;
    }

    pub fn value(&self) -> f64 {
        self.sumw
    }

    pub fn variance(&self, method: UncertaintyMethod, sigmas: f64) -> Result<f64, EvalError> {
        match method {
            UncertaintyMethod::Normal => Ok(sigmas * sigmas * self.sumw2),
            UncertaintyMethod::Poisson => Err(unsupported(method, "count")),
            _ => Err(inapplicable(method, "count")),
        }
    }
}

/// Weighted sum of an expression.
#[derive(Debug, Clone)]
pub struct Sum {
    pub name: Path,
    pub expression: Rc<Expr>,
    pub sumwx: f64,
}

impl Sum {
    pub fn new(name: Path, expression: Rc<Expr>) -> Self {
        Sum {
            name,
            expression,
            sumwx: 0.0,
        }
    }

    pub fn fill(&mut self, scope: &Scope, weight: f64) -> Result<(), EvalError> {
        self.sumwx += weight * sample(&self.expression, scope)?;
        Ok(())
    }

    pub fn value(&self) -> f64 {
        self.sumwx
    }
}

/// Weighted mean of an expression and the uncertainty of that mean.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: Path,
    pub expression: Rc<Expr>,
    pub sumw: f64,
    pub sumw2: f64,
    pub sumwx: f64,
    pub sumwx2: f64,
}

impl Profile {
    pub fn new(name: Path, expression: Rc<Expr>) -> Self {
        Profile {
            name,
            expression,
            sumw: 0.0,
            sumw2: 0.0,
            sumwx: 0.0,
            sumwx2: 0.0,
        }
    }

    pub fn fill(&mut self, scope: &Scope, weight: f64) -> Result<(), EvalError> {
        let x = sample(&self.expression, scope)?;
        self.sumw += weight;
        self.sumw2 += weight * weight;
        self.sumwx += weight * x;
        self.sumwx2 += weight * x * x;
        Ok(())
    }

    pub fn value_or(&self, indeterminate: f64) -> f64 {
        if self.sumw == 0.0 {
            indeterminate
        } else {
            self.sumwx / self.sumw
        }
    }

    /// Variance of the mean, scaled by the effective number of entries
    /// `(Σw)² / Σw²`.
    pub fn variance(&self, method: UncertaintyMethod, sigmas: f64) -> Result<f64, EvalError> {
        if method != UncertaintyMethod::Normal {
            return Err(inapplicable(method, "profile"));
        }
        if self.sumw2 == 0.0 || self.sumw == 0.0 {
            return Ok(0.0);
        }
        let value = self.value_or(0.0);
        let effective_count = self.sumw * self.sumw / self.sumw2;
        Ok(sigmas * sigmas * (self.sumwx2 / self.sumw - value * value) / effective_count)
    }
}

/// Weighted fraction of entries passing a predicate.
#[derive(Debug, Clone)]
pub struct Fraction {
    pub name: Path,
    pub expression: Rc<Expr>,
    pub numerw: f64,
    pub denomw: f64,
}

impl Fraction {
    pub fn new(name: Path, expression: Rc<Expr>) -> Self {
        Fraction {
            name,
            expression,
            numerw: 0.0,
            denomw: 0.0,
        }
    }

    pub fn fill(&mut self, scope: &Scope, weight: f64) -> Result<(), EvalError> {
        match evaluator::evaluate(&self.expression, scope)? {
            Value::Boolean(passed) => {
                if passed {
                    self.numerw += weight;
                }
                self.denomw += weight;
                Ok(())
            }
            other => Err(EvalError::type_error(format!(
                "predicate returned a non-boolean: {}",
                other
            ))
            .or_at(self.expression.span)),
        }
    }

    pub fn value_or(&self, indeterminate: f64) -> f64 {
        if self.denomw == 0.0 {
            indeterminate
        } else {
            self.numerw / self.denomw
        }
    }

    /// The observed fraction, unless it is indeterminate.
    fn proportion(&self) -> Option<f64> {
        if self.denomw == 0.0 {
            return None;
        }
        let p = self.numerw / self.denomw;
        (0.0..=1.0).contains(&p).then_some(p)
    }

    /// Confidence interval `(low, high)` around the fraction.
    ///
    /// `normal` is symmetric about the observed fraction, `wilson` is the
    /// Wilson score interval. An indeterminate fraction (no weight, or
    /// weights that put it outside `[0, 1]`) gives `(0, 0)`.
    pub fn interval(&self, method: UncertaintyMethod, sigmas: f64) -> Result<(f64, f64), EvalError> {
        let n = self.denomw;
        let z = sigmas;
        let centered = |center: f64, half: f64| (center - half, center + half);
        match method {
            UncertaintyMethod::Normal => Ok(match self.proportion() {
                Some(p) => centered(p, z * (p * (1.0 - p) / n).sqrt()),
                None => (0.0, 0.0),
            }),
            UncertaintyMethod::Wilson => Ok(match self.proportion() {
                Some(p) => {
                    let scale = 1.0 + z * z / n;
                    let center = (p + 0.5 * z * z / n) / scale;
                    let half = z * (p * (1.0 - p) / n + 0.25 * z * z / (n * n)).sqrt() / scale;
                    centered(center, half)
                }
                None => (0.0, 0.0),
            }),
            UncertaintyMethod::ClopperPearson
            | UncertaintyMethod::AgrestiCoull
            | UncertaintyMethod::FeldmanCousins
            | UncertaintyMethod::Jeffrey
            | UncertaintyMethod::BayesianUniform => Err(unsupported(method, "fraction")),
            UncertaintyMethod::Poisson => Err(inapplicable(method, "fraction")),
        }
    }

    /// Square of the interval's half-width.
    pub fn variance(&self, method: UncertaintyMethod, sigmas: f64) -> Result<f64, EvalError> {
        let (low, high) = self.interval(method, sigmas)?;
        let half = 0.5 * (high - low);
        Ok(half * half)
    }
}

/// A statistic accumulator.
///
/// Every accumulator only ever adds weight; none can be un-filled.
#[derive(Debug, Clone)]
pub enum Storage {
    Count(Count),
    Sum(Sum),
    Profile(Profile),
    Fraction(Fraction),
}

impl Storage {
    pub fn name(&self) -> &Path {
        match self {
            Storage::Count(count) => &count.name,
            Storage::Sum(sum) => &sum.name,
            Storage::Profile(profile) => &profile.name,
            Storage::Fraction(fraction) => &fraction.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Storage::Count(_) => "count",
            Storage::Sum(_) => "sum",
            Storage::Profile(_) => "profile",
            Storage::Fraction(_) => "fraction",
        }
    }

    /// An empty accumulator of the same kind under a new name.
    pub fn zeros_like(&self, name: Path) -> Storage {
        match self {
            Storage::Count(_) => Storage::Count(Count::new(name)),
            Storage::Sum(sum) => Storage::Sum(Sum::new(name, sum.expression.clone())),
            Storage::Profile(profile) => {
                Storage::Profile(Profile::new(name, profile.expression.clone()))
            }
            Storage::Fraction(fraction) => {
                Storage::Fraction(Fraction::new(name, fraction.expression.clone()))
            }
        }
    }

    pub fn fill(&mut self, scope: &Scope, weight: f64) -> Result<(), EvalError> {
        match self {
            Storage::Count(count) => {
                count.fill(weight);
                Ok(())
            }
            Storage::Sum(sum) => sum.fill(scope, weight),
            Storage::Profile(profile) => profile.fill(scope, weight),
            Storage::Fraction(fraction) => fraction.fill(scope, weight),
        }
    }

    pub fn value(&self) -> f64 {
        self.value_or(0.0)
    }

    /// The statistic, or `indeterminate` when it has no defined value yet.
    pub fn value_or(&self, indeterminate: f64) -> f64 {
        match self {
            Storage::Count(count) => count.value(),
            Storage::Sum(sum) => sum.value(),
            Storage::Profile(profile) => profile.value_or(indeterminate),
            Storage::Fraction(fraction) => fraction.value_or(indeterminate),
        }
    }

    pub fn variance(&self, method: UncertaintyMethod, sigmas: f64) -> Result<f64, EvalError> {
        match self {
            Storage::Count(count) => count.variance(method, sigmas),
            Storage::Sum(_) => Err(EvalError::type_error(
                "sum has no uncertainty estimator",
            )),
            Storage::Profile(profile) => profile.variance(method, sigmas),
            Storage::Fraction(fraction) => fraction.variance(method, sigmas),
        }
    }

    pub fn error(&self, method: UncertaintyMethod, sigmas: f64) -> Result<f64, EvalError> {
        self.variance(method, sigmas).map(f64::sqrt)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let normal = |storage: &Storage| {
            storage
                .error(UncertaintyMethod::Normal, 1.0)
                .map(float_to_json)
                .unwrap_or(serde_json::Value::Null)
        };
        match self {
            Storage::Count(count) => json!({
                "count": float_to_json(count.sumw),
                "error": normal(self),
                "sumw2": float_to_json(count.sumw2),
            }),
            Storage::Sum(sum) => json!({
                "sum": float_to_json(sum.sumwx),
            }),
            Storage::Profile(profile) => json!({
                "profile": float_to_json(profile.value_or(0.0)),
                "error": normal(self),
                "sumw": float_to_json(profile.sumw),
                "sumw2": float_to_json(profile.sumw2),
            }),
            Storage::Fraction(fraction) => json!({
                "fraction": float_to_json(fraction.value_or(0.0)),
                "error": normal(self),
                "numerw": float_to_json(fraction.numerw),
                "denomw": float_to_json(fraction.denomw),
            }),
        }
    }
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = crate::path::format_path(self.name());
        match self.error(UncertaintyMethod::Normal, 1.0) {
            Ok(error) => write!(f, "<{} {}: {} +- {}>", self.kind(), name, self.value(), error),
            Err(_) => write!(f, "<{} {}: {}>", self.kind(), name, self.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fraction(numerw: f64, denomw: f64) -> Fraction {
        Fraction {
            name: Vec::new(),
            expression: Rc::new(Expr::identifier("x", Default::default())),
            numerw,
            denomw,
        }
    }

    #[test]
    fn test_count_variance_is_sum_of_squared_weights() {
        let mut count = Count::new(Vec::new());
        for w in [1.0, 2.0, 3.0] {
            count.fill(w);
        }
        assert_eq!(count.value(), 6.0);
        assert_eq!(count.variance(UncertaintyMethod::Normal, 1.0), Ok(14.0));
        assert_eq!(count.variance(UncertaintyMethod::Normal, 2.0), Ok(56.0));
        assert!(count.variance(UncertaintyMethod::Poisson, 1.0).is_err());
    }

    #[test]
    fn test_fraction_intervals() {
        let f = fraction(1.0, 4.0);
        let (low, high) = f.interval(UncertaintyMethod::Normal, 1.0).unwrap();
        assert!((0.5 * (high - low) - (0.25f64 * 0.75 / 4.0).sqrt()).abs() < 1e-12);

        let (low, high) = f.interval(UncertaintyMethod::Wilson, 1.0).unwrap();
        assert!((0.5 * (low + high) - 0.3).abs() < 1e-12);
        assert!((0.5 * (high - low) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_indeterminate_fraction() {
        let f = fraction(0.0, 0.0);
        assert_eq!(f.value_or(-1.0), -1.0);
        assert_eq!(f.interval(UncertaintyMethod::Wilson, 1.0), Ok((0.0, 0.0)));
        assert!(f.interval(UncertaintyMethod::ClopperPearson, 1.0).is_err());
    }

    #[test]
    fn test_method_names() {
        assert_eq!(
            "clopper-pearson".parse::<UncertaintyMethod>(),
            Ok(UncertaintyMethod::ClopperPearson)
        );
        assert!("bogus".parse::<UncertaintyMethod>().is_err());
    }
}
