//! Declarative rule evaluation shared by the override guard, the
//! consistency checker, the deterioration detector and the router.
//!
//! A rule is `{id, label, predicate, outcome}`. A `RuleSet` keeps rules in
//! declaration order; every evaluation mode walks them in that order, so
//! tie-breaks and report ordering are identical across components.

type Predicate<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;
type Outcome<C, T> = Box<dyn Fn(&C) -> T + Send + Sync>;

/// A guarded predicate over some context `C` producing an outcome `T`.
pub struct Rule<C: ?Sized, T = f64> {
    pub id: &'static str,
    pub label: String,
    predicate: Predicate<C>,
    outcome: Outcome<C, T>,
}

impl<C: ?Sized, T> Rule<C, T> {
    pub fn new(
        id: &'static str,
        label: impl Into<String>,
        predicate: impl Fn(&C) -> bool + Send + Sync + 'static,
        outcome: impl Fn(&C) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            predicate: Box::new(predicate),
            outcome: Box::new(outcome),
        }
    }

    pub fn matches(&self, ctx: &C) -> bool {
        (self.predicate)(ctx)
    }
}

impl<C: ?Sized> Rule<C, f64> {
    /// Rule contributing a constant weight when it matches.
    pub fn fixed(
        id: &'static str,
        label: impl Into<String>,
        weight: f64,
        predicate: impl Fn(&C) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::new(id, label, predicate, move |_| weight)
    }
}

/// A rule that matched, with the outcome it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub id: &'static str,
    pub label: String,
    pub value: T,
}

/// Ordered rule list.
pub struct RuleSet<C: ?Sized, T = f64> {
    rules: Vec<Rule<C, T>>,
}

impl<C: ?Sized, T> RuleSet<C, T> {
    pub fn new(rules: Vec<Rule<C, T>>) -> Self {
        Self { rules }
    }

    /// Evaluate every rule (no short-circuit) and return the matches in
    /// declaration order.
    pub fn evaluate(&self, ctx: &C) -> Vec<Fired<T>> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(ctx))
            .map(|rule| Fired {
                id: rule.id,
                label: rule.label.clone(),
                value: (rule.outcome)(ctx),
            })
            .collect()
    }

    /// First matching rule in declaration order.
    pub fn first(&self, ctx: &C) -> Option<Fired<T>> {
        self.rules.iter().find(|rule| rule.matches(ctx)).map(|rule| Fired {
            id: rule.id,
            label: rule.label.clone(),
            value: (rule.outcome)(ctx),
        })
    }
}

impl<C: ?Sized> RuleSet<C, f64> {
    /// Sum the contributions of every matching rule. Accumulates in
    /// floating point; callers clamp and round at their public boundary.
    pub fn score(&self, ctx: &C) -> Score {
        let hits = self.evaluate(ctx);
        let total = hits.iter().map(|h| h.value).sum();
        Score { hits, total }
    }
}

/// Accumulated result of a weighted rule set.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub hits: Vec<Fired<f64>>,
    pub total: f64,
}

/// Clamp into `[0, max]`. NaN collapses to 0.
pub fn clamp_score(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

/// Round a clamped 0..=100 score to the integer exposed publicly.
pub fn round_score(value: f64) -> u8 {
    clamp_score(value, 100.0).round() as u8
}

/// Round to a fixed number of decimals for display fields.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Stable sort by descending weight; equal weights keep declaration order.
pub fn sort_by_weight_desc(hits: &mut [Fired<f64>]) {
    hits.sort_by(|a, b| b.value.total_cmp(&a.value));
}
