//! ILP model assembly: variables, indicator linearizations, rewards.
//!
//! One `ModelBuilder` backs one maximization problem. It owns the variable
//! pot, records every constraint emitted during compilation, collects the
//! reward variables that form the objective, and hands out unique auxiliary
//! names from a per-invocation counter so that identical inputs always
//! produce the identical model.

use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};

/// Big-M constant for the indicator linearizations. Must exceed the largest
/// possible left-hand side; the population ceiling keeps sums far below it.
pub const BIG_M: f64 = 19_999.0;

/// Everything the driver needs to hand a compiled attempt to the backend.
pub struct CompiledProblem {
    /// The variable pot, consumed by `maximise(..).using(..)`.
    pub vars: ProblemVariables,
    /// Every constraint recorded during compilation.
    pub constraints: Vec<Constraint>,
    /// Sum of all reward variables.
    pub objective: Expression,
    /// Registered membership variables as `(name, variable)` pairs.
    pub memberships: Vec<(String, Variable)>,
    /// Diagnostic lines produced while compiling.
    pub logs: Vec<String>,
}

/// Builder state for one goal-set attempt.
pub struct ModelBuilder {
    vars: ProblemVariables,
    constraints: Vec<Constraint>,
    rewards: Vec<Variable>,
    memberships: Vec<(String, Variable)>,
    next_aux_id: u32,
    pub(crate) logs: Vec<String>,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder {
    /// A fresh, empty model with the auxiliary counter at 1.
    pub fn new() -> Self {
        ModelBuilder {
            vars: ProblemVariables::new(),
            constraints: Vec::new(),
            rewards: Vec::new(),
            memberships: Vec::new(),
            next_aux_id: 1,
            logs: Vec::new(),
        }
    }

    fn aux_name(&mut self, role: &str) -> String {
        let id = self.next_aux_id;
        self.next_aux_id += 1;
        format!("{}{}", role, id)
    }

    /// A fresh 0/1 variable with an explicit name.
    pub fn binary(&mut self, name: String) -> Variable {
        self.vars.add(variable().binary().name(name))
    }

    /// The membership variable for a (student, group) pair, name-encoded as
    /// `membership_<sid>_<gid>` so the assignment round-trips after solving.
    pub fn membership(&mut self, sid: u32, gid: u32) -> Variable {
        let name = format!("membership_{}_{}", sid, gid);
        let var = self.binary(name.clone());
        self.memberships.push((name, var));
        var
    }

    /// Record an arbitrary constraint.
    pub fn push_constraint(&mut self, c: Constraint) {
        self.constraints.push(c);
    }

    /// Indicator `b = 1 ⇔ expr ≥ k`.
    pub fn geq_indicator(&mut self, expr: Expression, k: f64) -> Variable {
        let name = self.aux_name("low");
        let b = self.binary(name);
        self.bind_geq(b, expr, k);
        b
    }

    /// Bind an existing 0/1 variable to `b = 1 ⇔ expr ≥ k`.
    pub fn bind_geq(&mut self, b: Variable, expr: Expression, k: f64) {
        // b*M <= expr - k + M  (forces b = 0 when expr < k)
        self.constraints
            .push(constraint!(b * BIG_M - expr.clone() <= BIG_M - k));
        // b*M >= expr - k + 1  (forces b = 1 when expr >= k)
        self.constraints
            .push(constraint!(b * BIG_M - expr >= 1.0 - k));
    }

    /// Indicator `b = 1 ⇔ expr ≤ k`.
    pub fn leq_indicator(&mut self, expr: Expression, k: f64) -> Variable {
        let name = self.aux_name("upp");
        let b = self.binary(name);
        self.bind_leq(b, expr, k);
        b
    }

    /// Bind an existing 0/1 variable to `b = 1 ⇔ expr ≤ k`.
    pub fn bind_leq(&mut self, b: Variable, expr: Expression, k: f64) {
        // b*M <= k - expr + M  (forces b = 0 when expr > k)
        self.constraints
            .push(constraint!(b * BIG_M + expr.clone() <= BIG_M + k));
        // b*M >= k - expr + 1  (forces b = 1 when expr <= k)
        self.constraints
            .push(constraint!(b * BIG_M + expr >= k + 1.0));
    }

    /// Indicator `c = 1 ⇔ a = b = 1`.
    pub fn and_indicator(&mut self, a: Variable, b: Variable) -> Variable {
        let name = self.aux_name("and");
        let c = self.binary(name);
        // 0 <= a + b - 2c <= 1
        self.constraints.push(constraint!(a + b - c * 2.0 >= 0.0));
        self.constraints.push(constraint!(a + b - c * 2.0 <= 1.0));
        c
    }

    /// Indicator `c = 1 ⇔ a = 1 or b = 1`.
    pub fn or_indicator(&mut self, a: Variable, b: Variable) -> Variable {
        let name = self.aux_name("or");
        let c = self.binary(name);
        self.constraints.push(constraint!(c <= a + b));
        self.constraints.push(constraint!(c * 2.0 >= a + b));
        c
    }

    /// Require that an indicator holds in every accepted solution.
    pub fn require_true(&mut self, v: Variable) {
        self.constraints.push(constraint!(v >= 1.0));
    }

    /// A reward term `r = reward · b`, appended to the objective. The
    /// variable is continuous and free so fractional and negative rewards
    /// stay feasible; the equality row pins it either way.
    pub fn reward_var(&mut self, b: Variable, reward: f64) -> Variable {
        let name = self.aux_name("reward");
        let r = self.vars.add(variable().name(name));
        self.constraints.push(constraint!(b * reward - r == 0.0));
        self.rewards.push(r);
        r
    }

    /// Sum the membership variables in `vars` into an expression.
    pub fn sum(vars: impl IntoIterator<Item = Variable>) -> Expression {
        let mut total = Expression::default();
        for v in vars {
            total += v;
        }
        total
    }

    /// Finish compilation and hand the pieces to the backend.
    pub fn finish(self) -> CompiledProblem {
        let objective = Self::sum(self.rewards.iter().copied());
        CompiledProblem {
            vars: self.vars,
            constraints: self.constraints,
            objective,
            memberships: self.memberships,
            logs: self.logs,
        }
    }
}
