//! Solver-agnostic mathematical program description.

use super::SolverError;

/// Handle to a variable of a [`Problem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in [`Problem::variables`].
    pub fn index(self) -> usize {
        self.0
    }
}

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Real-valued within its bounds.
    Continuous,
    /// 0 or 1.
    Binary,
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// Minimize the objective.
    Minimize,
    /// Maximize the objective.
    Maximize,
}

/// Relation between a linear expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `expr <= rhs`
    LessEq,
    /// `expr >= rhs`
    GreaterEq,
    /// `expr == rhs`
    Equal,
}

/// A decision variable with bounds, domain, and objective coefficient.
///
/// # Examples
///
/// ```
/// use u_cvrptw::lp::{Domain, Variable};
///
/// let v = Variable::binary("x_1_2").obj(4.5);
/// assert_eq!(v.domain(), Domain::Binary);
/// assert_eq!(v.upper(), 1.0);
/// assert_eq!(v.objective(), 4.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    lower: f64,
    upper: f64,
    domain: Domain,
    objective: f64,
}

impl Variable {
    /// Continuous variable on `[0, +inf)`.
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower: 0.0,
            upper: f64::INFINITY,
            domain: Domain::Continuous,
            objective: 0.0,
        }
    }

    /// Binary variable.
    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower: 0.0,
            upper: 1.0,
            domain: Domain::Binary,
            objective: 0.0,
        }
    }

    /// Sets both bounds.
    pub fn bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// Sets the objective coefficient.
    pub fn obj(mut self, coefficient: f64) -> Self {
        self.objective = coefficient;
        self
    }

    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower bound.
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper bound.
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Domain.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Objective coefficient.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Returns `true` for binary variables.
    pub fn is_integral(&self) -> bool {
        self.domain == Domain::Binary
    }
}

/// A linear constraint `Σ coef·var (relation) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    name: String,
    terms: Vec<(VarId, f64)>,
    relation: Relation,
    rhs: f64,
}

impl Constraint {
    /// Creates a constraint from its terms.
    pub fn new(
        name: impl Into<String>,
        terms: Vec<(VarId, f64)>,
        relation: Relation,
        rhs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            terms,
            relation,
            rhs,
        }
    }

    /// Constraint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Linear terms.
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// Relation.
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Right-hand side.
    pub fn rhs(&self) -> f64 {
        self.rhs
    }
}

/// A conditional constraint: `indicator = 1 ⇒ Σ terms >= rhs`.
///
/// Kept tagged until the backend lowers it, so every implication carries its
/// own `big_m`. The bound must be large enough that the linearized row
/// `Σ terms - M·indicator >= rhs - M` is slack whenever the indicator is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Implication {
    name: String,
    indicator: VarId,
    terms: Vec<(VarId, f64)>,
    rhs: f64,
    big_m: f64,
}

impl Implication {
    /// Creates an implication.
    pub fn new(
        name: impl Into<String>,
        indicator: VarId,
        terms: Vec<(VarId, f64)>,
        rhs: f64,
        big_m: f64,
    ) -> Self {
        Self {
            name: name.into(),
            indicator,
            terms,
            rhs,
            big_m,
        }
    }

    /// Implication name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binary variable activating the constraint.
    pub fn indicator(&self) -> VarId {
        self.indicator
    }

    /// The big-M bound used by the linearization.
    pub fn big_m(&self) -> f64 {
        self.big_m
    }

    /// Right-hand side of the implied constraint.
    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Terms of the implied constraint.
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// Lowers the implication to `Σ terms - M·indicator >= rhs - M`.
    pub fn linearize(&self) -> Constraint {
        let mut terms = self.terms.clone();
        terms.push((self.indicator, -self.big_m));
        Constraint::new(
            self.name.clone(),
            terms,
            Relation::GreaterEq,
            self.rhs - self.big_m,
        )
    }
}

/// Handle to a constraint of a [`Problem`]; indexes [`Solution::duals`](super::Solution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstrId(pub(crate) usize);

impl ConstrId {
    /// Position of the constraint in [`Problem::constraints`].
    pub fn index(self) -> usize {
        self.0
    }
}

/// A linear or mixed-integer program.
///
/// # Examples
///
/// ```
/// use u_cvrptw::lp::{Constraint, Problem, Relation, Sense, Variable};
///
/// let mut p = Problem::new("demo", Sense::Minimize);
/// let x = p.add_variable(Variable::continuous("x").obj(1.0));
/// let y = p.add_variable(Variable::continuous("y").obj(2.0));
/// p.add_constraint(Constraint::new("sum", vec![(x, 1.0), (y, 1.0)], Relation::GreaterEq, 3.0));
/// assert_eq!(p.num_variables(), 2);
/// assert!(!p.is_integral());
/// ```
#[derive(Debug, Clone)]
pub struct Problem {
    name: String,
    sense: Sense,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    implications: Vec<Implication>,
    objective_offset: f64,
}

impl Problem {
    /// Creates an empty problem.
    pub fn new(name: impl Into<String>, sense: Sense) -> Self {
        Self {
            name: name.into(),
            sense,
            variables: Vec::new(),
            constraints: Vec::new(),
            implications: Vec::new(),
            objective_offset: 0.0,
        }
    }

    /// Adds a variable and returns its handle.
    pub fn add_variable(&mut self, variable: Variable) -> VarId {
        self.variables.push(variable);
        VarId(self.variables.len() - 1)
    }

    /// Adds a linear constraint and returns its handle.
    pub fn add_constraint(&mut self, constraint: Constraint) -> ConstrId {
        self.constraints.push(constraint);
        ConstrId(self.constraints.len() - 1)
    }

    /// Adds a conditional constraint.
    pub fn add_implication(&mut self, implication: Implication) {
        self.implications.push(implication);
    }

    /// Adds a constant to the objective.
    pub fn set_objective_offset(&mut self, offset: f64) {
        self.objective_offset = offset;
    }

    /// Problem name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optimization direction.
    pub fn sense(&self) -> Sense {
        self.sense
    }

    /// Constant objective term.
    pub fn objective_offset(&self) -> f64 {
        self.objective_offset
    }

    /// All variables in insertion order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Variable by handle.
    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.0]
    }

    /// Linear constraints in insertion order (implications excluded).
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Conditional constraints.
    pub fn implications(&self) -> &[Implication] {
        &self.implications
    }

    /// Number of variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Returns `true` if any variable is binary.
    pub fn is_integral(&self) -> bool {
        self.variables.iter().any(Variable::is_integral)
    }

    /// Constraints followed by linearized implications.
    pub fn linear_rows(&self) -> Vec<Constraint> {
        self.constraints
            .iter()
            .cloned()
            .chain(self.implications.iter().map(Implication::linearize))
            .collect()
    }

    /// Objective value of a point, offset included.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective_offset
            + self
                .variables
                .iter()
                .zip(values)
                .map(|(v, x)| v.objective * x)
                .sum::<f64>()
    }

    /// Checks handles, bounds, and big-M values.
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.variables.len();
        for v in &self.variables {
            if !v.lower.is_finite() || v.upper.is_nan() || !v.objective.is_finite() {
                return Err(SolverError::Unsupported(format!(
                    "variable '{}' needs a finite lower bound and objective",
                    v.name
                )));
            }
        }
        let check_terms = |owner: &str, terms: &[(VarId, f64)]| {
            for (id, coef) in terms {
                if id.0 >= n || !coef.is_finite() {
                    return Err(SolverError::Unsupported(format!(
                        "'{owner}' references an unknown variable or non-finite coefficient"
                    )));
                }
            }
            Ok(())
        };
        for c in &self.constraints {
            check_terms(&c.name, &c.terms)?;
            if !c.rhs.is_finite() {
                return Err(SolverError::Unsupported(format!(
                    "constraint '{}' has a non-finite rhs",
                    c.name
                )));
            }
        }
        for imp in &self.implications {
            check_terms(&imp.name, &imp.terms)?;
            if imp.indicator.0 >= n || !self.variables[imp.indicator.0].is_integral() {
                return Err(SolverError::Unsupported(format!(
                    "implication '{}' needs an integral indicator",
                    imp.name
                )));
            }
            if !(imp.big_m >= 0.0 && imp.big_m.is_finite()) {
                return Err(SolverError::Unsupported(format!(
                    "implication '{}' has an invalid big-M",
                    imp.name
                )));
            }
        }
        Ok(())
    }
}
