//! [`Solver`] backend over the `microlp` engine.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use microlp::{ComparisonOp, LinearExpr, OptimizationDirection};
use tracing::debug;

use super::{Constraint, Domain, Problem, Relation, Sense, Solution, SolveOptions, SolveStatus, Solver, SolverError, VarId};

const EMPTY_ROW_TOL: f64 = 1e-9;

/// Pure-Rust backend built on `microlp` (simplex with branch-and-bound for
/// binary variables).
///
/// Dual prices of a continuous problem are read from its dual program, which
/// requires every variable on `[0, +inf)`; other continuous problems are
/// solved without duals. A solve that outlives its time budget is abandoned
/// and reported as [`SolverError::TimedOut`].
///
/// # Examples
///
/// ```
/// use u_cvrptw::lp::{Constraint, MicroLpSolver, Problem, Relation, Sense, SolveOptions, Solver, Variable};
///
/// let mut p = Problem::new("cover", Sense::Minimize);
/// let x = p.add_variable(Variable::continuous("x").obj(2.0));
/// let c = p.add_constraint(Constraint::new("need", vec![(x, 1.0)], Relation::GreaterEq, 3.0));
/// let sol = MicroLpSolver.solve(&p, &SolveOptions::default()).unwrap();
/// assert!((sol.objective() - 6.0).abs() < 1e-9);
/// assert!((sol.dual(c).unwrap() - 2.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

impl Solver for MicroLpSolver {
    fn solve(&self, problem: &Problem, options: &SolveOptions) -> Result<Solution, SolverError> {
        problem.validate()?;
        let rows = problem.linear_rows();
        debug!(
            problem = problem.name(),
            variables = problem.num_variables(),
            rows = rows.len(),
            integral = problem.is_integral(),
            "solving"
        );

        let Some((program, vars)) = primal_program(problem, &rows) else {
            return Ok(Solution::infeasible());
        };
        let Some(solved) = run(program, options.time_limit, problem.name())? else {
            return Ok(Solution::infeasible());
        };
        let values: Vec<f64> = problem
            .variables()
            .iter()
            .zip(&vars)
            .map(|(variable, &var)| match variable.domain() {
                Domain::Binary => solved[var].round(),
                Domain::Continuous => solved[var],
            })
            .collect();
        let objective = problem.evaluate(&values);

        let duals = if problem.is_integral() {
            None
        } else {
            dual_prices(problem, options)?
        };
        Ok(Solution::new(SolveStatus::Optimal, objective, values, duals))
    }

    fn name(&self) -> &str {
        "microlp"
    }
}

fn direction(sense: Sense) -> OptimizationDirection {
    match sense {
        Sense::Minimize => OptimizationDirection::Minimize,
        Sense::Maximize => OptimizationDirection::Maximize,
    }
}

fn comparison(relation: Relation) -> ComparisonOp {
    match relation {
        Relation::LessEq => ComparisonOp::Le,
        Relation::GreaterEq => ComparisonOp::Ge,
        Relation::Equal => ComparisonOp::Eq,
    }
}

fn linear_expr(terms: impl IntoIterator<Item = (microlp::Variable, f64)>) -> LinearExpr {
    let mut expr = LinearExpr::empty();
    for (var, coef) in terms {
        expr.add(var, coef);
    }
    expr
}

/// `0 (relation) rhs` for a row without terms.
fn holds_empty(row: &Constraint) -> bool {
    match row.relation() {
        Relation::LessEq => row.rhs() >= -EMPTY_ROW_TOL,
        Relation::GreaterEq => row.rhs() <= EMPTY_ROW_TOL,
        Relation::Equal => row.rhs().abs() <= EMPTY_ROW_TOL,
    }
}

/// Translates the problem; `None` when an empty row already rules out every point.
fn primal_program(problem: &Problem, rows: &[Constraint]) -> Option<(microlp::Problem, Vec<microlp::Variable>)> {
    let mut program = microlp::Problem::new(direction(problem.sense()));
    let vars: Vec<microlp::Variable> = problem
        .variables()
        .iter()
        .map(|v| match v.domain() {
            Domain::Continuous => program.add_var(v.objective(), (v.lower(), v.upper())),
            Domain::Binary => {
                let lower = v.lower().max(0.0).ceil().min(1.0) as i32;
                let upper = v.upper().min(1.0).floor().max(0.0) as i32;
                program.add_integer_var(v.objective(), (lower, upper))
            }
        })
        .collect();

    for row in rows {
        if row.terms().is_empty() {
            if !holds_empty(row) {
                return None;
            }
            continue;
        }
        let expr = linear_expr(row.terms().iter().map(|&(id, coef): &(VarId, f64)| (vars[id.index()], coef)));
        program.add_constraint(expr, comparison(row.relation()), row.rhs());
    }
    Some((program, vars))
}

/// Runs `program`, on a worker thread when a budget is set. `None` means infeasible.
fn run(program: microlp::Problem, time_limit: Option<Duration>, name: &str) -> Result<Option<microlp::Solution>, SolverError> {
    let result = match time_limit {
        None => program.solve(),
        Some(limit) => {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let _ = tx.send(program.solve());
            });
            match rx.recv_timeout(limit) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => return Err(SolverError::TimedOut(name.to_string())),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SolverError::Backend(format!("worker solving '{name}' exited without a result")))
                }
            }
        }
    };
    match result {
        Ok(solution) => Ok(Some(solution)),
        Err(microlp::Error::Infeasible) => Ok(None),
        Err(microlp::Error::Unbounded) => Err(SolverError::Unbounded),
        #[allow(unreachable_patterns)]
        Err(err) => Err(SolverError::Backend(err.to_string())),
    }
}

/// Duals of `min cᵀx, Ax ⋈ b, x ≥ 0` as the optimum of `max bᵀy, Aᵀy ≤ c`,
/// where `y_i ≥ 0` on `>=` rows, `y_i ≤ 0` on `<=` rows and free on `=` rows.
/// Maximization problems are priced as the minimization of `-cᵀx` and the
/// duals flipped back.
fn dual_prices(problem: &Problem, options: &SolveOptions) -> Result<Option<Vec<f64>>, SolverError> {
    let standard = problem
        .variables()
        .iter()
        .all(|v| v.lower() == 0.0 && v.upper() == f64::INFINITY);
    if !standard {
        return Ok(None);
    }
    let sign = match problem.sense() {
        Sense::Minimize => 1.0,
        Sense::Maximize => -1.0,
    };

    let rows = problem.constraints();
    let mut program = microlp::Problem::new(OptimizationDirection::Maximize);
    let prices: Vec<microlp::Variable> = rows
        .iter()
        .map(|row| {
            let bounds = match row.relation() {
                Relation::GreaterEq => (0.0, f64::INFINITY),
                Relation::LessEq => (f64::NEG_INFINITY, 0.0),
                Relation::Equal => (f64::NEG_INFINITY, f64::INFINITY),
            };
            program.add_var(row.rhs(), bounds)
        })
        .collect();

    let mut columns: Vec<Vec<(microlp::Variable, f64)>> = vec![Vec::new(); problem.num_variables()];
    for (row, &price) in rows.iter().zip(&prices) {
        for &(id, coef) in row.terms() {
            columns[id.index()].push((price, coef));
        }
    }
    for (variable, column) in problem.variables().iter().zip(columns) {
        // a variable in no row is bounded by its objective alone
        if column.is_empty() {
            continue;
        }
        program.add_constraint(linear_expr(column), ComparisonOp::Le, sign * variable.objective());
    }

    let name = format!("{}_dual", problem.name());
    let solved = run(program, options.time_limit, &name)
        .map_err(|err| match err {
            SolverError::Unbounded => SolverError::Backend(format!("dual of '{}' is unbounded", problem.name())),
            other => other,
        })?
        .ok_or_else(|| SolverError::Backend(format!("dual of '{}' is infeasible", problem.name())))?;
    debug!(problem = problem.name(), dual_objective = sign * solved.objective(), "duals priced");
    Ok(Some(prices.iter().map(|&y| sign * solved[y]).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::{Implication, Variable};

    #[test]
    fn test_maximize_duals() {
        // max 3x + 2y s.t. x + y <= 4, x + 3y <= 9, x <= 3
        let mut p = Problem::new("max", Sense::Maximize);
        let x = p.add_variable(Variable::continuous("x").obj(3.0));
        let y = p.add_variable(Variable::continuous("y").obj(2.0));
        let c0 = p.add_constraint(Constraint::new("c0", vec![(x, 1.0), (y, 1.0)], Relation::LessEq, 4.0));
        let c1 = p.add_constraint(Constraint::new("c1", vec![(x, 1.0), (y, 3.0)], Relation::LessEq, 9.0));
        let c2 = p.add_constraint(Constraint::new("c2", vec![(x, 1.0)], Relation::LessEq, 3.0));
        let sol = MicroLpSolver.solve(&p, &SolveOptions::default()).expect("solve");
        assert_eq!(sol.status(), SolveStatus::Optimal);
        assert!((sol.objective() - 11.0).abs() < 1e-9);
        assert!((sol.value(x) - 3.0).abs() < 1e-9);
        assert!((sol.value(y) - 1.0).abs() < 1e-9);
        assert!((sol.dual(c0).expect("dual") - 2.0).abs() < 1e-9);
        assert!(sol.dual(c1).expect("dual").abs() < 1e-9);
        assert!((sol.dual(c2).expect("dual") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partitioning_duals_sum_to_objective() {
        // two singletons of cost 20 and 40, one pair of cost 40
        let mut p = Problem::new("partition", Sense::Minimize);
        let a = p.add_variable(Variable::continuous("a").obj(20.0));
        let b = p.add_variable(Variable::continuous("b").obj(40.0));
        let ab = p.add_variable(Variable::continuous("ab").obj(40.0));
        let ra = p.add_constraint(Constraint::new("A", vec![(a, 1.0), (ab, 1.0)], Relation::Equal, 1.0));
        let rb = p.add_constraint(Constraint::new("B", vec![(b, 1.0), (ab, 1.0)], Relation::Equal, 1.0));
        let sol = MicroLpSolver.solve(&p, &SolveOptions::default()).expect("solve");
        assert!((sol.objective() - 40.0).abs() < 1e-9);
        let (pa, pb) = (sol.dual(ra).expect("dual"), sol.dual(rb).expect("dual"));
        assert!((pa + pb - 40.0).abs() < 1e-9);
        assert!(pa <= 20.0 + 1e-9 && pb <= 40.0 + 1e-9);
    }

    #[test]
    fn test_bounded_variables_skip_duals() {
        let mut p = Problem::new("bounded", Sense::Minimize);
        let x = p.add_variable(Variable::continuous("x").bounds(1.0, 5.0).obj(1.0));
        p.add_constraint(Constraint::new("c", vec![(x, 1.0)], Relation::GreaterEq, 2.0));
        let sol = MicroLpSolver.solve(&p, &SolveOptions::default()).expect("solve");
        assert!((sol.value(x) - 2.0).abs() < 1e-9);
        assert!(sol.duals().is_none());
    }

    #[test]
    fn test_binary_with_implication() {
        // exactly one of two arcs; the cheaper one violates the time rule
        let mut p = Problem::new("imp", Sense::Minimize);
        let a = p.add_variable(Variable::binary("a").obj(1.0));
        let b = p.add_variable(Variable::binary("b").obj(5.0));
        let t = p.add_variable(Variable::continuous("t").bounds(0.0, 3.0));
        p.add_constraint(Constraint::new("one", vec![(a, 1.0), (b, 1.0)], Relation::Equal, 1.0));
        // a = 1 ⇒ t >= 10
        p.add_implication(Implication::new("late", a, vec![(t, 1.0)], 10.0, 10.0));
        let sol = MicroLpSolver.solve(&p, &SolveOptions::default()).expect("solve");
        assert_eq!(sol.status(), SolveStatus::Optimal);
        assert_eq!(sol.value(a), 0.0);
        assert_eq!(sol.value(b), 1.0);
        assert!(sol.duals().is_none());
        assert!((sol.objective() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible_mip() {
        let mut p = Problem::new("none", Sense::Minimize);
        let a = p.add_variable(Variable::binary("a"));
        let b = p.add_variable(Variable::binary("b"));
        p.add_constraint(Constraint::new("three", vec![(a, 1.0), (b, 1.0)], Relation::Equal, 3.0));
        let sol = MicroLpSolver.solve(&p, &SolveOptions::default()).expect("solve");
        assert_eq!(sol.status(), SolveStatus::Infeasible);
        assert!(!sol.has_point());
    }

    #[test]
    fn test_empty_rows() {
        let mut p = Problem::new("empty", Sense::Minimize);
        let x = p.add_variable(Variable::continuous("x").obj(1.0));
        p.add_constraint(Constraint::new("slack", Vec::new(), Relation::LessEq, 1.0));
        p.add_constraint(Constraint::new("x", vec![(x, 1.0)], Relation::GreaterEq, 1.0));
        let sol = MicroLpSolver.solve(&p, &SolveOptions::default()).expect("solve");
        assert!((sol.objective() - 1.0).abs() < 1e-9);
        assert_eq!(sol.duals().map(<[f64]>::len), Some(2));

        p.add_constraint(Constraint::new("never", Vec::new(), Relation::Equal, 1.0));
        let sol = MicroLpSolver.solve(&p, &SolveOptions::default()).expect("solve");
        assert_eq!(sol.status(), SolveStatus::Infeasible);
    }

    #[test]
    fn test_budgeted_solve_and_offset() {
        let mut p = Problem::new("budget", Sense::Minimize);
        let a = p.add_variable(Variable::binary("a").obj(1.0));
        p.add_constraint(Constraint::new("one", vec![(a, 1.0)], Relation::Equal, 1.0));
        p.set_objective_offset(4.0);
        let options = SolveOptions {
            time_limit: Some(Duration::from_secs(30)),
        };
        let sol = MicroLpSolver.solve(&p, &options).expect("solve");
        assert!((sol.objective() - 5.0).abs() < 1e-9);
    }
}
