use std::fmt::{self, Display, Write};

use crate::ops::{AndOp, OrOp};
use crate::variable::{Variable, VariableKey, Variables};

/// A rule premise or consequence: propositions joined by fuzzy AND / OR.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr<T> {
    Is(VariableKey, T),
    And(Vec<Expr<T>>),
    Or(Vec<Expr<T>>),
}

impl<T> Expr<T> {
    pub fn or(self, rhs: Expr<T>) -> Self {
        match self {
            Expr::Or(mut exprs) => {
                exprs.push(rhs);
                Expr::Or(exprs)
            },
            lhs => Expr::Or(vec![lhs, rhs]),
        }
    }

    pub fn and(self, rhs: Expr<T>) -> Self {
        match self {
            Expr::And(mut exprs) => {
                exprs.push(rhs);
                Expr::And(exprs)
            },
            lhs => Expr::And(vec![lhs, rhs]),
        }
    }

    pub fn and2(self, rhs: Expr<T>, rhs2: Expr<T>) -> Self {
        self.and(rhs).and(rhs2)
    }

    /// Whether every `And` / `Or` group has at least one member.
    pub(crate) fn is_populated(&self) -> bool {
        match self {
            Expr::Is(..) => true,
            Expr::And(exprs) | Expr::Or(exprs) => !exprs.is_empty() && exprs.iter().all(Expr::is_populated),
        }
    }

    /// Whether this is a single proposition or a conjunction of propositions.
    pub(crate) fn is_conjunction(&self) -> bool {
        match self {
            Expr::Is(..) => true,
            Expr::And(exprs) => exprs.iter().all(Expr::is_conjunction),
            Expr::Or(_) => false,
        }
    }
}

impl<T: Copy> Expr<T> {
    /// Every `(variable, term)` leaf, left to right.
    pub fn propositions(&self) -> Vec<(VariableKey, T)> {
        let mut props = Vec::new();

        fn parse<T: Copy>(expr: &Expr<T>, out: &mut Vec<(VariableKey, T)>) {
            match expr {
                Expr::Is(var_key, term) => out.push((*var_key, *term)),
                Expr::And(exprs) | Expr::Or(exprs) => {
                    for expr in exprs {
                        parse(expr, out);
                    }
                },
            }
        }

        parse(self, &mut props);

        props
    }

    /// Evaluates the tree bottom up. `degree` supplies each leaf's membership.
    pub fn eval(&self, and_op: AndOp, or_op: OrOp, degree: &impl Fn(VariableKey, T) -> f64) -> f64 {
        match self {
            Expr::Is(var_key, term) => degree(*var_key, *term),
            Expr::And(exprs) => exprs
                .iter()
                .map(|expr| expr.eval(and_op, or_op, degree))
                .reduce(|u, v| and_op.call(u, v))
                .unwrap_or(1.),
            Expr::Or(exprs) => exprs
                .iter()
                .map(|expr| expr.eval(and_op, or_op, degree))
                .reduce(|u, v| or_op.call(u, v))
                .unwrap_or(0.),
        }
    }
}

impl<T: Display> Expr<T> {
    /// Renders as `blink_rate[high] AND (temp[hot] OR drive_time[long])`.
    pub fn render(&self, vars: &Variables<T>) -> String {
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = self.write_to(vars, &mut out, false);

        out
    }

    fn write_to(&self, vars: &Variables<T>, out: &mut String, nested: bool) -> fmt::Result {
        let (exprs, joiner) = match self {
            Expr::Is(var_key, term) => {
                let name = vars.get(*var_key).map_or("?", |var| var.name());

                return write!(out, "{name}[{term}]");
            },
            Expr::And(exprs) => (exprs, " AND "),
            Expr::Or(exprs) => (exprs, " OR "),
        };
        let grouped = nested && exprs.len() > 1;

        if grouped {
            out.push('(');
        }

        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                out.push_str(joiner);
            }

            expr.write_to(vars, out, true)?;
        }

        if grouped {
            out.push(')');
        }

        Ok(())
    }
}

impl<I> Variable<I> {
    pub fn is<T>(self, rhs: I) -> Expr<T>
    where
        I: Into<T>,
    {
        Expr::Is(self.0, rhs.into())
    }
}

#[cfg(test)]
mod fixtures {
    use std::fmt;

    use crate::terms::{Key, Terms};
    use crate::variable::{Variable, Variables};

    #[derive(Clone, Copy, Debug, Key, PartialEq, Eq)]
    pub enum Level {
        Low,
        High,
    }

    impl fmt::Display for Level {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Level::Low => "low",
                Level::High => "high",
            })
        }
    }

    pub fn vars() -> (Variables<Level>, Variable<Level>, Variable<Level>, Variable<Level>) {
        let terms = || Terms::new().with(Level::Low, [0., 0., 10.]).with(Level::High, [0., 10., 10.]);
        let mut vars = Variables::new();
        let x = vars.input("x", 0. ..=10., 1., terms());
        let y = vars.input("y", 0. ..=10., 1., terms());
        let z = vars.input("z", 0. ..=10., 1., terms());

        (vars, x, y, z)
    }
}

#[test]
fn test_builders_flatten() {
    use fixtures::Level;

    let (_, x, y, z) = fixtures::vars();
    let expr: Expr<Level> = x.is(Level::High).and(y.is(Level::Low)).and(z.is(Level::Low));

    assert_eq!(expr, Expr::And(vec![x.is(Level::High), y.is(Level::Low), z.is(Level::Low)]));
    assert_eq!(x.is(Level::High).and2(y.is(Level::Low), z.is(Level::Low)), expr);
    assert_eq!(expr.propositions(), vec![(x.key(), Level::High), (y.key(), Level::Low), (z.key(), Level::Low)]);
}

#[test]
fn test_eval_min_max() {
    use fixtures::Level;

    let (_, x, y, z) = fixtures::vars();
    let degree = |key: VariableKey, term: Level| match (key, term) {
        (k, Level::High) if k == x.key() => 0.7,
        (k, Level::Low) if k == y.key() => 0.4,
        (k, Level::Low) if k == z.key() => 0.9,
        _ => 0.,
    };

    let and = x.is(Level::High).and(y.is(Level::Low));
    let or = x.is(Level::High).or(y.is(Level::Low));
    let nested = x.is(Level::High).and(y.is(Level::Low).or(z.is(Level::Low)));

    assert_eq!(and.eval(AndOp::Min, OrOp::Max, &degree), 0.4);
    assert_eq!(or.eval(AndOp::Min, OrOp::Max, &degree), 0.7);
    assert_eq!(nested.eval(AndOp::Min, OrOp::Max, &degree), 0.7);
    // Product variants give different answers
    assert_eq!(and.eval(AndOp::Prod, OrOp::Max, &degree), 0.7 * 0.4);
    assert_eq!(or.eval(AndOp::Min, OrOp::ProbOr, &degree), 0.7 + 0.4 - 0.7 * 0.4);
}

#[test]
fn test_shape_checks() {
    use fixtures::Level;

    let (_, x, y, _) = fixtures::vars();

    assert!(x.is::<Level>(Level::Low).is_populated());
    assert!(!Expr::<Level>::And(vec![]).is_populated());
    assert!(!x.is::<Level>(Level::Low).and(Expr::Or(vec![])).is_populated());

    assert!(x.is::<Level>(Level::Low).is_conjunction());
    assert!(x.is::<Level>(Level::Low).and(y.is(Level::High)).is_conjunction());
    assert!(!x.is::<Level>(Level::Low).or(y.is(Level::High)).is_conjunction());
}

#[test]
fn test_render() {
    use fixtures::Level;

    let (vars, x, y, z) = fixtures::vars();
    let expr: Expr<Level> = x.is(Level::High).and(y.is(Level::Low).or(z.is(Level::Low)));

    assert_eq!(expr.render(&vars), "x[high] AND (y[low] OR z[low])");
    assert_eq!(x.is::<Level>(Level::Low).render(&vars), "x[low]");
}
