//! # Aspen - A Finite-Domain Constraint Front-End for Answer-Set Solvers
//!
//! Aspen compiles high-level finite-domain expressions — booleans, bounded
//! non-negative integers, and enumerated values over arbitrary host types —
//! into the ground rule format consumed by a stable-model (answer-set) solver
//! such as `clasp`. A problem is described by constructing variables on a
//! [`Model`], combining them with logical, arithmetic, comparison and
//! conditional operators, and asserting constraints with [`Model::require`].
//! [`Model::solve`] then spawns the external solver, streams the rule program
//! to it, parses the reported model, and binds it back to the constructed
//! variables so their values can be read.
//!
//! Derived sub-expressions are memoized by the structural identity of their
//! operands, so repeated construction of the same expression — the common
//! case in grid-shaped puzzles — reuses the literal allocated the first time,
//! and basic rules are simplified on the fly against everything already known
//! to be unconditionally true or false.
//!
//! ```no_run
//! use aspen::{Model, SolveResult};
//!
//! let mut m = Model::new();
//! let a = m.new_int_range(1, 9)?;
//! let b = m.new_int_range(1, 9)?;
//! let sum = m.int_add(&a, &b);
//! let ten = m.new_int_const(10)?;
//! let eq = m.int_eq(&sum, &ten);
//! m.require(eq);
//! if m.solve()? == SolveResult::Satisfied {
//! 	println!("{} + {} = 10", m.value_int(&a), m.value_int(&b));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub(crate) mod helpers;
pub(crate) mod memo;
pub mod model;
pub mod program;
pub mod solver;

pub use crate::{
	model::{
		atom::Atom, bool::BoolVar, int::IntVar, multi::MultiVar, Conditional, Model, ModelEq,
		ModelError,
	},
	program::{Lit, Program, Rule},
	solver::{SolveError, SolveResult},
};

/// Type alias for the host representation of integer variable values.
pub type IntVal = u64;
