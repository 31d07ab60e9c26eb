//! The model context: the single owner of all per-cycle state (literal pool,
//! rule buffer, memo table, sentinels, bit width, solver assignment) that the
//! variable layers thread their operations through.

pub mod atom;
pub mod bool;
pub mod int;
pub mod multi;

use std::collections::HashSet;

use itertools::Itertools;
use thiserror::Error;

use crate::{
	memo::MemoTable,
	model::bool::BoolVar,
	program::{Program, FALSE_HEAD},
	solver::default_solver_command,
};

/// The width, in bits, that integer variables take when none is configured.
const DEFAULT_NUM_BITS: u32 = 16;

/// Types whose variables can be compared for equality inside a model, used by
/// the generic helpers [`Model::require_all_diff`] and [`Model::var_in`].
pub trait ModelEq {
	/// A boolean variable holding whether `a` and `b` take the same value.
	fn model_eq(model: &mut Model, a: &Self, b: &Self) -> BoolVar;
}

/// Types that support conditional selection between two alternatives of the
/// same kind, used by the generic [`Model::cond`].
pub trait Conditional: Clone {
	/// A variable equal to `cons` when `pred` holds and to `alt` otherwise.
	fn select(model: &mut Model, pred: BoolVar, cons: &Self, alt: &Self) -> Self;
}

#[derive(Debug)]
/// A formulation of a problem instance, accumulating ground rules as variables
/// and expressions are constructed.
///
/// A `Model` owns every piece of per-cycle state. Starting over ("reset") is
/// simply constructing a fresh `Model`; variable handles are only meaningful
/// with the model that created them, and using them with another model is a
/// logic error.
pub struct Model {
	/// The solver assignment of the most recent satisfiable solve: the set of
	/// atoms that hold in the model.
	assignment: HashSet<u32>,
	/// Labelled expressions to report on after solving, see
	/// [`Model::require_debug`].
	checks: Vec<(BoolVar, String)>,
	/// Memoized results of derived sub-expressions.
	pub(crate) memo: MemoTable,
	/// The bit width of integer variables.
	num_bits: u32,
	/// The accumulated ground rule program.
	pub(crate) program: Program,
	/// The command line used to spawn the external solver.
	solver_command: Vec<String>,
	/// The boolean sentinel that is asserted true in every model.
	true_var: BoolVar,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error type for model construction. These indicate programmer error and are
/// never coerced into an unsatisfiable program.
pub enum ModelError {
	#[error("cannot change the bit width after variables have been allocated")]
	/// The bit width may only change while the model is still empty.
	BitWidthFixed,
	/// An enumerated or listed domain was empty.
	#[error("a variable needs at least one admissible value")]
	EmptyDomain,
	#[error("invalid integer range: {lo}..={hi}")]
	/// An integer range ran backwards.
	InvalidRange {
		/// Lower end of the range.
		lo: u64,
		/// Upper end of the range.
		hi: u64,
	},
	#[error("{value} does not fit in {bits} bits")]
	/// An integer constant was wider than the configured bit width.
	OutOfRange {
		/// The unrepresentable value.
		value: u64,
		/// The configured bit width.
		bits: u32,
	},
	#[error("unsupported bit width: {0} (at most 64)")]
	/// The requested bit width exceeds the width of the host value type.
	UnsupportedWidth(u32),
}

impl Model {
	/// The set of atoms that hold in the most recent solver model.
	pub(crate) fn assignment(&self) -> &HashSet<u32> {
		&self.assignment
	}

	/// The boolean sentinel for a constant truth value. No literal is
	/// allocated and no rule is emitted.
	pub fn bool_const(&self, value: bool) -> BoolVar {
		if value {
			self.true_var
		} else {
			!self.true_var
		}
	}

	/// The labelled expressions registered through [`Model::require_debug`].
	pub(crate) fn checks(&self) -> &[(BoolVar, String)] {
		&self.checks
	}

	/// A variable equal to `cons` when `pred` holds and to `alt` otherwise.
	///
	/// When the predicate is a constant sentinel the chosen side is returned
	/// directly, without allocating or emitting anything.
	pub fn cond<V: Conditional>(&mut self, pred: BoolVar, cons: &V, alt: &V) -> V {
		if pred == self.bool_const(true) {
			cons.clone()
		} else if pred == self.bool_const(false) {
			alt.clone()
		} else {
			V::select(self, pred, cons, alt)
		}
	}

	/// A boolean variable holding whether `a` and `b` take the same value.
	pub fn eq_of<V: ModelEq>(&mut self, a: &V, b: &V) -> BoolVar {
		V::model_eq(self, a, b)
	}

	/// Create a new, empty model with the default bit width.
	pub fn new() -> Self {
		let mut program = Program::default();
		let lit = program.new_lit();
		program.choice(vec![lit.atom()], vec![]);
		// Assert the truth sentinel, which also seeds the fact set.
		program.basic(FALSE_HEAD, vec![!lit]);
		let true_var = BoolVar::from_lit(lit);
		Self {
			assignment: HashSet::from([lit.atom()]),
			checks: Vec::new(),
			memo: MemoTable::default(),
			num_bits: DEFAULT_NUM_BITS,
			program,
			solver_command: default_solver_command(),
			true_var,
		}
	}

	/// A boolean variable holding whether `a` and `b` take different values.
	pub fn ne_of<V: ModelEq>(&mut self, a: &V, b: &V) -> BoolVar {
		!V::model_eq(self, a, b)
	}

	/// The configured bit width of integer variables.
	pub fn num_bits(&self) -> u32 {
		self.num_bits
	}

	/// The number of atoms allocated so far.
	pub fn num_literals(&self) -> u32 {
		self.program.num_atoms()
	}

	/// The number of rules accumulated so far.
	pub fn num_rules(&self) -> usize {
		self.program.len()
	}

	/// Constrain the expression to be true in every model.
	pub fn require(&mut self, x: BoolVar) {
		self.program.basic(FALSE_HEAD, vec![!x.lit()]);
	}

	/// Constrain every pair of the given variables to take different values.
	/// This emits a number of rules quadratic in the list length.
	pub fn require_all_diff<V: ModelEq>(&mut self, vars: &[V]) {
		for (i, j) in (0..vars.len()).tuple_combinations() {
			let ne = self.ne_of(&vars[i], &vars[j]);
			self.require(ne);
		}
	}

	/// Record a labelled expression to be checked against the model after
	/// solving, instead of constraining it.
	///
	/// Rewriting `require` calls to `require_debug` narrows down which
	/// constraint makes a problem unsatisfiable: solve the relaxed problem and
	/// the labels of all expressions that came out false are reported.
	pub fn require_debug(&mut self, x: BoolVar, label: impl Into<String>) {
		self.checks.push((x, label.into()));
	}

	/// Store the assignment parsed from the solver's model.
	pub(crate) fn set_assignment(&mut self, assignment: HashSet<u32>) {
		self.assignment = assignment;
	}

	/// Set the bit width of integer variables. Only allowed while no
	/// variables beyond the boot sentinel have been allocated, since existing
	/// bit vectors would silently disagree with the new width.
	pub fn set_bits(&mut self, bits: u32) -> Result<(), ModelError> {
		if bits > u64::BITS {
			return Err(ModelError::UnsupportedWidth(bits));
		}
		if self.program.num_atoms() > self.true_var.lit().atom() {
			return Err(ModelError::BitWidthFixed);
		}
		self.num_bits = bits;
		Ok(())
	}

	/// Set the bit width to the smallest width that can represent `max`.
	pub fn set_max_val(&mut self, max: u64) -> Result<(), ModelError> {
		self.set_bits(crate::helpers::bits_for(max))
	}

	/// Replace the command line used to spawn the external solver.
	pub fn set_solver_command<I, S>(&mut self, command: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.solver_command = command.into_iter().map_into().collect();
	}

	/// The command line used to spawn the external solver.
	pub(crate) fn solver_command(&self) -> &[String] {
		&self.solver_command
	}

	/// A boolean variable holding whether `var` equals at least one of the
	/// candidates. An empty candidate list yields the false sentinel.
	pub fn var_in<V: ModelEq>(&mut self, var: &V, candidates: &[V]) -> BoolVar {
		let mut result = self.bool_const(false);
		for c in candidates {
			let eq = self.eq_of(var, c);
			result = self.bool_or(result, eq);
		}
		result
	}
}

impl Default for Model {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use crate::{Model, ModelError};

	#[test]
	fn test_boot_state() {
		let m = Model::new();
		// The truth sentinel occupies the first allocated atom and is already
		// part of the (empty-problem) assignment.
		assert_eq!(m.num_literals(), 2);
		assert_eq!(m.num_rules(), 2);
		assert!(m.value_bool(m.bool_const(true)));
		assert!(!m.value_bool(m.bool_const(false)));
	}

	#[test]
	fn test_set_bits_before_and_after_allocation() {
		let mut m = Model::new();
		m.set_bits(8).unwrap();
		assert_eq!(m.num_bits(), 8);
		let _ = m.new_bool_var();
		assert_eq!(m.set_bits(4), Err(ModelError::BitWidthFixed));
		assert_eq!(m.set_bits(128), Err(ModelError::UnsupportedWidth(128)));
	}

	#[test]
	fn test_set_max_val() {
		let mut m = Model::new();
		m.set_max_val(100).unwrap();
		assert_eq!(m.num_bits(), 7);
		let mut m = Model::new();
		m.set_max_val(127).unwrap();
		assert_eq!(m.num_bits(), 7);
		let mut m = Model::new();
		m.set_max_val(128).unwrap();
		assert_eq!(m.num_bits(), 8);
	}

	#[test]
	fn test_require_records_fact() {
		let mut m = Model::new();
		let a = m.new_bool_var();
		let before = m.num_rules();
		m.require(a);
		assert_eq!(m.num_rules(), before + 1);
		// A repeated requirement is recognised as redundant.
		m.require(a);
		assert_eq!(m.num_rules(), before + 1);
	}

	#[test]
	fn test_var_in_empty_list() {
		let mut m = Model::new();
		let a = m.new_bool_var();
		let result = m.var_in(&a, &[]);
		assert_eq!(result, m.bool_const(false));
	}
}
