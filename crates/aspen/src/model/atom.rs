//! Proof atoms: boolean variables that hold only when derivable through an
//! explicitly registered implication chain.

use crate::model::{bool::BoolVar, Model};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// A boolean variable without a choice rule. Under the stable-model semantics
/// the solver only makes the atom true when at least one registered proof body
/// is satisfied; with no satisfiable proof, minimality forces it false.
///
/// This is the building block for reachability arguments: a cell is reachable
/// from a seed exactly when some neighbour is reachable and passable, with the
/// seed proven unconditionally.
pub struct Atom(BoolVar);

impl Atom {
	/// The atom viewed as a plain boolean variable.
	pub fn as_bool(self) -> BoolVar {
		self.0
	}
}

impl From<Atom> for BoolVar {
	fn from(value: Atom) -> Self {
		value.0
	}
}

impl Model {
	/// Create a new proof atom. It is false unless proven via
	/// [`Model::prove_if`].
	pub fn new_atom(&mut self) -> Atom {
		Atom(self.new_internal_bool())
	}

	/// Register a proof clause: the atom holds whenever `premise` holds.
	pub fn prove_if(&mut self, atom: Atom, premise: BoolVar) {
		self.program
			.basic(atom.0.lit().atom(), vec![premise.lit()]);
	}
}

#[cfg(test)]
mod tests {
	use crate::Model;

	#[test]
	fn test_atom_has_no_choice_rule() {
		let mut m = Model::new();
		let before = m.num_rules();
		let a = m.new_atom();
		assert_eq!(m.num_rules(), before);
		let premise = m.new_bool_var();
		m.prove_if(a, premise);
		assert_eq!(m.num_rules(), before + 2);
	}

	#[test]
	fn test_multiple_proof_clauses() {
		let mut m = Model::new();
		let a = m.new_atom();
		let p = m.new_bool_var();
		let q = m.new_bool_var();
		let before = m.num_rules();
		m.prove_if(a, p);
		m.prove_if(a, q);
		assert_eq!(m.num_rules(), before + 2);
	}
}
