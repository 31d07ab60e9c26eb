//! Boolean decision variables and the lowering of boolean operators to ground
//! rules.

use std::ops::Not;

use crate::{
	memo::{hash_one, Fingerprint, MemoKey, Op},
	model::{int::IntVar, Conditional, Model, ModelEq},
	program::Lit,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A boolean decision variable: a handle carrying one signed literal.
///
/// Two handles denote the same value exactly when they carry the same literal,
/// and complementary values exactly when their literals differ only in sign.
/// Negation therefore allocates nothing, see the [`Not`] implementation.
pub struct BoolVar(Lit);

impl BoolVar {
	/// Wrap a literal in a variable handle.
	pub(crate) fn from_lit(lit: Lit) -> Self {
		Self(lit)
	}

	/// The signed literal the handle carries.
	pub fn lit(self) -> Lit {
		self.0
	}
}

impl Fingerprint for BoolVar {
	fn fingerprint(&self) -> u64 {
		hash_one(&("bool", self.0.get()))
	}
}

impl Not for BoolVar {
	type Output = BoolVar;

	fn not(self) -> Self::Output {
		BoolVar(!self.0)
	}
}

impl Conditional for BoolVar {
	fn select(model: &mut Model, pred: BoolVar, cons: &Self, alt: &Self) -> Self {
		model.bool_cond(pred, *cons, *alt)
	}
}

impl ModelEq for BoolVar {
	fn model_eq(model: &mut Model, a: &Self, b: &Self) -> BoolVar {
		model.bool_eq(*a, *b)
	}
}

impl Model {
	/// A variable holding whether at least `n` of the given variables are
	/// true, lowered to a single weight rule with unit weights.
	pub fn at_least(&mut self, n: u32, vars: &[BoolVar]) -> BoolVar {
		let r = self.new_internal_bool();
		self.program
			.weight(r.0.atom(), n, vars.iter().map(|v| v.0).collect());
		r
	}

	/// A variable holding whether at most `n` of the given variables are
	/// true.
	pub fn at_most(&mut self, n: u32, vars: &[BoolVar]) -> BoolVar {
		!self.at_least(n + 1, vars)
	}

	/// The conjunction of two boolean variables: `r ← a, b`.
	pub fn bool_and(&mut self, a: BoolVar, b: BoolVar) -> BoolVar {
		let t = self.bool_const(true);
		let f = self.bool_const(false);
		if a == t {
			return b;
		}
		if b == t {
			return a;
		}
		if a == f || b == f {
			return f;
		}
		let key = MemoKey::symmetric(Op::BoolAnd, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let r = self.new_internal_bool();
		self.program.basic(r.0.atom(), vec![a.0, b.0]);
		self.memo.insert(key, r)
	}

	/// A variable equal to `cons` when `pred` holds and to `alt` otherwise:
	/// `r ← pred, cons` and `r ← ¬pred, alt`.
	pub fn bool_cond(&mut self, pred: BoolVar, cons: BoolVar, alt: BoolVar) -> BoolVar {
		if pred == self.bool_const(true) {
			return cons;
		}
		if pred == self.bool_const(false) {
			return alt;
		}
		if cons == alt {
			return cons;
		}
		let key = MemoKey::ordered(
			Op::BoolCond,
			[pred.fingerprint(), cons.fingerprint(), alt.fingerprint()],
		);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let r = self.new_internal_bool();
		self.program.basic(r.0.atom(), vec![pred.0, cons.0]);
		self.program.basic(r.0.atom(), vec![!pred.0, alt.0]);
		self.memo.insert(key, r)
	}

	/// The equivalence of two boolean variables: `r ← a, b` and `r ← ¬a, ¬b`.
	pub fn bool_eq(&mut self, a: BoolVar, b: BoolVar) -> BoolVar {
		let t = self.bool_const(true);
		let f = self.bool_const(false);
		if a == t {
			return b;
		}
		if a == f {
			return !b;
		}
		if b == t {
			return a;
		}
		if b == f {
			return !a;
		}
		let key = MemoKey::symmetric(Op::BoolEq, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let r = self.new_internal_bool();
		self.program.basic(r.0.atom(), vec![a.0, b.0]);
		self.program.basic(r.0.atom(), vec![!a.0, !b.0]);
		self.memo.insert(key, r)
	}

	/// Whether `a` is true and `b` is false, the strict order on booleans:
	/// `r ← a, ¬b`.
	pub fn bool_gt(&mut self, a: BoolVar, b: BoolVar) -> BoolVar {
		let t = self.bool_const(true);
		let f = self.bool_const(false);
		if b == t || a == f {
			return f;
		}
		if b == f {
			return a;
		}
		if a == t {
			return !b;
		}
		let key = MemoKey::ordered(Op::BoolGt, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let r = self.new_internal_bool();
		self.program.basic(r.0.atom(), vec![a.0, !b.0]);
		self.memo.insert(key, r)
	}

	/// Whether `a` is false or `b` is true.
	pub fn bool_le(&mut self, a: BoolVar, b: BoolVar) -> BoolVar {
		!self.bool_gt(a, b)
	}

	/// Whether `a` is false and `b` is true.
	pub fn bool_lt(&mut self, a: BoolVar, b: BoolVar) -> BoolVar {
		self.bool_gt(b, a)
	}

	/// Whether `a` is true or `b` is false.
	pub fn bool_ge(&mut self, a: BoolVar, b: BoolVar) -> BoolVar {
		!self.bool_lt(a, b)
	}

	/// Whether two boolean variables take different values, the negation of
	/// their equivalence.
	pub fn bool_ne(&mut self, a: BoolVar, b: BoolVar) -> BoolVar {
		!self.bool_eq(a, b)
	}

	/// The disjunction of two boolean variables: `r ← a` and `r ← b`.
	pub fn bool_or(&mut self, a: BoolVar, b: BoolVar) -> BoolVar {
		let t = self.bool_const(true);
		let f = self.bool_const(false);
		if a == t || b == t {
			return t;
		}
		if a == f {
			return b;
		}
		if b == f {
			return a;
		}
		let key = MemoKey::symmetric(Op::BoolOr, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let r = self.new_internal_bool();
		self.program.basic(r.0.atom(), vec![a.0]);
		self.program.basic(r.0.atom(), vec![b.0]);
		self.memo.insert(key, r)
	}

	/// The exclusive disjunction of two boolean variables: `r ← a, ¬b` and
	/// `r ← ¬a, b`.
	pub fn bool_xor(&mut self, a: BoolVar, b: BoolVar) -> BoolVar {
		let t = self.bool_const(true);
		let f = self.bool_const(false);
		if a == t {
			return !b;
		}
		if a == f {
			return b;
		}
		if b == t {
			return !a;
		}
		if b == f {
			return a;
		}
		let key = MemoKey::symmetric(Op::BoolXor, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let r = self.new_internal_bool();
		self.program.basic(r.0.atom(), vec![a.0, !b.0]);
		self.program.basic(r.0.atom(), vec![!a.0, b.0]);
		self.memo.insert(key, r)
	}

	/// Whether any bit of the integer variable is set, the truthiness
	/// conversion from integers.
	pub fn bool_from_int(&mut self, x: &IntVar) -> BoolVar {
		let mut result = self.bool_const(false);
		for &bit in x.bits() {
			result = self.bool_or(result, bit);
		}
		result
	}

	/// A variable holding whether exactly `n` of the given variables are
	/// true.
	pub fn exactly(&mut self, n: u32, vars: &[BoolVar]) -> BoolVar {
		let lo = self.at_least(n, vars);
		let hi = self.at_most(n, vars);
		self.bool_and(lo, hi)
	}

	/// Create a new boolean variable that may freely take either value,
	/// defined by a choice rule.
	pub fn new_bool_var(&mut self) -> BoolVar {
		let lit = self.program.new_lit();
		self.program.choice(vec![lit.atom()], vec![]);
		BoolVar(lit)
	}

	/// Allocate a literal without a choice rule, for derived variables whose
	/// truth is fully determined by the rules that define them.
	pub(crate) fn new_internal_bool(&mut self) -> BoolVar {
		BoolVar(self.program.new_lit())
	}

	/// The value of the variable in the most recent solver model.
	pub fn value_bool(&self, x: BoolVar) -> bool {
		if x.0.is_positive() {
			self.assignment().contains(&x.0.atom())
		} else {
			!self.assignment().contains(&x.0.atom())
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::Model;

	#[test]
	fn test_negation_is_free() {
		let mut m = Model::new();
		let a = m.new_bool_var();
		let before = (m.num_rules(), m.num_literals());
		let b = !a;
		assert_eq!((m.num_rules(), m.num_literals()), before);
		assert_eq!(b.lit().atom(), a.lit().atom());
		assert_ne!(b.lit(), a.lit());
		assert_eq!(!b, a);
	}

	#[test]
	fn test_constant_folding_emits_nothing() {
		let mut m = Model::new();
		let a = m.new_bool_var();
		let t = m.bool_const(true);
		let f = m.bool_const(false);
		let before = (m.num_rules(), m.num_literals());
		assert_eq!(m.bool_and(a, t), a);
		assert_eq!(m.bool_and(f, a), f);
		assert_eq!(m.bool_or(a, f), a);
		assert_eq!(m.bool_or(t, a), t);
		assert_eq!(m.bool_xor(a, f), a);
		assert_eq!(m.bool_xor(t, a), !a);
		assert_eq!(m.bool_eq(a, t), a);
		assert_eq!(m.bool_eq(a, f), !a);
		assert_eq!(m.bool_gt(a, t), f);
		assert_eq!(m.bool_gt(a, f), a);
		assert_eq!(m.bool_cond(t, a, f), a);
		assert_eq!(m.bool_cond(f, a, t), t);
		assert_eq!((m.num_rules(), m.num_literals()), before);
	}

	#[test]
	fn test_and_lowering() {
		let mut m = Model::new();
		let a = m.new_bool_var();
		let b = m.new_bool_var();
		let before = m.num_rules();
		let r = m.bool_and(a, b);
		assert_eq!(m.num_rules(), before + 1);
		assert!(r.lit().is_positive());
	}

	#[test]
	fn test_or_and_eq_lowering_rule_counts() {
		let mut m = Model::new();
		let a = m.new_bool_var();
		let b = m.new_bool_var();
		let before = m.num_rules();
		let _ = m.bool_or(a, b);
		assert_eq!(m.num_rules(), before + 2);
		let before = m.num_rules();
		let _ = m.bool_eq(a, b);
		assert_eq!(m.num_rules(), before + 2);
		let before = m.num_rules();
		let _ = m.bool_gt(a, b);
		assert_eq!(m.num_rules(), before + 1);
	}

	#[test]
	fn test_memoization_shares_literals() {
		let mut m = Model::new();
		let a = m.new_bool_var();
		let b = m.new_bool_var();
		let r1 = m.bool_and(a, b);
		let rules = m.num_rules();
		let lits = m.num_literals();
		// The same conjunction, in either argument order, reuses the literal
		// and grows nothing.
		let r2 = m.bool_and(a, b);
		let r3 = m.bool_and(b, a);
		assert_eq!(r1, r2);
		assert_eq!(r1, r3);
		assert_eq!(m.num_rules(), rules);
		assert_eq!(m.num_literals(), lits);
		// The ordered operator distinguishes argument order.
		let g1 = m.bool_gt(a, b);
		let g2 = m.bool_gt(b, a);
		assert_ne!(g1, g2);
	}

	#[test]
	fn test_at_least_weight_rule() {
		let mut m = Model::new();
		let vars = [m.new_bool_var(), m.new_bool_var(), m.new_bool_var()];
		let before = m.num_rules();
		let _ = m.at_least(2, &vars);
		assert_eq!(m.num_rules(), before + 1);
		// `at_most` adds the complementary weight rule, `exactly` both plus
		// the conjunction.
		let before = m.num_rules();
		let _ = m.at_most(2, &vars);
		assert_eq!(m.num_rules(), before + 1);
	}

	#[test]
	fn test_cond_identical_branches() {
		let mut m = Model::new();
		let p = m.new_bool_var();
		let a = m.new_bool_var();
		let before = m.num_rules();
		assert_eq!(m.bool_cond(p, a, a), a);
		assert_eq!(m.cond(p, &a, &a), a);
		assert_eq!(m.num_rules(), before);
	}

	#[test]
	fn test_truthiness_of_constant_integers() {
		let mut m = Model::new();
		let zero = m.new_int_const(0).unwrap();
		let five = m.new_int_const(5).unwrap();
		let before = m.num_rules();
		let from_zero = m.bool_from_int(&zero);
		let from_five = m.bool_from_int(&five);
		assert_eq!(from_zero, m.bool_const(false));
		assert_eq!(from_five, m.bool_const(true));
		assert_eq!(m.num_rules(), before);
	}
}
