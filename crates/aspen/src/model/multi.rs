//! Enumerated-value decision variables: finite-domain variables over
//! arbitrary host values, with operations lifted from the host value domain by
//! cross-product expansion.

use std::{
	any::TypeId,
	collections::HashSet,
	fmt::Debug,
	hash::Hash,
	ops::{Add, Div, Mul, Sub},
};

use crate::{
	memo::{hash_one, Fingerprint, MemoKey, Op},
	model::{bool::BoolVar, Conditional, Model, ModelEq},
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// A variable taking one value out of a finite set of host values, implemented
/// as one boolean selector per distinct value.
///
/// Construction with two or more values constrains exactly one selector to be
/// true. A single-value variable is bound to the truth sentinel outright, and
/// a variable without values is a degenerate form that only arises internally
/// as the result of operations on empty variables.
pub struct MultiVar<T> {
	/// The distinct admissible values, each paired with the boolean selector
	/// holding whether the variable takes it. Insertion order is preserved.
	vals: Vec<(T, BoolVar)>,
}

impl<T> MultiVar<T> {
	/// Whether the variable has no admissible values.
	pub fn is_empty(&self) -> bool {
		self.vals.is_empty()
	}

	/// The number of distinct admissible values.
	pub fn len(&self) -> usize {
		self.vals.len()
	}

	/// The boolean selector for a value, if it is admissible.
	pub fn selector(&self, value: &T) -> Option<BoolVar>
	where
		T: Eq,
	{
		self.vals
			.iter()
			.find(|(v, _)| v == value)
			.map(|&(_, b)| b)
	}

	/// The admissible values, in insertion order.
	pub fn values(&self) -> impl Iterator<Item = &T> {
		self.vals.iter().map(|(v, _)| v)
	}
}

impl<T: Hash + 'static> Fingerprint for MultiVar<T> {
	fn fingerprint(&self) -> u64 {
		let mut pairs: Vec<(u64, i32)> = self
			.vals
			.iter()
			.map(|(v, b)| (hash_one(v), b.lit().get()))
			.collect();
		pairs.sort_unstable();
		hash_one(&("multi", TypeId::of::<T>(), pairs))
	}
}

impl<T: Clone + Eq + Hash + Debug + 'static> Conditional for MultiVar<T> {
	fn select(model: &mut Model, pred: BoolVar, cons: &Self, alt: &Self) -> Self {
		model.multi_cond(pred, cons, alt)
	}
}

impl<T: Clone + Eq + Hash + Debug + 'static> ModelEq for MultiVar<T> {
	fn model_eq(model: &mut Model, a: &Self, b: &Self) -> BoolVar {
		model.multi_eq(a, b)
	}
}

impl Model {
	/// The sum of two enumerated variables under the host value addition.
	pub fn multi_add<T>(&mut self, a: &MultiVar<T>, b: &MultiVar<T>) -> MultiVar<T>
	where
		T: Add<Output = T> + Clone + Eq + Hash + Debug + 'static,
	{
		let key = MemoKey::ordered(Op::MultiAdd, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let r = self.multi_zip_with(a, b, |x, y| x.clone() + y.clone());
		self.memo.insert(key, r)
	}

	/// A boolean variable holding whether any admissible value satisfying the
	/// predicate is taken. This is the truthiness conversion from enumerated
	/// variables, with the notion of truthiness supplied by the caller.
	pub fn multi_any<T>(&mut self, a: &MultiVar<T>, pred: impl Fn(&T) -> bool) -> BoolVar {
		let mut result = self.bool_const(false);
		for &(ref v, b) in &a.vals {
			if pred(v) {
				result = self.bool_or(result, b);
			}
		}
		result
	}

	/// A variable equal to `cons` when `pred` holds and to `alt` otherwise.
	/// Its value set is the union of both branches.
	pub fn multi_cond<T>(&mut self, pred: BoolVar, cons: &MultiVar<T>, alt: &MultiVar<T>) -> MultiVar<T>
	where
		T: Clone + Eq + Hash + Debug + 'static,
	{
		if pred == self.bool_const(true) {
			return cons.clone();
		}
		if pred == self.bool_const(false) {
			return alt.clone();
		}
		let key = MemoKey::ordered(
			Op::MultiCond,
			[pred.fingerprint(), cons.fingerprint(), alt.fingerprint()],
		);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let mut vals: Vec<(T, BoolVar)> = Vec::with_capacity(cons.len() + alt.len());
		for (v, b) in &cons.vals {
			let chosen = self.bool_and(pred, *b);
			vals.push((v.clone(), chosen));
		}
		for (v, b) in &alt.vals {
			let chosen = self.bool_and(!pred, *b);
			match vals.iter().position(|(w, _)| w == v) {
				Some(i) => {
					let prev = vals[i].1;
					vals[i].1 = self.bool_or(prev, chosen);
				}
				None => vals.push((v.clone(), chosen)),
			}
		}
		self.memo.insert(key, MultiVar { vals })
	}

	/// The quotient of two enumerated variables under the host value
	/// division.
	pub fn multi_div<T>(&mut self, a: &MultiVar<T>, b: &MultiVar<T>) -> MultiVar<T>
	where
		T: Div<Output = T> + Clone + Eq + Hash + Debug + 'static,
	{
		let key = MemoKey::ordered(Op::MultiDiv, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let r = self.multi_zip_with(a, b, |x, y| x.clone() / y.clone());
		self.memo.insert(key, r)
	}

	/// Whether two enumerated variables take equal values.
	pub fn multi_eq<T>(&mut self, a: &MultiVar<T>, b: &MultiVar<T>) -> BoolVar
	where
		T: Clone + Eq + Hash + Debug + 'static,
	{
		let key = MemoKey::symmetric(Op::MultiEq, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let r = self.multi_test(a, b, |x, y| x == y);
		self.memo.insert(key, r)
	}

	/// Whether `a` is greater or equal to `b` under the host value order.
	pub fn multi_ge<T>(&mut self, a: &MultiVar<T>, b: &MultiVar<T>) -> BoolVar
	where
		T: Clone + Ord + Hash + Debug + 'static,
	{
		!self.multi_lt(a, b)
	}

	/// Whether `a` is strictly greater than `b` under the host value order.
	pub fn multi_gt<T>(&mut self, a: &MultiVar<T>, b: &MultiVar<T>) -> BoolVar
	where
		T: Clone + Ord + Hash + Debug + 'static,
	{
		let key = MemoKey::ordered(Op::MultiGt, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let r = self.multi_test(a, b, |x, y| x > y);
		self.memo.insert(key, r)
	}

	/// Whether `a` is less or equal to `b` under the host value order.
	pub fn multi_le<T>(&mut self, a: &MultiVar<T>, b: &MultiVar<T>) -> BoolVar
	where
		T: Clone + Ord + Hash + Debug + 'static,
	{
		!self.multi_gt(a, b)
	}

	/// Whether `a` is strictly less than `b` under the host value order.
	pub fn multi_lt<T>(&mut self, a: &MultiVar<T>, b: &MultiVar<T>) -> BoolVar
	where
		T: Clone + Ord + Hash + Debug + 'static,
	{
		self.multi_gt(b, a)
	}

	/// The product of two enumerated variables under the host value
	/// multiplication.
	pub fn multi_mul<T>(&mut self, a: &MultiVar<T>, b: &MultiVar<T>) -> MultiVar<T>
	where
		T: Mul<Output = T> + Clone + Eq + Hash + Debug + 'static,
	{
		let key = MemoKey::ordered(Op::MultiMul, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let r = self.multi_zip_with(a, b, |x, y| x.clone() * y.clone());
		self.memo.insert(key, r)
	}

	/// Whether two enumerated variables take different values.
	pub fn multi_ne<T>(&mut self, a: &MultiVar<T>, b: &MultiVar<T>) -> BoolVar
	where
		T: Clone + Eq + Hash + Debug + 'static,
	{
		!self.multi_eq(a, b)
	}

	/// The difference of two enumerated variables under the host value
	/// subtraction.
	pub fn multi_sub<T>(&mut self, a: &MultiVar<T>, b: &MultiVar<T>) -> MultiVar<T>
	where
		T: Sub<Output = T> + Clone + Eq + Hash + Debug + 'static,
	{
		let key = MemoKey::ordered(Op::MultiSub, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let r = self.multi_zip_with(a, b, |x, y| x.clone() - y.clone());
		self.memo.insert(key, r)
	}

	/// A boolean combination of two enumerated variables under an arbitrary
	/// host-level test.
	///
	/// Whichever of the satisfying and the unsatisfying pair sets is smaller
	/// drives the lowering: the selector conjunctions of that set are joined
	/// by disjunction and the sense of the result is flipped if it was the
	/// unsatisfying one. Closure-parameterised and therefore never memoized;
	/// the named comparison operators wrap this with a cache.
	pub fn multi_test<T, U>(
		&mut self,
		a: &MultiVar<T>,
		b: &MultiVar<U>,
		op: impl Fn(&T, &U) -> bool,
	) -> BoolVar {
		let mut true_count = 0_usize;
		let mut false_count = 0_usize;
		for (av, _) in &a.vals {
			for (bv, _) in &b.vals {
				if op(av, bv) {
					true_count += 1;
				} else {
					false_count += 1;
				}
			}
		}
		let invert = false_count < true_count;
		let mut result = self.bool_const(false);
		for &(ref av, ab) in &a.vals {
			for &(ref bv, bb) in &b.vals {
				if op(av, bv) != invert {
					let pair = self.bool_and(ab, bb);
					result = self.bool_or(result, pair);
				}
			}
		}
		if invert {
			!result
		} else {
			result
		}
	}

	/// The pointwise combination of two enumerated variables under an
	/// arbitrary host-level operation, e.g. indexing one variable by another.
	///
	/// Every pair of admissible values contributes its image under `op`;
	/// pairs mapping to the same image are merged by disjunction. Closure-
	/// parameterised and therefore never memoized; the named arithmetic
	/// operators wrap this with a cache.
	pub fn multi_zip_with<T, U, R: Eq>(
		&mut self,
		a: &MultiVar<T>,
		b: &MultiVar<U>,
		op: impl Fn(&T, &U) -> R,
	) -> MultiVar<R> {
		let mut vals: Vec<(R, BoolVar)> = Vec::new();
		for &(ref av, ab) in &a.vals {
			for &(ref bv, bb) in &b.vals {
				let rv = op(av, bv);
				let rb = self.bool_and(ab, bb);
				match vals.iter().position(|(v, _)| *v == rv) {
					Some(i) => {
						let prev = vals[i].1;
						vals[i].1 = self.bool_or(prev, rb);
					}
					None => vals.push((rv, rb)),
				}
			}
		}
		MultiVar { vals }
	}

	/// Create an enumerated variable over the given values. Duplicates
	/// collapse; with two or more distinct values, exactly one selector is
	/// constrained to be true.
	pub fn new_multi_var<T>(&mut self, values: impl IntoIterator<Item = T>) -> MultiVar<T>
	where
		T: Clone + Eq + Hash,
	{
		let mut seen = HashSet::new();
		let mut distinct = Vec::new();
		for v in values {
			if seen.insert(v.clone()) {
				distinct.push(v);
			}
		}
		match distinct.len() {
			0 => MultiVar { vals: Vec::new() },
			1 => {
				let t = self.bool_const(true);
				MultiVar {
					vals: vec![(distinct.remove(0), t)],
				}
			}
			_ => {
				let vals: Vec<(T, BoolVar)> = distinct
					.into_iter()
					.map(|v| {
						let b = self.new_bool_var();
						(v, b)
					})
					.collect();
				let selectors: Vec<BoolVar> = vals.iter().map(|&(_, b)| b).collect();
				let one = self.exactly(1, &selectors);
				self.require(one);
				MultiVar { vals }
			}
		}
	}

	/// The value of the variable in the most recent solver model, or `None`
	/// when no selector is true, e.g. before solving.
	pub fn value_multi<'a, T>(&self, x: &'a MultiVar<T>) -> Option<&'a T> {
		x.vals
			.iter()
			.find(|&&(_, b)| self.value_bool(b))
			.map(|(v, _)| v)
	}
}
