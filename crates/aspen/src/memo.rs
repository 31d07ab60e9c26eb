//! Memoization of derived sub-expressions, keyed by structural hashes of the
//! operand variables. Repeated construction of the same sub-expression (very
//! common in grid-shaped problems) then reuses the literal allocated the first
//! time instead of emitting duplicate rules.

use std::{
	any::Any,
	collections::HashMap,
	fmt::{self, Debug, Formatter},
	hash::{DefaultHasher, Hash, Hasher},
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// A cache key: the operation together with the structural hashes of its
/// arguments, in argument order for ordered operations and sorted for
/// symmetric ones.
pub(crate) struct MemoKey {
	/// The operation being cached.
	op: Op,
	/// Structural hashes of the operands.
	args: Box<[u64]>,
}

#[derive(Default)]
/// A table of memoized operation results, owned by the model and dropped with
/// it. Results are stored type-erased since enumerated-value operations are
/// generic over the host value type.
pub(crate) struct MemoTable {
	/// The type-erased result per key.
	map: HashMap<MemoKey, Box<dyn Any>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Identifier of a memoizable operation.
pub(crate) enum Op {
	/// Boolean conjunction.
	BoolAnd,
	/// Boolean conditional selection.
	BoolCond,
	/// Boolean equivalence.
	BoolEq,
	/// Boolean strict order.
	BoolGt,
	/// Boolean disjunction.
	BoolOr,
	/// Boolean exclusive disjunction.
	BoolXor,
	/// Integer addition.
	IntAdd,
	/// Integer conditional selection.
	IntCond,
	/// Integer equality.
	IntEq,
	/// Integer strict order.
	IntGt,
	/// Integer multiplication.
	IntMul,
	/// Integer left shift by a constant.
	IntShl,
	/// Integer right shift by a constant.
	IntShr,
	/// Integer subtraction.
	IntSub,
	/// Enumerated-value addition.
	MultiAdd,
	/// Enumerated-value conditional selection.
	MultiCond,
	/// Enumerated-value division.
	MultiDiv,
	/// Enumerated-value equality.
	MultiEq,
	/// Enumerated-value strict order.
	MultiGt,
	/// Enumerated-value multiplication.
	MultiMul,
	/// Enumerated-value subtraction.
	MultiSub,
}

/// Types with a canonical structural hash for memoization. Two operands with
/// equal fingerprints are interchangeable in any derived expression.
pub(crate) trait Fingerprint {
	/// The structural hash of the value.
	fn fingerprint(&self) -> u64;
}

/// Hash an arbitrary value with the default hasher.
pub(crate) fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
	let mut hasher = DefaultHasher::new();
	value.hash(&mut hasher);
	hasher.finish()
}

impl MemoKey {
	/// A key that preserves argument order.
	pub(crate) fn ordered(op: Op, args: impl IntoIterator<Item = u64>) -> Self {
		Self {
			op,
			args: args.into_iter().collect(),
		}
	}

	/// A key for operations where argument order does not matter: the
	/// argument hashes are sorted before keying.
	pub(crate) fn symmetric(op: Op, args: impl IntoIterator<Item = u64>) -> Self {
		let mut args: Box<[u64]> = args.into_iter().collect();
		args.sort_unstable();
		Self { op, args }
	}
}

impl MemoTable {
	/// Look up a previously cached result.
	pub(crate) fn get<R: Clone + 'static>(&self, key: &MemoKey) -> Option<R> {
		self.map.get(key).and_then(|r| r.downcast_ref()).cloned()
	}

	/// Cache a result and hand it back for tail-position use.
	pub(crate) fn insert<R: Clone + 'static>(&mut self, key: MemoKey, result: R) -> R {
		let _ = self.map.insert(key, Box::new(result.clone()));
		result
	}

	/// The number of cached results.
	pub(crate) fn len(&self) -> usize {
		self.map.len()
	}
}

impl Debug for MemoTable {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoTable")
			.field("entries", &self.map.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use crate::memo::{hash_one, MemoKey, MemoTable, Op};

	#[test]
	fn test_symmetric_key_sorts_arguments() {
		let a = hash_one(&3_i32);
		let b = hash_one(&7_i32);
		assert_eq!(
			MemoKey::symmetric(Op::BoolAnd, [a, b]),
			MemoKey::symmetric(Op::BoolAnd, [b, a])
		);
		assert_ne!(
			MemoKey::ordered(Op::BoolGt, [a, b]),
			MemoKey::ordered(Op::BoolGt, [b, a])
		);
	}

	#[test]
	fn test_key_distinguishes_operations() {
		let a = hash_one(&3_i32);
		assert_ne!(
			MemoKey::symmetric(Op::BoolAnd, [a, a]),
			MemoKey::symmetric(Op::BoolOr, [a, a])
		);
	}

	#[test]
	fn test_table_round_trip() {
		let mut table = MemoTable::default();
		let key = MemoKey::ordered(Op::IntShl, [hash_one(&1_u32), hash_one(&2_usize)]);
		assert_eq!(table.get::<u32>(&key), None);
		assert_eq!(table.insert(key.clone(), 42_u32), 42);
		assert_eq!(table.get::<u32>(&key), Some(42));
		assert_eq!(table.len(), 1);
	}
}
