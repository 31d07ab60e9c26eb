//! Bounded non-negative integer variables, represented as bit slices of
//! boolean variables, and their lowering to ground rules.

use crate::{
	helpers::fits,
	memo::{hash_one, Fingerprint, MemoKey, Op},
	model::{bool::BoolVar, Conditional, Model, ModelEq, ModelError},
	IntVal,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// An integer decision variable in `[0, 2^num_bits)`, stored as its bits in
/// least-significant-first order.
///
/// Every integer variable shares the bit width of the model that created it.
/// Individual bits may be bound to the constant sentinels, which the operator
/// lowerings exploit to skip work that is known at construction time.
pub struct IntVar {
	/// The bits of the variable, least significant first.
	bits: Vec<BoolVar>,
}

impl IntVar {
	/// The bits of the variable, least significant first.
	pub fn bits(&self) -> &[BoolVar] {
		&self.bits
	}

	/// Assemble a variable from previously constructed bits.
	pub(crate) fn from_bits(bits: Vec<BoolVar>) -> Self {
		Self { bits }
	}
}

impl Fingerprint for IntVar {
	fn fingerprint(&self) -> u64 {
		let lits: Vec<i32> = self.bits.iter().map(|b| b.lit().get()).collect();
		hash_one(&("int", lits))
	}
}

impl Conditional for IntVar {
	fn select(model: &mut Model, pred: BoolVar, cons: &Self, alt: &Self) -> Self {
		model.int_cond(pred, cons, alt)
	}
}

impl ModelEq for IntVar {
	fn model_eq(model: &mut Model, a: &Self, b: &Self) -> BoolVar {
		model.int_eq(a, b)
	}
}

impl Model {
	/// Constrain `a + b == out` with a ripple-carry adder.
	///
	/// The final carry is forbidden, so the sum must be representable in the
	/// model's bit width even when the result is never used elsewhere. The
	/// carry chain stops early once every remaining bit of the operands and
	/// the result is known to be zero.
	fn constrain_sum(&mut self, a: &IntVar, b: &IntVar, out: &IntVar) {
		let f = self.bool_const(false);
		let highest = |bits: &[BoolVar], carry_room: usize| {
			bits.iter()
				.enumerate()
				.rev()
				.find(|(_, &bit)| bit != f)
				.map(|(i, _)| i + carry_room)
		};
		let max_bit = [highest(a.bits(), 1), highest(b.bits(), 1), highest(out.bits(), 0)]
			.into_iter()
			.flatten()
			.max();
		let Some(max_bit) = max_bit else {
			// Every bit of both operands and the result is known zero.
			return;
		};
		let mut carry = f;
		for i in 0..self.num_bits() as usize {
			let d = self.bool_xor(a.bits[i], b.bits[i]);
			let s = self.bool_xor(d, carry);
			let eq = self.bool_eq(out.bits[i], s);
			self.require(eq);
			if i == max_bit {
				// The remaining bits are all known zero.
				return;
			}
			let g = self.bool_and(a.bits[i], b.bits[i]);
			let p = self.bool_and(d, carry);
			carry = self.bool_or(g, p);
		}
		let no_overflow = !carry;
		self.require(no_overflow);
	}

	/// The sum of two integer variables. Overflow beyond the bit width is
	/// forbidden in every model.
	pub fn int_add(&mut self, a: &IntVar, b: &IntVar) -> IntVar {
		let key = MemoKey::symmetric(Op::IntAdd, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let f = self.bool_const(false);
		// Only allocate bits up to one above the highest operand bit; the
		// rest of the result is known zero.
		let max_bit = a
			.bits
			.iter()
			.zip(&b.bits)
			.enumerate()
			.rev()
			.find(|(_, (&x, &y))| x != f || y != f)
			.map(|(i, _)| i);
		let bits = (0..self.num_bits() as usize)
			.map(|i| {
				if max_bit.is_some_and(|m| i <= m + 1) {
					self.new_bool_var()
				} else {
					f
				}
			})
			.collect();
		let out = IntVar::from_bits(bits);
		self.constrain_sum(a, b, &out);
		self.memo.insert(key, out)
	}

	/// A variable equal to `cons` when `pred` holds and to `alt` otherwise,
	/// selected bit by bit.
	pub fn int_cond(&mut self, pred: BoolVar, cons: &IntVar, alt: &IntVar) -> IntVar {
		if pred == self.bool_const(true) {
			return cons.clone();
		}
		if pred == self.bool_const(false) {
			return alt.clone();
		}
		let key = MemoKey::ordered(
			Op::IntCond,
			[pred.fingerprint(), cons.fingerprint(), alt.fingerprint()],
		);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let mut bits = Vec::with_capacity(cons.bits.len());
		for (&c, &a) in cons.bits.iter().zip(&alt.bits) {
			bits.push(self.bool_cond(pred, c, a));
		}
		self.memo.insert(key, IntVar::from_bits(bits))
	}

	/// Whether two integer variables take the same value: the conjunction of
	/// the per-bit equivalences.
	pub fn int_eq(&mut self, a: &IntVar, b: &IntVar) -> BoolVar {
		let key = MemoKey::symmetric(Op::IntEq, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let mut result = self.bool_const(true);
		for (&x, &y) in a.bits.iter().zip(&b.bits) {
			let eq = self.bool_eq(x, y);
			result = self.bool_and(result, eq);
		}
		self.memo.insert(key, result)
	}

	/// Whether `a` is greater or equal to `b`.
	pub fn int_ge(&mut self, a: &IntVar, b: &IntVar) -> BoolVar {
		!self.int_lt(a, b)
	}

	/// Whether `a` is strictly greater than `b`.
	///
	/// Scans the bits from least to most significant: the most significant
	/// bit position where the operands differ decides the comparison.
	pub fn int_gt(&mut self, a: &IntVar, b: &IntVar) -> BoolVar {
		let key = MemoKey::ordered(Op::IntGt, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let t = self.bool_const(true);
		let f = self.bool_const(false);
		let mut result = f;
		for (&x, &y) in a.bits.iter().zip(&b.bits) {
			let gt = self.bool_gt(x, y);
			let lt = self.bool_lt(x, y);
			let tail = self.bool_cond(lt, f, result);
			result = self.bool_cond(gt, t, tail);
		}
		self.memo.insert(key, result)
	}

	/// Whether `a` is less or equal to `b`.
	pub fn int_le(&mut self, a: &IntVar, b: &IntVar) -> BoolVar {
		!self.int_gt(a, b)
	}

	/// Whether `a` is strictly less than `b`.
	pub fn int_lt(&mut self, a: &IntVar, b: &IntVar) -> BoolVar {
		self.int_gt(b, a)
	}

	/// The product of two integer variables, computed by shift-and-add. Every
	/// intermediate sum forbids overflow.
	pub fn int_mul(&mut self, a: &IntVar, b: &IntVar) -> IntVar {
		let key = MemoKey::symmetric(Op::IntMul, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let mut acc = self.int_zero();
		for i in 0..self.num_bits() {
			let shifted = self.int_shl(a, i);
			let zero = self.int_zero();
			let term = self.int_cond(b.bits[i as usize], &shifted, &zero);
			acc = self.int_add(&acc, &term);
		}
		self.memo.insert(key, acc)
	}

	/// Whether two integer variables take different values.
	pub fn int_ne(&mut self, a: &IntVar, b: &IntVar) -> BoolVar {
		!self.int_eq(a, b)
	}

	/// `a` shifted left by a compile-time constant number of bits. The
	/// topmost bits fall off; shifting by the full width or more yields zero.
	pub fn int_shl(&mut self, a: &IntVar, n: u32) -> IntVar {
		if n == 0 {
			return a.clone();
		}
		if n >= self.num_bits() {
			return self.int_zero();
		}
		let key = MemoKey::ordered(Op::IntShl, [a.fingerprint(), hash_one(&n)]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let f = self.bool_const(false);
		let keep = self.num_bits() as usize - n as usize;
		let bits = std::iter::repeat(f)
			.take(n as usize)
			.chain(a.bits[..keep].iter().copied())
			.collect();
		self.memo.insert(key, IntVar::from_bits(bits))
	}

	/// `a` shifted right by a compile-time constant number of bits.
	pub fn int_shr(&mut self, a: &IntVar, n: u32) -> IntVar {
		if n == 0 {
			return a.clone();
		}
		if n >= self.num_bits() {
			return self.int_zero();
		}
		let key = MemoKey::ordered(Op::IntShr, [a.fingerprint(), hash_one(&n)]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let f = self.bool_const(false);
		let bits = a.bits[n as usize..]
			.iter()
			.copied()
			.chain(std::iter::repeat(f).take(n as usize))
			.collect();
		self.memo.insert(key, IntVar::from_bits(bits))
	}

	/// The difference `a - b`, expressed as the fresh variable `r` with
	/// `r + b == a`. Since overflow is forbidden, this makes every model
	/// where `a < b` unsatisfiable.
	pub fn int_sub(&mut self, a: &IntVar, b: &IntVar) -> IntVar {
		let key = MemoKey::ordered(Op::IntSub, [a.fingerprint(), b.fingerprint()]);
		if let Some(r) = self.memo.get(&key) {
			return r;
		}
		let out = self.new_int_var();
		self.constrain_sum(&out, b, a);
		self.memo.insert(key, out)
	}

	/// The all-zero integer. No literal is allocated and no rule is emitted.
	pub(crate) fn int_zero(&self) -> IntVar {
		IntVar::from_bits(vec![self.bool_const(false); self.num_bits() as usize])
	}

	/// Create an integer variable holding a fixed value, with every bit bound
	/// to a constant sentinel.
	pub fn new_int_const(&mut self, value: IntVal) -> Result<IntVar, ModelError> {
		if !fits(value, self.num_bits()) {
			return Err(ModelError::OutOfRange {
				value,
				bits: self.num_bits(),
			});
		}
		let bits = (0..self.num_bits())
			.map(|i| self.bool_const((value >> i) & 1 == 1))
			.collect();
		Ok(IntVar::from_bits(bits))
	}

	/// Create an integer variable that is equal to the given boolean: the
	/// lowest bit is the boolean itself and all other bits are zero.
	pub fn new_int_from_bool(&mut self, b: BoolVar) -> IntVar {
		let f = self.bool_const(false);
		let mut bits = vec![f; self.num_bits() as usize];
		if let Some(lowest) = bits.first_mut() {
			*lowest = b;
		}
		IntVar::from_bits(bits)
	}

	/// Create an integer variable restricted to one of the listed values.
	pub fn new_int_in(&mut self, values: &[IntVal]) -> Result<IntVar, ModelError> {
		if values.is_empty() {
			return Err(ModelError::EmptyDomain);
		}
		let candidates = values
			.iter()
			.map(|&v| self.new_int_const(v))
			.collect::<Result<Vec<_>, _>>()?;
		let out = self.new_int_var();
		let member = self.var_in(&out, &candidates);
		self.require(member);
		Ok(out)
	}

	/// Create an integer variable constrained to `lo..=hi`. Bits above the
	/// highest bit of `hi` are bound to zero rather than allocated.
	pub fn new_int_range(&mut self, lo: IntVal, hi: IntVal) -> Result<IntVar, ModelError> {
		if hi < lo {
			return Err(ModelError::InvalidRange { lo, hi });
		}
		if !fits(hi, self.num_bits()) {
			return Err(ModelError::OutOfRange {
				value: hi,
				bits: self.num_bits(),
			});
		}
		let f = self.bool_const(false);
		let bits = (0..self.num_bits())
			.map(|i| if hi >> i == 0 { f } else { self.new_bool_var() })
			.collect();
		let out = IntVar::from_bits(bits);
		if lo > 0 {
			let lo_const = self.new_int_const(lo)?;
			let ge = self.int_ge(&out, &lo_const);
			self.require(ge);
		}
		let hi_const = self.new_int_const(hi)?;
		let le = self.int_le(&out, &hi_const);
		self.require(le);
		Ok(out)
	}

	/// Create an integer variable that may take any representable value.
	pub fn new_int_var(&mut self) -> IntVar {
		let bits = (0..self.num_bits()).map(|_| self.new_bool_var()).collect();
		IntVar::from_bits(bits)
	}

	/// The sum of a list of integer variables, combined as a balanced tree so
	/// intermediate sums stay as narrow as possible. An empty list sums to
	/// zero.
	pub fn sum_ints(&mut self, vars: &[IntVar]) -> IntVar {
		match vars {
			[] => self.int_zero(),
			[x] => x.clone(),
			_ => {
				let mid = vars.len() / 2;
				let left = self.sum_ints(&vars[..mid]);
				let right = self.sum_ints(&vars[mid..]);
				self.int_add(&left, &right)
			}
		}
	}

	/// The value of the variable in the most recent solver model.
	pub fn value_int(&self, x: &IntVar) -> IntVal {
		x.bits
			.iter()
			.enumerate()
			.filter(|(_, &bit)| self.value_bool(bit))
			.map(|(i, _)| 1 << i)
			.sum()
	}
}

#[cfg(test)]
mod tests {
	use crate::{Model, ModelError};

	#[test]
	fn test_const_round_trip() {
		let mut m = Model::new();
		let a = m.new_int_const(22).unwrap();
		// Constant bits are sentinels, readable without solving.
		assert_eq!(m.value_int(&a), 22);
		assert_eq!(m.num_literals(), 2);
	}

	#[test]
	fn test_const_out_of_range() {
		let mut m = Model::new();
		m.set_bits(3).unwrap();
		assert!(m.new_int_const(7).is_ok());
		assert_eq!(
			m.new_int_const(8),
			Err(ModelError::OutOfRange { value: 8, bits: 3 })
		);
	}

	#[test]
	fn test_range_validation() {
		let mut m = Model::new();
		assert_eq!(
			m.new_int_range(9, 1),
			Err(ModelError::InvalidRange { lo: 9, hi: 1 })
		);
		let mut m = Model::new();
		m.set_bits(4).unwrap();
		assert!(matches!(
			m.new_int_range(0, 16),
			Err(ModelError::OutOfRange { value: 16, bits: 4 })
		));
	}

	#[test]
	fn test_range_trims_high_bits() {
		let mut m = Model::new();
		let a = m.new_int_range(1, 5).unwrap();
		let f = m.bool_const(false);
		// Only the three bits needed for the upper bound are allocated.
		assert!(a.bits()[..3].iter().all(|&b| b != f));
		assert!(a.bits()[3..].iter().all(|&b| b == f));
	}

	#[test]
	fn test_eq_of_constants_folds() {
		let mut m = Model::new();
		let a = m.new_int_const(5).unwrap();
		let b = m.new_int_const(5).unwrap();
		let c = m.new_int_const(6).unwrap();
		let before = m.num_rules();
		assert_eq!(m.int_eq(&a, &b), m.bool_const(true));
		assert_eq!(m.int_eq(&a, &c), m.bool_const(false));
		assert_eq!(m.num_rules(), before);
	}

	#[test]
	fn test_gt_of_constants_folds() {
		let mut m = Model::new();
		let a = m.new_int_const(5).unwrap();
		let b = m.new_int_const(3).unwrap();
		let t = m.bool_const(true);
		let f = m.bool_const(false);
		assert_eq!(m.int_gt(&a, &b), t);
		assert_eq!(m.int_gt(&b, &a), f);
		assert_eq!(m.int_lt(&b, &a), t);
		assert_eq!(m.int_ge(&a, &a), t);
		assert_eq!(m.int_le(&a, &b), f);
	}

	#[test]
	fn test_add_of_constants_pins_result_bits() {
		let mut m = Model::new();
		let a = m.new_int_const(22).unwrap();
		let b = m.new_int_const(15).unwrap();
		let c = m.int_add(&a, &b);
		// 22 + 15 = 37 = 0b100101; the adder folds each result bit to a
		// recorded fact.
		for (i, &bit) in c.bits().iter().enumerate() {
			let expected = (37 >> i) & 1 == 1;
			if expected {
				assert!(m.program.is_fact(bit.lit()), "bit {i} should be true");
			} else {
				assert!(m.program.is_fact(!bit.lit()), "bit {i} should be false");
			}
		}
	}

	#[test]
	fn test_add_memoized_symmetrically() {
		let mut m = Model::new();
		let a = m.new_int_var();
		let b = m.new_int_var();
		let c1 = m.int_add(&a, &b);
		let rules = m.num_rules();
		let lits = m.num_literals();
		let c2 = m.int_add(&b, &a);
		assert_eq!(c1, c2);
		assert_eq!(m.num_rules(), rules);
		assert_eq!(m.num_literals(), lits);
	}

	#[test]
	fn test_shifts_on_constants() {
		let mut m = Model::new();
		let a = m.new_int_const(3).unwrap();
		let left = m.int_shl(&a, 2);
		assert_eq!(m.value_int(&left), 12);
		let b = m.new_int_const(15).unwrap();
		let right = m.int_shr(&b, 2);
		assert_eq!(m.value_int(&right), 3);
		let gone = m.int_shl(&a, 16);
		assert_eq!(m.value_int(&gone), 0);
		let same = m.int_shr(&b, 0);
		assert_eq!(&same, &b);
	}

	#[test]
	fn test_shift_round_trip_on_low_constant() {
		let mut m = Model::new();
		let a = m.new_int_const(9).unwrap();
		let up = m.int_shl(&a, 4);
		let back = m.int_shr(&up, 4);
		assert_eq!(m.value_int(&back), 9);
		assert_eq!(&back, &a);
	}

	#[test]
	fn test_mul_by_zero_folds_entirely() {
		let mut m = Model::new();
		let a = m.new_int_var();
		let zero = m.new_int_const(0).unwrap();
		let before = (m.num_rules(), m.num_literals());
		let c = m.int_mul(&a, &zero);
		assert_eq!((m.num_rules(), m.num_literals()), before);
		assert_eq!(m.value_int(&c), 0);
	}

	#[test]
	fn test_mul_memoized_symmetrically() {
		let mut m = Model::new();
		m.set_bits(4).unwrap();
		let a = m.new_int_var();
		let b = m.new_int_var();
		let c1 = m.int_mul(&a, &b);
		let rules = m.num_rules();
		let c2 = m.int_mul(&b, &a);
		assert_eq!(c1, c2);
		assert_eq!(m.num_rules(), rules);
	}

	#[test]
	fn test_cond_folds_constant_predicate() {
		let mut m = Model::new();
		let a = m.new_int_const(5).unwrap();
		let b = m.new_int_const(22).unwrap();
		let t = m.bool_const(true);
		let f = m.bool_const(false);
		let before = (m.num_rules(), m.num_literals());
		let chosen = m.int_cond(t, &a, &b);
		assert_eq!(m.value_int(&chosen), 5);
		let chosen = m.int_cond(f, &a, &b);
		assert_eq!(m.value_int(&chosen), 22);
		assert_eq!((m.num_rules(), m.num_literals()), before);
	}

	#[test]
	fn test_int_from_bool() {
		let mut m = Model::new();
		let b = m.new_bool_var();
		let x = m.new_int_from_bool(b);
		assert_eq!(x.bits()[0], b);
		let f = m.bool_const(false);
		assert!(x.bits()[1..].iter().all(|&bit| bit == f));
	}

	#[test]
	fn test_empty_value_list_is_rejected() {
		let mut m = Model::new();
		assert_eq!(m.new_int_in(&[]), Err(ModelError::EmptyDomain));
	}

	#[test]
	fn test_sum_ints_degenerate_cases() {
		let mut m = Model::new();
		let before = m.num_rules();
		let empty = m.sum_ints(&[]);
		assert_eq!(m.value_int(&empty), 0);
		let a = m.new_int_var();
		let single = m.sum_ints(std::slice::from_ref(&a));
		assert_eq!(single, a);
		assert_eq!(m.num_rules(), before + m.num_bits() as usize);
	}
}
