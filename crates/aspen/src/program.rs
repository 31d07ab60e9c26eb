//! Ground rule program in the solver's internal (smodels) format: literal
//! allocation, the append-only rule buffer, and the peephole simplification of
//! basic rules against facts that are already known to hold.

use std::{
	collections::HashSet,
	fmt::{self, Debug, Formatter},
	io::{self, Write},
	num::NonZeroI32,
	ops::Not,
};

use tracing::trace;

/// The reserved head atom that is false in every model. A basic rule with this
/// head acts as a constraint forbidding its body.
pub const FALSE_HEAD: u32 = 1;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A signed propositional literal. The magnitude identifies the atom, the sign
/// its polarity. Atom `1` is reserved as the false head and never allocated.
pub struct Lit(NonZeroI32);

#[derive(Clone, Debug, Default)]
/// The accumulated ground rule program for one solve cycle.
///
/// Atoms are allocated densely starting at `2`, and rules are kept in creation
/// order, which is also the order in which they are streamed to the solver.
pub struct Program {
	/// Literals that are known to hold unconditionally, used to simplify basic
	/// rules as they are appended.
	facts: HashSet<Lit>,
	/// The number of the most recently allocated atom.
	last_atom: u32,
	/// The rule buffer, in creation order.
	rules: Vec<Rule>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A single ground rule, encoded as the solver's internal format defines it.
pub enum Rule {
	/// `head ← body`: the head holds whenever every body literal holds. With
	/// [`FALSE_HEAD`] as head this is a constraint forbidding the body.
	Basic {
		/// Head atom of the rule.
		head: u32,
		/// Conjunction of body literals.
		body: Vec<Lit>,
	},
	/// `{heads} ← body`: any subset of the heads may hold when the body holds.
	Choice {
		/// Atoms that may freely hold.
		heads: Vec<u32>,
		/// Conjunction of body literals.
		body: Vec<Lit>,
	},
	/// `head ← bound {body}`: the head holds when at least `bound` distinct
	/// body literals hold. Subsumed by [`Rule::Weight`] with unit weights, but
	/// part of the wire format.
	Constraint {
		/// Head atom of the rule.
		head: u32,
		/// Minimum number of satisfied body literals.
		bound: u32,
		/// Body literals counted towards the bound.
		body: Vec<Lit>,
	},
	/// `head ← bound [body]`: as [`Rule::Constraint`], except that repeated
	/// literals are counted with multiplicity. All weights are one here.
	Weight {
		/// Head atom of the rule.
		head: u32,
		/// Minimum total weight of satisfied body literals.
		bound: u32,
		/// Body literals, each carrying weight one.
		body: Vec<Lit>,
	},
}

impl Lit {
	/// The atom number of the literal, i.e. its magnitude.
	pub fn atom(self) -> u32 {
		self.0.get().unsigned_abs()
	}

	/// The raw signed representation of the literal.
	pub fn get(self) -> i32 {
		self.0.get()
	}

	/// Whether the literal has negative polarity.
	pub fn is_negative(self) -> bool {
		self.0.get() < 0
	}

	/// Whether the literal has positive polarity.
	pub fn is_positive(self) -> bool {
		self.0.get() > 0
	}

	/// Create the positive literal for an atom number.
	pub(crate) fn positive(atom: u32) -> Self {
		Self(NonZeroI32::new(atom as i32).expect("atom numbers start at 1"))
	}
}

impl Debug for Lit {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Lit({})", self.0.get())
	}
}

impl Not for Lit {
	type Output = Lit;

	fn not(self) -> Self::Output {
		Lit(NonZeroI32::new(-self.0.get()).expect("negation of a non-zero literal is non-zero"))
	}
}

impl Program {
	/// Append a basic rule `head ← body` after simplifying it against the
	/// known facts. The rule may be dropped entirely.
	pub fn basic(&mut self, head: u32, body: Vec<Lit>) {
		debug_assert!(head >= 1);
		let Some(body) = self.simplify_basic(head, body) else {
			trace!(head, "dropped redundant basic rule");
			return;
		};
		self.rules.push(Rule::Basic { head, body });
	}

	/// Append a choice rule `{heads} ← body`.
	pub fn choice(&mut self, heads: Vec<u32>, body: Vec<Lit>) {
		debug_assert!(heads.iter().all(|&h| h > FALSE_HEAD));
		self.rules.push(Rule::Choice { heads, body });
	}

	/// Append a constraint rule `head ← bound {body}`.
	pub fn constraint(&mut self, head: u32, bound: u32, body: Vec<Lit>) {
		debug_assert!(head >= 1);
		self.rules.push(Rule::Constraint { head, bound, body });
	}

	/// Whether the literal is known to hold unconditionally.
	pub fn is_fact(&self, lit: Lit) -> bool {
		self.facts.contains(&lit)
	}

	/// Whether no rules have been appended.
	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	/// The number of rules in the buffer.
	pub fn len(&self) -> usize {
		self.rules.len()
	}

	/// Allocate a fresh atom and return its positive literal. Atom numbers are
	/// dense and monotonically increasing, starting at `2`.
	pub fn new_lit(&mut self) -> Lit {
		self.last_atom += 1;
		if self.last_atom == FALSE_HEAD {
			self.last_atom += 1;
		}
		Lit::positive(self.last_atom)
	}

	/// The number of the most recently allocated atom.
	pub fn num_atoms(&self) -> u32 {
		self.last_atom
	}

	/// The rules appended so far, in creation order.
	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	/// Simplify a basic rule against the known facts, recording any new fact
	/// it asserts. Returns the simplified body, or `None` when the rule can be
	/// dropped.
	fn simplify_basic(&mut self, head: u32, mut body: Vec<Lit>) -> Option<Vec<Lit>> {
		loop {
			if body.is_empty() {
				// The head is asserted unconditionally.
				if !self.facts.insert(Lit::positive(head)) {
					return None;
				}
				return Some(body);
			}
			if head == FALSE_HEAD && body.len() == 1 {
				// The single body literal is forbidden, so its negation holds.
				if !self.facts.insert(!body[0]) {
					return None;
				}
				return Some(body);
			}
			if head != FALSE_HEAD {
				return Some(body);
			}
			// A longer constraint body: a literal known false makes the rule
			// vacuous, a literal known true is redundant in the body.
			if body.iter().any(|&l| self.facts.contains(&!l)) {
				return None;
			}
			match body.iter().position(|l| self.facts.contains(l)) {
				Some(i) => {
					let _ = body.remove(i);
				}
				None => return Some(body),
			}
		}
	}

	/// Append a weight rule `head ← bound [body]` with unit weights.
	pub fn weight(&mut self, head: u32, bound: u32, body: Vec<Lit>) {
		debug_assert!(head >= 1);
		self.rules.push(Rule::Weight { head, bound, body });
	}

	/// Serialize the complete program in the solver's wire format: one line
	/// per rule, a `0` terminator, the symbol table naming every allocated
	/// atom, and the compute statement requesting a single model.
	pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
		for rule in &self.rules {
			rule.write(w)?;
		}
		writeln!(w, "0")?;
		for atom in 2..=self.last_atom {
			writeln!(w, "{atom} v{atom}")?;
		}
		writeln!(w, "0")?;
		writeln!(w, "B+")?;
		writeln!(w, "0")?;
		writeln!(w, "B-")?;
		writeln!(w, "{FALSE_HEAD}")?;
		writeln!(w, "0")?;
		writeln!(w, "1")
	}
}

impl Rule {
	/// Serialize the rule as one line of space-separated integers.
	fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
		match self {
			Rule::Basic { head, body } => {
				write!(w, "1 {head} {} {}", body.len(), negated(body).count())?;
				write_body(w, body)?;
			}
			Rule::Choice { heads, body } => {
				write!(w, "3 {}", heads.len())?;
				for h in heads {
					write!(w, " {h}")?;
				}
				write!(w, " {} {}", body.len(), negated(body).count())?;
				write_body(w, body)?;
			}
			Rule::Constraint { head, bound, body } => {
				write!(
					w,
					"2 {head} {} {} {bound}",
					body.len(),
					negated(body).count()
				)?;
				write_body(w, body)?;
			}
			Rule::Weight { head, bound, body } => {
				write!(
					w,
					"5 {head} {bound} {} {}",
					body.len(),
					negated(body).count()
				)?;
				write_body(w, body)?;
				for _ in body {
					write!(w, " 1")?;
				}
			}
		}
		writeln!(w)
	}
}

/// The negative literals of a body.
fn negated(body: &[Lit]) -> impl Iterator<Item = Lit> + '_ {
	body.iter().copied().filter(|l| l.is_negative())
}

/// Write a rule body: the atoms of the negative literals first, then the
/// positive ones, as the wire format requires.
fn write_body<W: Write>(w: &mut W, body: &[Lit]) -> io::Result<()> {
	for l in negated(body) {
		write!(w, " {}", l.atom())?;
	}
	for l in body.iter().filter(|l| l.is_positive()) {
		write!(w, " {}", l.atom())?;
	}
	Ok(())
}
