//! Driving the external stable-model solver: spawning the child process,
//! streaming the rule program, and parsing the reported model back into an
//! assignment.

use std::{
	collections::HashSet,
	io::{self, BufRead, BufReader, BufWriter, ErrorKind, Write},
	process::{Command, Stdio},
};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::model::Model;

/// The default command line for the external solver. The flags ask for
/// preprocessing with literal equivalence detection and a dynamic translation
/// of extended rules.
const SOLVER_COMMAND: &[&str] = &["clasp", "--sat-prepro", "--eq=1", "--trans-ext=dynamic"];

#[derive(Error, Debug)]
/// Error type for a solve attempt. An unsatisfiable problem is a normal
/// outcome, not an error.
pub enum SolveError {
	#[error("solver produced no outcome:\n{0}")]
	/// The solver exited without reporting satisfiability either way; its
	/// output is carried verbatim.
	Abnormal(String),
	#[error("the solver command is empty")]
	/// An empty command line was configured.
	EmptyCommand,
	#[error("failed to run the solver process: {0}")]
	/// Spawning or talking to the child process failed.
	Io(#[from] io::Error),
	#[error("malformed model line from solver: {0:?}")]
	/// A reported model line did not consist of `v`-prefixed atom names, or
	/// more than one model line was reported.
	MalformedModel(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Outcome of a solve attempt.
pub enum SolveResult {
	/// A model was found and bound to the variables.
	Satisfied,
	/// The solver proved there is no model.
	Unsatisfiable,
}

#[derive(Debug, Default)]
/// What the solver wrote on its standard output, split into the parts the
/// driver cares about.
struct SolverReport {
	/// Lines that were neither a model nor an outcome token.
	diagnostics: Vec<String>,
	/// The atoms of the reported model, if any line carried one.
	model: Option<HashSet<u32>>,
	/// The verdict token, when one was seen.
	satisfiable: Option<bool>,
}

/// The default solver command line as owned strings.
pub(crate) fn default_solver_command() -> Vec<String> {
	SOLVER_COMMAND.iter().map(|s| (*s).to_owned()).collect()
}

/// Parse the solver's standard output. A line starting with `v` lists the
/// true atoms of a model by their symbol names; the bare tokens `SATISFIABLE`
/// and `UNSATISFIABLE` convey the verdict; everything else is collected for
/// diagnostics.
fn read_report<R: BufRead>(reader: R) -> Result<SolverReport, SolveError> {
	let mut report = SolverReport::default();
	for line in reader.lines() {
		let line = line?;
		if line.starts_with('v') {
			// A single model is requested, so a second model line means the
			// output is malformed.
			if report.model.is_some() {
				return Err(SolveError::MalformedModel(line));
			}
			let mut atoms = HashSet::new();
			for token in line.split_whitespace() {
				let atom = token
					.strip_prefix('v')
					.and_then(|n| n.parse::<u32>().ok())
					.ok_or_else(|| SolveError::MalformedModel(line.clone()))?;
				let _ = atoms.insert(atom);
			}
			report.model = Some(atoms);
		} else if line.trim() == "SATISFIABLE" {
			report.satisfiable = Some(true);
		} else if line.trim() == "UNSATISFIABLE" {
			report.satisfiable = Some(false);
		} else if !line.trim().is_empty() {
			report.diagnostics.push(line);
		}
	}
	Ok(report)
}

impl Model {
	/// Solve the accumulated program with the external solver.
	///
	/// The whole rule buffer is streamed to the child process, its reported
	/// model (if any) is bound to the constructed variables for readout, and
	/// the verdict is returned. The solver may close its input early when
	/// unsatisfiability is obvious from a prefix of the program; that is
	/// reported as a normal unsatisfiable outcome.
	pub fn solve(&mut self) -> Result<SolveResult, SolveError> {
		info!(
			literals = self.num_literals(),
			rules = self.num_rules(),
			"starting the solver"
		);
		debug!(
			memoized = self.memo.len(),
			"expression cache at solve time"
		);
		let (command, args) = self
			.solver_command()
			.split_first()
			.ok_or(SolveError::EmptyCommand)?;
		let mut child = Command::new(command)
			.args(args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.spawn()?;
		let stdin = child.stdin.take().expect("stdin was requested as piped");
		let streamed = {
			let mut writer = BufWriter::new(stdin);
			self.program.write(&mut writer).and_then(|()| writer.flush())
		};
		if let Err(e) = streamed {
			if e.kind() == ErrorKind::BrokenPipe {
				debug!("solver closed its input early");
				let _ = child.wait();
				return Ok(SolveResult::Unsatisfiable);
			}
			return Err(e.into());
		}
		let stdout = child.stdout.take().expect("stdout was requested as piped");
		let report = read_report(BufReader::new(stdout))?;
		let _status = child.wait()?;
		// The verdict token only drives reporting; whether a model line was
		// seen decides the returned outcome.
		match report.satisfiable {
			Some(satisfiable) => debug!(satisfiable, "solver verdict"),
			None => {
				for line in &report.diagnostics {
					error!("solver: {line}");
				}
				if report.model.is_none() {
					return Err(SolveError::Abnormal(report.diagnostics.join("\n")));
				}
			}
		}
		let result = match report.model {
			Some(model) => {
				self.set_assignment(model);
				SolveResult::Satisfied
			}
			None => SolveResult::Unsatisfiable,
		};
		if result == SolveResult::Satisfied {
			for (x, label) in self.checks() {
				if !self.value_bool(*x) {
					warn!("failed constraint: {label}");
				}
			}
		}
		info!(?result, "solver finished");
		Ok(result)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use crate::solver::{read_report, SolveError};

	#[test]
	fn test_parse_satisfiable_report() {
		let output = "clasp version 3\nc Answer: 1\nv2 v5 v7\nSATISFIABLE\n";
		let report = read_report(Cursor::new(output)).unwrap();
		assert_eq!(report.satisfiable, Some(true));
		let model = report.model.unwrap();
		assert_eq!(model.len(), 3);
		assert!(model.contains(&2));
		assert!(model.contains(&5));
		assert!(model.contains(&7));
	}

	#[test]
	fn test_parse_unsatisfiable_report() {
		let output = "some banner\nUNSATISFIABLE\n";
		let report = read_report(Cursor::new(output)).unwrap();
		assert_eq!(report.satisfiable, Some(false));
		assert!(report.model.is_none());
		assert_eq!(report.diagnostics, ["some banner"]);
	}

	#[test]
	fn test_parse_malformed_model_line() {
		let output = "v2 vX\n";
		assert!(read_report(Cursor::new(output)).is_err());
	}

	#[test]
	fn test_second_model_line_is_rejected() {
		let output = "v2 v3\nv2\nUNSATISFIABLE\n";
		assert!(matches!(
			read_report(Cursor::new(output)),
			Err(SolveError::MalformedModel(_))
		));
	}

	#[test]
	fn test_substring_verdicts_are_not_confused() {
		// `UNSATISFIABLE` contains `SATISFIABLE`; only exact token lines
		// count.
		let output = "UNSATISFIABLE\n";
		let report = read_report(Cursor::new(output)).unwrap();
		assert_eq!(report.satisfiable, Some(false));
	}
}
