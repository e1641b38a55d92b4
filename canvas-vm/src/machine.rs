//! # Virtual machine
//!
//! Ties the stages together: source text is scanned, compiled and then
//! interpreted against a [`Runtime`]. Diagnostics from every stage are
//! collected into one report and latch the machine's error flag until
//! [`VirtualMachine::clear_error`].

use crate::config::VmConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::Result;
use crate::interpreter::{Interpreter, Outcome};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::runtime::Runtime;
use crate::storage::{DumpStore, FileDumps, MemoryDumps, BYTECODE_DUMP, TOKENS_DUMP};
use crate::token::Token;

/// Result of compiling without running
#[derive(Debug)]
pub struct Compilation {
    pub tokens: Vec<Token>,
    pub bytecode: Vec<u8>,
    pub diagnostics: Diagnostics,
}

impl Compilation {
    pub fn is_ok(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Result of one `run`
#[derive(Debug)]
pub struct RunReport {
    pub bytecode: Vec<u8>,
    /// `None` when compile errors stopped the run before interpretation
    pub outcome: Option<Outcome>,
    pub diagnostics: Diagnostics,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_errors() && self.outcome.is_some_and(|o| o.is_completed())
    }
}

pub struct VirtualMachine {
    config: VmConfig,
    interpreter: Interpreter,
    had_error: bool,
}

impl VirtualMachine {
    pub fn new(config: VmConfig) -> Result<Self> {
        config.validate()?;
        let dumps: Box<dyn DumpStore> = match &config.dump_dir {
            Some(dir) => Box::new(FileDumps::new(dir)?),
            None => Box::new(MemoryDumps::new()),
        };
        let interpreter = Interpreter::with_dumps(config.stack_capacity, dumps);
        tracing::debug!(
            stack_capacity = config.stack_capacity,
            dumps = interpreter.dumps().backend_name(),
            "virtual machine ready"
        );
        Ok(Self {
            config,
            interpreter,
            had_error: false,
        })
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn clear_error(&mut self) {
        self.had_error = false;
    }

    /// Drop the value stack and every variable binding. The error flag is
    /// left as is; see [`VirtualMachine::clear_error`].
    pub fn reset(&mut self) {
        self.interpreter.reset();
    }

    /// Scan and compile `source`
    pub fn compile(&mut self, source: &str) -> Compilation {
        let mut diagnostics = Diagnostics::new();
        let tokens = Lexer::new(source, &mut diagnostics).scan_tokens();
        let compiled = Parser::new(&tokens, &self.config, &mut diagnostics).parse();

        if diagnostics.has_errors() {
            self.had_error = true;
        }
        Compilation {
            tokens,
            bytecode: compiled.bytecode,
            diagnostics,
        }
    }

    /// Compile `source` and interpret it against `runtime`
    pub fn run(&mut self, source: &str, runtime: &mut dyn Runtime) -> RunReport {
        let Compilation {
            tokens,
            bytecode,
            mut diagnostics,
        } = self.compile(source);
        // host errors from the dumps below are not compile errors
        let compile_failed = diagnostics.has_errors();
        self.write_artifacts(&tokens, &bytecode, &mut diagnostics);

        let outcome = if compile_failed && !self.config.interpret_on_compile_error {
            tracing::info!(errors = diagnostics.len(), "compile errors, skipping interpretation");
            None
        } else {
            Some(self.interpreter.interpret(&bytecode, runtime, &mut diagnostics))
        };

        if diagnostics.has_errors() {
            self.had_error = true;
        }
        RunReport {
            bytecode,
            outcome,
            diagnostics,
        }
    }

    fn write_artifacts(&mut self, tokens: &[Token], bytecode: &[u8], diagnostics: &mut Diagnostics) {
        if self.config.dump_tokens {
            let listing: String = tokens.iter().map(|t| format!("{}\n", t)).collect();
            if let Err(e) = self.interpreter.dumps_mut().write(TOKENS_DUMP, listing.as_bytes()) {
                diagnostics.report(Diagnostic::host(e.with_operation("machine::dump_tokens")));
            }
        }
        if self.config.dump_bytecode {
            if let Err(e) = self.interpreter.dumps_mut().write(BYTECODE_DUMP, bytecode) {
                diagnostics.report(Diagnostic::host(e.with_operation("machine::dump_bytecode")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::error::{ErrorKind, Stage};
    use crate::runtime::{Call, RecordingRuntime};
    use crate::storage::ABORT_DUMP;
    use crate::value::Value;

    fn machine() -> VirtualMachine {
        VirtualMachine::new(VmConfig::default()).unwrap()
    }

    #[test]
    fn test_run_fill() {
        let mut vm = machine();
        let mut runtime = RecordingRuntime::default();
        let report = vm.run("fill(#ff0000)", &mut runtime);

        assert!(report.is_success());
        assert_eq!(report.bytecode, vec![0x11, 0xFF, 0x00, 0x00, 0xFF, 0x20]);
        assert_eq!(runtime.calls(), &[Call::Fill(Color::rgb(255, 0, 0)), Call::Redraw]);
        assert!(!vm.had_error());
    }

    #[test]
    fn test_compile_only() {
        let mut vm = machine();
        let compilation = vm.compile("getwidth()");
        assert!(compilation.is_ok());
        assert_eq!(compilation.bytecode, vec![0x42]);
        assert_eq!(compilation.tokens.len(), 4);
        assert_eq!(vm.interpreter().stack().len(), 0);
    }

    #[test]
    fn test_compile_error_still_interprets_by_default() {
        let mut vm = machine();
        let mut runtime = RecordingRuntime::default();
        let report = vm.run("unknownfn(1); fill(#000)", &mut runtime);

        assert!(vm.had_error());
        assert!(report.outcome.is_some());
        assert_eq!(report.diagnostics.of_stage(Stage::Parse).count(), 1);
        assert_eq!(runtime.redraws(), 1);
    }

    #[test]
    fn test_compile_error_can_skip_interpretation() {
        let config = VmConfig {
            interpret_on_compile_error: false,
            ..VmConfig::default()
        };
        let mut vm = VirtualMachine::new(config).unwrap();
        let mut runtime = RecordingRuntime::default();
        let report = vm.run("fill(@)", &mut runtime);

        assert!(report.outcome.is_none());
        assert_eq!(runtime.calls().len(), 0);
        assert!(!report.is_success());
    }

    #[test]
    fn test_runtime_error_sets_flag_until_cleared() {
        let mut vm = machine();
        let mut runtime = RecordingRuntime::default();
        let report = vm.run("var x = getpixel(1, 2); fill(x); fill(1)", &mut runtime);

        assert!(matches!(
            report.outcome,
            Some(Outcome::Aborted { kind: ErrorKind::TypeMismatch, .. })
        ));
        assert!(vm.had_error());
        assert!(vm.interpreter().dumps().read(ABORT_DUMP).is_some());

        vm.clear_error();
        assert!(!vm.had_error());
        let report = vm.run("fill(#fff)", &mut runtime);
        assert!(report.is_success());
        assert!(!vm.had_error());
    }

    #[test]
    fn test_state_persists_between_runs_until_reset() {
        let mut vm = machine();
        let mut runtime = RecordingRuntime::default();
        vm.run("getwidth()", &mut runtime);
        vm.run("getheight()", &mut runtime);
        assert_eq!(
            vm.interpreter().stack().as_slice(),
            &[Value::Integer(640), Value::Integer(480)]
        );

        vm.reset();
        assert!(vm.interpreter().stack().is_empty());
    }

    #[test]
    fn test_reset_keeps_error_flag() {
        let mut vm = machine();
        vm.compile("unknownfn()");
        assert!(vm.had_error());

        vm.reset();
        assert!(vm.had_error());
        vm.clear_error();
        assert!(!vm.had_error());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = VmConfig {
            stack_capacity: 0,
            ..VmConfig::default()
        };
        let err = VirtualMachine::new(config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_oversized_stack_rejected() {
        let config: VmConfig =
            serde_json::from_str(r#"{"stack_capacity": 18446744073709551615}"#).unwrap();
        let err = VirtualMachine::new(config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_dump_failure_does_not_skip_interpretation() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(BYTECODE_DUMP)).unwrap();
        let config = VmConfig {
            dump_dir: Some(temp.path().to_path_buf()),
            dump_bytecode: true,
            interpret_on_compile_error: false,
            ..VmConfig::default()
        };
        let mut vm = VirtualMachine::new(config).unwrap();
        let mut runtime = RecordingRuntime::default();
        let report = vm.run("fill(#ff0000)", &mut runtime);

        assert_eq!(report.outcome, Some(Outcome::Completed));
        assert_eq!(report.diagnostics.kinds(), vec![ErrorKind::IoFailed]);
        assert_eq!(report.diagnostics.of_stage(Stage::Host).count(), 1);
        assert_eq!(runtime.calls(), &[Call::Fill(Color::rgb(255, 0, 0)), Call::Redraw]);
    }

    #[test]
    fn test_artifacts_written_to_dump_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = VmConfig {
            dump_dir: Some(temp.path().to_path_buf()),
            dump_tokens: true,
            dump_bytecode: true,
            ..VmConfig::default()
        };
        let mut vm = VirtualMachine::new(config).unwrap();
        let mut runtime = RecordingRuntime::default();
        let report = vm.run("getwidth()", &mut runtime);

        assert_eq!(vm.interpreter().dumps().backend_name(), "file");
        let bin = std::fs::read(temp.path().join(BYTECODE_DUMP)).unwrap();
        assert_eq!(bin, report.bytecode);
        let tokens = std::fs::read_to_string(temp.path().join(TOKENS_DUMP)).unwrap();
        assert!(tokens.lines().next().unwrap().starts_with("IDENTIFIER getwidth"));
        assert_eq!(tokens.lines().count(), 4);
    }
}
