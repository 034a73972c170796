//! Test doubles for the runner and locator traits.

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;

use crate::locate::ExecutableLocator;
use crate::runner::{CommandSpec, ProcessOutput, ProcessRunner};

/// Resolves the listed names to `/usr/bin/<name>`.
pub struct FakeLocator(Vec<String>);

impl FakeLocator {
    pub fn with(names: &[&str]) -> Self {
        Self(names.iter().map(|s| s.to_string()).collect())
    }
}

impl ExecutableLocator for FakeLocator {
    fn find(&self, name: &str) -> Option<PathBuf> {
        self.0
            .iter()
            .any(|n| n == name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }
}

type Hook = Box<dyn Fn(&CommandSpec)>;

struct Rule {
    prefix: String,
    output: ProcessOutput,
    hook: Option<Hook>,
}

/// Answers commands from prefix rules (first match wins, unmatched commands
/// succeed silently) and records every call.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn respond(mut self, prefix: &str, code: i32, stdout: &str) -> Self {
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            output: ProcessOutput {
                code: Some(code),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
            hook: None,
        });
        self
    }

    pub fn on(mut self, prefix: &str, hook: impl Fn(&CommandSpec) + 'static) -> Self {
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            output: ProcessOutput {
                code: Some(0),
                ..ProcessOutput::default()
            },
            hook: Some(Box::new(hook)),
        });
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    pub fn displayed_calls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(CommandSpec::display).collect()
    }

    fn answer(&self, cmd: &CommandSpec) -> ProcessOutput {
        self.calls.borrow_mut().push(cmd.clone());
        let shown = cmd.display();
        let rule = self
            .rules
            .iter()
            .find(|r| shown == r.prefix || shown.starts_with(&format!("{} ", r.prefix)));
        match rule {
            Some(r) => {
                if let Some(hook) = &r.hook {
                    hook(cmd);
                }
                r.output.clone()
            }
            None => ProcessOutput {
                code: Some(0),
                ..ProcessOutput::default()
            },
        }
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, cmd: &CommandSpec) -> io::Result<ProcessOutput> {
        Ok(self.answer(cmd))
    }

    fn run_interactive(&self, cmd: &CommandSpec) -> io::Result<Option<i32>> {
        Ok(self.answer(cmd).code)
    }
}
