use runprog::exec::ProgramExecutor;

/// Builds a `sh -c` script out of small steps, so tests can describe a child
/// process without shell quoting noise.
#[derive(Debug, Clone, Default)]
pub struct ShellScript {
    steps: Vec<String>,
}

impl ShellScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print `line` on stdout. Uses `printf` so the text is not interpreted.
    pub fn stdout(mut self, line: &str) -> Self {
        self.steps.push(format!("printf '%s\\n' {}", quote(line)));
        self
    }

    /// Print `line` on stderr.
    pub fn stderr(mut self, line: &str) -> Self {
        self.steps.push(format!("printf '%s\\n' {} >&2", quote(line)));
        self
    }

    pub fn sleep_ms(mut self, ms: u64) -> Self {
        self.steps
            .push(format!("sleep {}.{:03}", ms / 1000, ms % 1000));
        self
    }

    pub fn exit(mut self, code: i32) -> Self {
        self.steps.push(format!("exit {code}"));
        self
    }

    pub fn script(&self) -> String {
        if self.steps.is_empty() {
            ":".to_string()
        } else {
            self.steps.join("; ")
        }
    }

    /// Executor and argument vector that run this script.
    pub fn command(&self) -> (ProgramExecutor, Vec<String>) {
        (
            ProgramExecutor::new("sh"),
            vec!["-c".to_string(), self.script()],
        )
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Builder for the TOML text of a config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigFileBuilder {
    program: Option<String>,
    args: Vec<String>,
    capture_stdout: Option<bool>,
    capture_stderr: Option<bool>,
    timeout: Option<String>,
    working_dir: Option<String>,
    env: Vec<(String, String)>,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(mut self, program: &str) -> Self {
        self.program = Some(program.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn capture_stdout(mut self, val: bool) -> Self {
        self.capture_stdout = Some(val);
        self
    }

    pub fn capture_stderr(mut self, val: bool) -> Self {
        self.capture_stderr = Some(val);
        self
    }

    pub fn timeout(mut self, duration: &str) -> Self {
        self.timeout = Some(duration.to_string());
        self
    }

    pub fn working_dir(mut self, dir: &str) -> Self {
        self.working_dir = Some(dir.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> String {
        let mut out = String::from("[run]\n");
        if let Some(program) = self.program {
            out.push_str(&format!("program = {program:?}\n"));
        }
        if !self.args.is_empty() {
            out.push_str(&format!("args = {:?}\n", self.args));
        }
        if let Some(val) = self.capture_stdout {
            out.push_str(&format!("capture_stdout = {val}\n"));
        }
        if let Some(val) = self.capture_stderr {
            out.push_str(&format!("capture_stderr = {val}\n"));
        }
        if let Some(timeout) = self.timeout {
            out.push_str(&format!("timeout = {timeout:?}\n"));
        }
        if let Some(dir) = self.working_dir {
            out.push_str(&format!("working_dir = {dir:?}\n"));
        }
        if !self.env.is_empty() {
            out.push_str("\n[run.env]\n");
            for (key, value) in self.env {
                out.push_str(&format!("{key} = {value:?}\n"));
            }
        }
        out
    }
}
