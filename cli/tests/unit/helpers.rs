//! Shared test helpers: recording fakes for the remote, workstation and
//! interaction ports, plus output constructors.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use appconfig_cli::application::dispatch::{Collaborators, DeploySettings, TaskDispatcher};
use appconfig_cli::application::ports::{
    Connector, ProgressReporter, Prompter, RemoteHost, RunAs, UploadOptions, Workstation,
};
use appconfig_cli::domain::app::AppDescriptor;
use appconfig_cli::infra::templates::EmbeddedTemplates;

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success, non-zero = failure).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

// ── Output constructors ──────────────────────────────────────────────────────

pub fn ok_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// The demo app: port 8001, test host `h1`, production host `h2`, 7 workers.
pub fn demo_app() -> AppDescriptor {
    AppDescriptor {
        name: "demo".to_string(),
        port: 8001,
        domain: "demo.example.org".to_string(),
        test: "h1".to_string(),
        production: "h2".to_string(),
        workers: 7,
        deploy_duration: 2,
        require_deb: Vec::new(),
        require_pip: Vec::new(),
        dependencies: Vec::new(),
        pg_unaccent: false,
        pg_collkey: false,
        with_blog: false,
        bibutils: false,
    }
}

// ── Remote host fake ─────────────────────────────────────────────────────────

/// One recorded remote interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Exec {
        host: String,
        command: String,
        run_as: String,
        stdin: String,
    },
    Upload {
        host: String,
        path: String,
        content: String,
    },
}

impl Event {
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Exec { command, .. } => Some(command),
            Self::Upload { .. } => None,
        }
    }

    pub fn host(&self) -> &str {
        match self {
            Self::Exec { host, .. } | Self::Upload { host, .. } => host,
        }
    }
}

#[derive(Default)]
struct Shared {
    events: Vec<Event>,
    /// `(substring, responses)`; the first rule whose substring occurs in the
    /// command answers it, consuming responses until one is left.
    /// Unmatched commands succeed with empty output.
    rules: Vec<(String, VecDeque<Output>)>,
    /// Hosts whose transport fails outright.
    unreachable: Vec<String>,
}

/// Records every command and upload across all hosts it connects to.
#[derive(Clone, Default)]
pub struct FakeFleet {
    shared: Arc<Mutex<Shared>>,
}

impl FakeFleet {
    /// Answer commands containing `pattern` with `output`.
    pub fn on(&self, pattern: &str, output: Output) -> &Self {
        self.on_each(pattern, vec![output])
    }

    /// Answer successive commands containing `pattern` with `outputs` in
    /// order; the last one repeats.
    pub fn on_each(&self, pattern: &str, outputs: Vec<Output>) -> &Self {
        self.shared
            .lock()
            .unwrap()
            .rules
            .push((pattern.to_string(), outputs.into()));
        self
    }

    /// Answer commands containing `pattern` with `stdout`, exit 0.
    pub fn reply(&self, pattern: &str, stdout: &str) -> &Self {
        self.on(pattern, ok_output(stdout))
    }

    /// Make commands containing `pattern` exit 1.
    pub fn fail(&self, pattern: &str) -> &Self {
        self.on(pattern, err_output(1, ""))
    }

    pub fn unreachable(&self, host: &str) -> &Self {
        self.shared
            .lock()
            .unwrap()
            .unreachable
            .push(host.to_string());
        self
    }

    /// A healthy Ubuntu xenial host with the framework installed.
    pub fn healthy_xenial(&self) -> &Self {
        self.reply("lsb_release -si", "Ubuntu\n")
            .reply("lsb_release -sc", "xenial\n")
            .reply(
                "import clld",
                "/usr/venvs/demo/src/clld/clld/__init__.py\n",
            )
            .reply("/_ping", r#"{"status": "ok"}"#)
    }

    pub fn events(&self) -> Vec<Event> {
        self.shared.lock().unwrap().events.clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(Event::command)
            .map(str::to_string)
            .collect()
    }

    /// Uploaded `(path, content)` pairs in order.
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Upload { path, content, .. } => Some((path, content)),
                Event::Exec { .. } => None,
            })
            .collect()
    }

    /// Last content uploaded to `path`.
    pub fn uploaded(&self, path: &str) -> Option<String> {
        self.uploads()
            .into_iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, c)| c)
    }

    /// Stdin fed to the first command containing `pattern`.
    pub fn stdin_of(&self, pattern: &str) -> Option<String> {
        self.events().into_iter().find_map(|e| match e {
            Event::Exec { command, stdin, .. } if command.contains(pattern) => Some(stdin),
            _ => None,
        })
    }

    /// Index of the first command containing `pattern`.
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.commands().iter().position(|c| c.contains(pattern))
    }

    pub fn ran(&self, pattern: &str) -> bool {
        self.position(pattern).is_some()
    }
}

/// A [`RemoteHost`] view of the fleet bound to one alias.
#[derive(Clone)]
pub struct FakeHost {
    host: String,
    fleet: FakeFleet,
}

impl FakeHost {
    pub fn new(host: &str, fleet: &FakeFleet) -> Self {
        Self {
            host: host.to_string(),
            fleet: fleet.clone(),
        }
    }
}

impl RemoteHost for FakeHost {
    fn host(&self) -> &str {
        &self.host
    }

    async fn exec(&self, command: &str, run_as: RunAs<'_>) -> Result<Output> {
        self.exec_with_stdin(command, &[], run_as).await
    }

    async fn exec_with_stdin(
        &self,
        command: &str,
        stdin: &[u8],
        run_as: RunAs<'_>,
    ) -> Result<Output> {
        let mut shared = self.fleet.shared.lock().unwrap();
        if shared.unreachable.contains(&self.host) {
            anyhow::bail!("cannot reach {}", self.host);
        }
        shared.events.push(Event::Exec {
            host: self.host.clone(),
            command: command.to_string(),
            run_as: format!("{run_as:?}"),
            stdin: String::from_utf8_lossy(stdin).into_owned(),
        });
        let output = match shared
            .rules
            .iter_mut()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
        {
            Some((_, outputs)) if outputs.len() > 1 => outputs.pop_front(),
            Some((_, outputs)) => outputs.front().cloned(),
            None => None,
        };
        Ok(output.unwrap_or_else(|| ok_output("")))
    }

    async fn upload(&self, content: &[u8], remote_path: &str, _: &UploadOptions<'_>) -> Result<()> {
        let mut shared = self.fleet.shared.lock().unwrap();
        if shared.unreachable.contains(&self.host) {
            anyhow::bail!("cannot reach {}", self.host);
        }
        shared.events.push(Event::Upload {
            host: self.host.clone(),
            path: remote_path.to_string(),
            content: String::from_utf8_lossy(content).into_owned(),
        });
        Ok(())
    }
}

impl Connector for FakeFleet {
    type Host = FakeHost;

    fn connect(&self, host: &str) -> FakeHost {
        FakeHost::new(host, self)
    }
}

// ── Workstation fake ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Desk {
    commands: Vec<String>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    sleeps: Vec<Duration>,
}

/// In-memory operator machine. Local programs succeed; reads of unknown
/// files return a placeholder; sleeps are only recorded.
#[derive(Clone, Default)]
pub struct FakeWorkstation {
    desk: Arc<Mutex<Desk>>,
}

impl FakeWorkstation {
    pub fn local_commands(&self) -> Vec<String> {
        self.desk.lock().unwrap().commands.clone()
    }

    pub fn file(&self, path: &Path) -> Option<String> {
        self.desk
            .lock()
            .unwrap()
            .files
            .get(path)
            .map(|c| String::from_utf8_lossy(c).into_owned())
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.desk.lock().unwrap().sleeps.clone()
    }
}

impl Workstation for FakeWorkstation {
    async fn local(&self, program: &str, args: &[&str]) -> Result<Output> {
        let mut line = vec![program];
        line.extend_from_slice(args);
        self.desk.lock().unwrap().commands.push(line.join(" "));
        Ok(ok_output(""))
    }

    fn read_local(&self, path: &Path) -> Result<Vec<u8>> {
        let desk = self.desk.lock().unwrap();
        Ok(desk
            .files
            .get(path)
            .cloned()
            .unwrap_or_else(|| format!("contents of {}", path.display()).into_bytes()))
    }

    fn write_local(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.desk
            .lock()
            .unwrap()
            .files
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    async fn sleep(&self, duration: Duration) {
        self.desk.lock().unwrap().sleeps.push(duration);
    }
}

// ── Interaction fakes ────────────────────────────────────────────────────────

/// Answers prompts from a script and records every question asked.
#[derive(Default)]
pub struct ScriptedPrompter {
    confirms: HashMap<String, bool>,
    inputs: HashMap<String, String>,
    passwords: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    /// Answer the confirm prompt `prompt` with `answer` (others get their default).
    pub fn confirm_with(mut self, prompt: &str, answer: bool) -> Self {
        self.confirms.insert(prompt.to_string(), answer);
        self
    }

    /// Answer input prompts starting with `prefix`.
    pub fn input_with(mut self, prefix: &str, answer: &str) -> Self {
        self.inputs.insert(prefix.to_string(), answer.to_string());
        self
    }

    /// Queue password answers, consumed in order.
    pub fn passwords(self, answers: &[&str]) -> Self {
        self.passwords
            .lock()
            .unwrap()
            .extend(answers.iter().map(ToString::to_string));
        self
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        self.asked.lock().unwrap().push(prompt.to_string());
        Ok(self.confirms.get(prompt).copied().unwrap_or(default))
    }

    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        self.asked.lock().unwrap().push(prompt.to_string());
        let scripted = self
            .inputs
            .iter()
            .find(|(prefix, _)| prompt.starts_with(prefix.as_str()))
            .map(|(_, answer)| answer.clone());
        scripted
            .or_else(|| default.map(str::to_string))
            .ok_or_else(|| anyhow::anyhow!("unscripted input: {prompt}"))
    }

    fn password(&self, prompt: &str) -> Result<String> {
        self.asked.lock().unwrap().push(prompt.to_string());
        self.passwords
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("unscripted password: {prompt}"))
    }
}

/// Collects reporter messages.
#[derive(Default)]
pub struct RecordingReporter {
    pub steps: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.steps.lock().unwrap().push(message.to_string());
    }

    fn success(&self, message: &str) {
        self.steps.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

/// Owns everything a dispatcher borrows.
pub struct Harness {
    pub fleet: FakeFleet,
    pub local: FakeWorkstation,
    pub prompter: ScriptedPrompter,
    pub reporter: RecordingReporter,
    pub templates: EmbeddedTemplates,
    pub settings: DeploySettings,
}

impl Harness {
    pub fn new(prompter: ScriptedPrompter) -> Self {
        Self {
            fleet: FakeFleet::default(),
            local: FakeWorkstation::default(),
            prompter,
            reporter: RecordingReporter::default(),
            templates: EmbeddedTemplates::load().expect("embedded templates compile"),
            settings: DeploySettings {
                assets_dir: PathBuf::from("/assets"),
                ..DeploySettings::default()
            },
        }
    }

    pub fn dispatcher(&self, pinned: &[&str]) -> TaskDispatcher<'_, FakeFleet, FakeWorkstation> {
        TaskDispatcher::new(
            self.fleet.clone(),
            self.local.clone(),
            pinned.iter().map(ToString::to_string).collect(),
            Collaborators {
                prompter: &self.prompter,
                reporter: &self.reporter,
                templates: &self.templates,
                settings: &self.settings,
            },
        )
    }

    pub fn warnings(&self) -> Vec<String> {
        self.reporter.warnings.lock().unwrap().clone()
    }
}
