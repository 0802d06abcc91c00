use std::env;
use std::ffi::{OsStr, OsString};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::models::LoginRecord;

/// `expect` program that logs into one host and hands the session over.
#[derive(Debug, Clone)]
pub struct SessionScript<'a> {
    record: &'a LoginRecord,
    timeout: u32,
}

impl<'a> SessionScript<'a> {
    pub fn new(record: &'a LoginRecord, timeout: u32) -> Self {
        Self { record, timeout }
    }

    /// The script text. Same record and timeout, same bytes.
    pub fn render(&self) -> String {
        let r = self.record;
        format!(
            "set timeout {timeout}\n\
             trap {{\n\
             \x20   set rows [stty rows]\n\
             \x20   set cols [stty columns]\n\
             \x20   stty rows $rows columns $cols < $spawn_out(slave,name)\n\
             }} WINCH\n\
             spawn ssh {port} -l {user} {address}\n\
             expect \"password:\"\n\
             send -- {password}\n\
             interact\n",
            timeout = self.timeout,
            port = tcl_word(&format!("-p{}", r.port)),
            user = tcl_word(&r.user),
            address = tcl_word(&r.address),
            password = tcl_quote(&format!("{}\r", r.password)),
        )
    }
}

/// Double-quoted Tcl string with every substitution disabled; `\r` becomes
/// the Tcl escape for a carriage return.
fn tcl_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' | '[' | ']' => {
                out.push('\\');
                out.push(c);
            }
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Bare word when Tcl would read it back unchanged, quoted otherwise.
fn tcl_word(value: &str) -> String {
    let bare = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.@:%+=,/".contains(c));
    if bare {
        value.to_string()
    } else {
        tcl_quote(value)
    }
}

/// The login script on disk. Removed when dropped.
#[derive(Debug)]
pub struct ScriptFile {
    path: PathBuf,
}

impl ScriptFile {
    pub fn create(path: &Path, content: &str) -> Result<Self> {
        let script_err = |source: io::Error| Error::ScriptIo {
            path: path.to_path_buf(),
            source,
        };

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path).map_err(script_err)?;
        let script = Self {
            path: path.to_path_buf(),
        };

        // a file left over from an older run keeps its old mode otherwise
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(script_err)?;
        }
        file.write_all(content.as_bytes()).map_err(script_err)?;
        file.flush().map_err(script_err)?;

        tracing::debug!("Wrote login script {:?}", script.path);
        Ok(script)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScriptFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed login script {:?}", self.path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove login script {:?}: {}", self.path, e),
        }
    }
}

/// Find `tool` the way a shell would: as a path if it has a separator,
/// otherwise in each directory of `search_path`.
pub fn resolve_tool(tool: &str, search_path: Option<&OsStr>) -> Result<PathBuf> {
    let not_found = || Error::ToolResolution {
        tool: tool.to_string(),
    };

    let candidate = Path::new(tool);
    if candidate.components().count() > 1 {
        return if is_executable(candidate) {
            Ok(candidate.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    let search_path = search_path.ok_or_else(not_found)?;
    env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| executable_names(tool).into_iter().map(move |name| dir.join(name)))
        .find(|path| is_executable(path))
        .ok_or_else(not_found)
}

#[cfg(unix)]
fn executable_names(tool: &str) -> Vec<String> {
    vec![tool.to_string()]
}

#[cfg(windows)]
fn executable_names(tool: &str) -> Vec<String> {
    vec![tool.to_string(), format!("{}.exe", tool)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(windows)]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// How the interpreter's run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExit {
    /// `None` when the child was killed by a signal.
    pub code: Option<i32>,
}

impl SessionExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs the interpreter on a script and waits for it.
pub trait SessionRunner {
    fn run(&mut self, interpreter: &Path, script: &Path) -> Result<SessionExit>;
}

/// Gives the child our stdin, stdout and stderr for the whole session.
#[derive(Debug, Default)]
pub struct InheritedTerminal;

impl SessionRunner for InheritedTerminal {
    fn run(&mut self, interpreter: &Path, script: &Path) -> Result<SessionExit> {
        let status = Command::new(interpreter)
            .arg(script)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| Error::Launch {
                tool: interpreter.display().to_string(),
                source,
            })?;

        Ok(SessionExit {
            code: status.code(),
        })
    }
}

pub struct Launcher<R> {
    script_path: PathBuf,
    interpreter: String,
    timeout: u32,
    search_path: Option<OsString>,
    runner: R,
}

impl<R: SessionRunner> Launcher<R> {
    pub fn new(config: &AppConfig, runner: R) -> Self {
        Self {
            script_path: config.script_path.clone(),
            interpreter: config.interpreter.clone(),
            timeout: config.expect_timeout,
            search_path: env::var_os("PATH"),
            runner,
        }
    }

    #[cfg(test)]
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn script_for(&self, record: &LoginRecord) -> String {
        SessionScript::new(record, self.timeout).render()
    }

    /// Write the script, run it, and remove it again.
    ///
    /// The script is gone when this returns, whatever happened after it was
    /// created. A failing session is not an error here.
    pub fn launch(&mut self, record: &LoginRecord) -> Result<SessionExit> {
        let script = ScriptFile::create(&self.script_path, &self.script_for(record))?;
        let interpreter = resolve_tool(&self.interpreter, self.search_path.as_deref())?;

        tracing::info!(
            "Attempting to connect {}: {} via {:?}",
            record.name,
            record.target(),
            interpreter
        );
        let exit = self.runner.run(&interpreter, script.path())?;

        if exit.success() {
            tracing::info!("SSH session for {} ended.", record.name);
        } else {
            tracing::error!(
                "SSH session for {} finished with a non-zero status: {:?}",
                record.name,
                exit.code
            );
        }
        Ok(exit)
    }
}
