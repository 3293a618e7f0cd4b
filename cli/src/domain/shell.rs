//! Shell quoting for commands sent to remote hosts.

/// Quote `arg` for a POSIX shell. Plain words are passed through.
#[must_use]
pub fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Join already-quoted words with `cd dir &&` in front.
#[must_use]
pub fn in_dir(dir: &str, command: &str) -> String {
    format!("cd {} && {command}", quote(dir))
}

/// Prefix a command so it runs inside a virtualenv.
#[must_use]
pub fn in_virtualenv(venv: &str, command: &str) -> String {
    format!("source {}/bin/activate && {command}", quote(venv))
}
