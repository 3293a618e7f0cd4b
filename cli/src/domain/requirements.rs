//! Filtering `pip freeze` output into a requirements file.

/// Packages that belong to the deployment tooling, not to the app.
const IGNORED: &[&str] = &[
    "babel",
    "fabric",
    "fabtools",
    "newrelic",
    "paramiko",
    "pycrypto",
    "pyx",
];

/// Editable checkouts collapsed to their released package name.
const COLLAPSED: &[(&str, &str)] = &[("clldmpg.git", "clldmpg"), ("clld.git", "clld")];

/// Turn `pip freeze` stdout into `requirements.txt` content for `app_name`.
///
/// Drops pip's own colored warnings, the app's own checkout and tooling
/// packages; each kept line ends with a newline.
#[must_use]
pub fn filter_freeze(stdout: &str, app_name: &str) -> String {
    let own_checkout = format!("{}.git", app_name.to_lowercase());
    let mut out = String::new();
    for line in stdout.lines() {
        if line.starts_with("\x1b[33m") || line.starts_with("You should ") || line.is_empty() {
            continue;
        }
        let package = line.split("==").next().unwrap_or(line).to_lowercase();
        if line.contains(&own_checkout) || IGNORED.contains(&package.as_str()) {
            continue;
        }
        let line = COLLAPSED
            .iter()
            .find(|(marker, _)| line.contains(marker))
            .map_or(line, |(_, name)| *name);
        out.push_str(line);
        out.push('\n');
    }
    out
}
