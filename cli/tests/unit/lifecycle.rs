//! Start, stop, uninstall, maintenance page and app scripts.

#![allow(clippy::unwrap_used)]

use appconfig_cli::application::services::lifecycle::{Start, Stop, Uninstall};
use appconfig_cli::application::services::maintenance::Maintenance;
use appconfig_cli::application::services::scripts::{CreateDownloads, RunScript};
use appconfig_cli::domain::environment::Environment;

use crate::helpers::{Harness, ScriptedPrompter, demo_app};

#[tokio::test]
async fn stop_writes_paused_program_and_stops() {
    let h = Harness::new(ScriptedPrompter::default());

    h.dispatcher(&[])
        .dispatch(&Stop, &demo_app(), Environment::Production)
        .await
        .unwrap();

    let program = h.fleet.uploaded("/etc/supervisor/conf.d/demo.conf").unwrap();
    assert!(program.contains("autostart=false"), "{program}");
    assert!(h.fleet.ran("supervisorctl stop demo"));
    assert!(!h.fleet.ran("supervisorctl restart"));
}

#[tokio::test]
async fn start_rereads_and_restarts() {
    let h = Harness::new(ScriptedPrompter::default());

    h.dispatcher(&[])
        .dispatch(&Start, &demo_app(), Environment::Test)
        .await
        .unwrap();

    let program = h.fleet.uploaded("/etc/supervisor/conf.d/demo.conf").unwrap();
    assert!(!program.contains("autostart=false"));
    let reread = h.fleet.position("supervisorctl reread").unwrap();
    let update = h.fleet.position("supervisorctl update demo").unwrap();
    let restart = h.fleet.position("supervisorctl restart demo").unwrap();
    assert!(reread < update && update < restart);
    assert_eq!(h.local.sleeps().len(), 1);
}

#[tokio::test]
async fn uninstall_reports_removed_files() {
    let h = Harness::new(ScriptedPrompter::default());
    h.fleet.fail("test -e /etc/nginx/sites-enabled/demo.conf");

    let removed = h
        .dispatcher(&[])
        .dispatch(&Uninstall, &demo_app(), Environment::Test)
        .await
        .unwrap();

    assert_eq!(
        removed,
        vec![vec![
            "/etc/supervisor/conf.d/demo.conf".to_string(),
            "/etc/nginx/locations.d/demo.conf".to_string(),
        ]]
    );
    let reload = h.fleet.position("service nginx reload").unwrap();
    let stop = h.fleet.position("supervisorctl stop demo").unwrap();
    assert!(reload < stop);
}

#[tokio::test]
async fn maintenance_page_announces_berlin_time() {
    let h = Harness::new(ScriptedPrompter::default());

    h.dispatcher(&[])
        .dispatch(&Maintenance::default(), &demo_app(), Environment::Production)
        .await
        .unwrap();

    let page = h.fleet.uploaded("/var/www/demo/503.html").unwrap();
    assert!(page.contains("demo"), "{page}");
    assert!(
        page.contains(" CET+0100") || page.contains(" CEST+0200"),
        "{page}"
    );
    assert!(h.fleet.ran("test -d /var/www/demo"));
    let steps = h.reporter.steps.lock().unwrap();
    assert!(steps.iter().any(|s| s.contains("(2h)")), "{steps:?}");
}

#[tokio::test]
async fn run_script_returns_stdout() {
    let h = Harness::new(ScriptedPrompter::default());
    h.fleet.reply("scripts/initializedb.py", "loaded 42 rows\n");
    let task = RunScript {
        script: "initializedb".to_string(),
        args: vec!["--prime".to_string()],
    };

    let out = h
        .dispatcher(&[])
        .dispatch(&task, &demo_app(), Environment::Test)
        .await
        .unwrap();

    assert_eq!(out, vec!["loaded 42 rows\n"]);
    assert!(h.fleet.ran("'config.ini#demo' --prime"));
}

#[tokio::test]
async fn downloads_dir_closed_again_after_script_failure() {
    let h = Harness::new(ScriptedPrompter::default());
    h.fleet
        .reply("stat -c", "root 755\n")
        .fail("scripts/create_downloads.py");

    let err = h
        .dispatcher(&[])
        .dispatch(&CreateDownloads, &demo_app(), Environment::Production)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("script create_downloads failed"));
    let open = h.fleet.position("chmod 777").unwrap();
    let script = h.fleet.position("create_downloads.py").unwrap();
    assert!(open < script);
    // The stat probe is scripted, so closing again issues no chmod; the
    // probe itself must come after the script.
    let probes: Vec<usize> = h
        .fleet
        .commands()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.starts_with("stat -c"))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(probes.len(), 2);
    assert!(probes[1] > script);
}
