//! Deploy procedure driven against a recording fake host.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use appconfig_cli::application::services::deploy::{Deploy, DeployOptions};
use appconfig_cli::domain::environment::Environment;
use appconfig_cli::domain::error::HealthCheckError;
use appconfig_cli::domain::platform::Release;

use crate::helpers::{Harness, ScriptedPrompter, demo_app, ok_output};

fn with_passwords() -> ScriptedPrompter {
    ScriptedPrompter::default().passwords(&["", "admin-secret"])
}

#[tokio::test]
async fn unsupported_distribution_changes_nothing() {
    let h = Harness::new(with_passwords());
    h.fleet
        .reply("lsb_release -si", "Debian\n")
        .reply("lsb_release -sc", "jessie\n");

    let err = h
        .dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Test)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("unsupported platform"), "{err:#}");
    assert!(h.fleet.uploads().is_empty());
    assert!(
        h.fleet
            .commands()
            .iter()
            .all(|c| c.starts_with("lsb_release")),
        "{:?}",
        h.fleet.commands()
    );
}

#[tokio::test]
async fn unsupported_release_is_rejected() {
    let h = Harness::new(with_passwords());
    h.fleet
        .reply("lsb_release -si", "Ubuntu\n")
        .reply("lsb_release -sc", "bionic\n");

    let err = h
        .dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Test)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("release codename 'bionic'"));
    assert!(h.fleet.uploads().is_empty());
}

#[tokio::test]
async fn deploys_to_test_host_with_clamped_workers() {
    let h = Harness::new(with_passwords());
    h.fleet.healthy_xenial();

    let reports = h
        .dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Test)
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.host, "h1");
    assert_eq!(report.release, Release::Xenial);
    assert_eq!(report.workers, 3);
    assert!(!report.reseeded);
    assert!(!report.migrated);

    assert!(h.fleet.events().iter().all(|e| e.host() == "h1"));
    let program = h
        .fleet
        .uploaded("/etc/supervisor/conf.d/demo.conf")
        .expect("supervisor config uploaded");
    assert!(program.contains("--workers=3"), "{program}");
    assert!(h.fleet.uploaded("/home/demo/config.ini").is_some());
    assert!(h.fleet.uploaded("/var/www/demo/503.html").is_some());
    // Test hosts mount the app as a location of the default site.
    assert!(h.fleet.uploaded("/etc/nginx/locations.d/demo.conf").is_some());
    assert!(h.fleet.uploaded("/etc/nginx/sites-enabled/demo.conf").is_none());
    assert!(h.fleet.ran("curl -s http://localhost:8001/_ping"));
}

#[tokio::test]
async fn production_deploy_keeps_worker_count_and_gets_own_site() {
    let h = Harness::new(with_passwords());
    h.fleet.healthy_xenial();

    let reports = h
        .dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Production)
        .await
        .unwrap();

    assert_eq!(reports[0].host, "h2");
    assert_eq!(reports[0].workers, 7);
    assert!(h.fleet.uploaded("/etc/nginx/sites-enabled/demo.conf").is_some());
    assert!(h.fleet.uploaded("/etc/logrotate.d/demo").is_some());
}

#[tokio::test]
async fn stages_run_in_order() {
    let h = Harness::new(with_passwords());
    h.fleet.healthy_xenial();

    h.dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Test)
        .await
        .unwrap();

    let at = |pattern: &str| {
        h.fleet
            .position(pattern)
            .unwrap_or_else(|| panic!("never ran: {pattern}"))
    };
    assert!(at("lsb_release -sc") < at("id -u demo"));
    assert!(at("id -u demo") < at("pip install"));
    assert!(at("pip install") < at("htpasswd"));
    assert!(at("htpasswd") < at("service nginx reload"));
    assert!(at("service nginx reload") < at("supervisorctl restart"));
    assert!(at("supervisorctl restart") < at("/_ping"));
}

#[tokio::test]
async fn htpasswd_secret_goes_over_stdin() {
    let h = Harness::new(with_passwords());
    h.fleet.healthy_xenial();

    h.dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Test)
        .await
        .unwrap();

    assert_eq!(
        h.fleet.stdin_of("htpasswd -idc").as_deref(),
        Some("admin-secret")
    );
    assert!(h.fleet.commands().iter().all(|c| !c.contains("admin-secret")));
}

#[tokio::test]
async fn failed_htpasswd_does_not_reveal_secret() {
    let h = Harness::new(with_passwords());
    h.fleet.healthy_xenial().fail("htpasswd -idc");

    let err = h
        .dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Test)
        .await
        .unwrap_err();

    let msg = format!("{err:#}");
    assert!(msg.contains("htpasswd -idc"), "{msg}");
    assert!(!msg.contains("admin-secret"), "{msg}");
}

#[tokio::test]
async fn unhealthy_app_fails_after_restart() {
    let h = Harness::new(with_passwords());
    h.fleet
        .reply("lsb_release -si", "Ubuntu\n")
        .reply("lsb_release -sc", "trusty\n")
        .reply("import clld", "/usr/venvs/demo/src/clld/clld/__init__.py\n")
        .reply("/_ping", r#"{"status": "starting"}"#);

    let err = h
        .dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Test)
        .await
        .unwrap_err();

    assert!(matches!(
        err.root_cause().downcast_ref::<HealthCheckError>(),
        Some(HealthCheckError::NotOk { status, .. }) if status == "starting"
    ));
    assert!(h.fleet.ran("supervisorctl restart"));
}

#[tokio::test]
async fn precise_uses_python2_and_old_jre() {
    let h = Harness::new(with_passwords());
    h.fleet
        .reply("lsb_release -si", "Ubuntu\n")
        .reply("lsb_release -sc", "precise\n")
        .reply("import clld", "/usr/venvs/demo/src/clld/clld/__init__.py\n")
        .reply("/_ping", r#"{"status": "ok"}"#);

    let reports = h
        .dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Test)
        .await
        .unwrap();

    assert_eq!(reports[0].release, Release::Precise);
    assert!(h.fleet.ran("apt-get install -q -y python-dev"));
    assert!(h.fleet.ran("apt-get install -q -y openjdk-6-jre"));
    assert!(!h.fleet.ran("python3-dev"));
}

#[tokio::test]
async fn framework_outside_virtualenv_is_rejected() {
    let h = Harness::new(with_passwords());
    h.fleet
        .reply("lsb_release -si", "Ubuntu\n")
        .reply("lsb_release -sc", "xenial\n")
        .reply(
            "import clld",
            "/usr/lib/python3/dist-packages/clld/__init__.py\n",
        );

    let err = h
        .dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Test)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("unexpected framework location"));
    assert!(!h.fleet.ran("supervisorctl"));
}

#[tokio::test]
async fn declined_reseed_keeps_database() {
    let h = Harness::new(with_passwords().confirm_with("Recreate database?", false));
    h.fleet.healthy_xenial();

    let reports = h
        .dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Test)
        .await
        .unwrap();

    assert!(!reports[0].reseeded);
    assert!(!h.fleet.ran("dropdb"));
    assert!(!h.fleet.ran("gunzip"));
    assert!(h.local.local_commands().is_empty());
}

#[tokio::test]
async fn confirmed_reseed_pauses_before_drop_and_loads_dump() {
    let h = Harness::new(
        with_passwords()
            .confirm_with("Recreate database?", true)
            .input_with("from db", "demo_local"),
    );
    h.fleet.healthy_xenial().on_each(
        "pg_database WHERE datname",
        // provision: exists; reseed: exists, then gone after the drop.
        vec![ok_output("1\n"), ok_output("1\n"), ok_output("")],
    );

    let reports = h
        .dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Test)
        .await
        .unwrap();

    assert!(reports[0].reseeded);
    let at = |pattern: &str| {
        h.fleet
            .position(pattern)
            .unwrap_or_else(|| panic!("never ran: {pattern}"))
    };
    assert!(at("supervisorctl stop") < at("dropdb demo"));
    assert!(at("dropdb demo") < at("createdb"));
    assert!(at("createdb") < at("psql -f /tmp/demo.sql -d demo"));
    assert!(at("psql -f /tmp/demo.sql -d demo") < at("supervisorctl restart"));

    let local = h.local.local_commands();
    assert!(local[0].starts_with("pg_dump -x -O -f "), "{local:?}");
    assert!(local[0].ends_with(" demo_local"));
    assert!(local[1].starts_with("gzip -f "));
    assert!(h.fleet.uploaded("/tmp/demo.sql.gz").is_some());
    assert!(!h.prompter.asked().contains(&"Upgrade database?".to_string()));
}

#[tokio::test]
async fn confirmed_upgrade_runs_alembic_as_app_user() {
    let h = Harness::new(with_passwords().confirm_with("Upgrade database?", true));
    h.fleet.healthy_xenial();

    let reports = h
        .dispatcher(&[])
        .dispatch(&Deploy::default(), &demo_app(), Environment::Test)
        .await
        .unwrap();

    assert!(reports[0].migrated);
    let at = |pattern: &str| {
        h.fleet
            .position(pattern)
            .unwrap_or_else(|| panic!("never ran: {pattern}"))
    };
    assert!(at("supervisorctl stop") < at("alembic -n production upgrade head"));
    assert!(!h.fleet.ran("vacuumdb"));
}

#[tokio::test]
async fn with_alembic_skips_reseed_question() {
    let h = Harness::new(with_passwords());
    h.fleet.healthy_xenial();
    let task = Deploy {
        opts: DeployOptions {
            with_alembic: true,
            ..DeployOptions::default()
        },
    };

    h.dispatcher(&[])
        .dispatch(&task, &demo_app(), Environment::Test)
        .await
        .unwrap();

    let asked = h.prompter.asked();
    assert!(!asked.contains(&"Recreate database?".to_string()));
    assert!(asked.contains(&"Upgrade database?".to_string()));
}

#[tokio::test]
async fn blog_settings_are_prompted_for_with_blog() {
    let h = Harness::new(
        ScriptedPrompter::default()
            // Blog settings are collected before the htpasswd passwords.
            .passwords(&["blog-secret", "", "admin-secret"])
            .input_with("Blog user", "editor"),
    );
    h.fleet.healthy_xenial();
    let task = Deploy {
        opts: DeployOptions {
            with_blog: true,
            ..DeployOptions::default()
        },
    };

    h.dispatcher(&[])
        .dispatch(&task, &demo_app(), Environment::Production)
        .await
        .unwrap();

    let config = h.fleet.uploaded("/home/demo/config.ini").unwrap();
    assert!(config.contains("blog.demo.example.org"), "{config}");
    assert!(config.contains("editor"));
}
