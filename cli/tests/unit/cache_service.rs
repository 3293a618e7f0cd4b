//! Varnish fronting: enable, disable and the generated sites include.

#![allow(clippy::unwrap_used)]

use appconfig_cli::application::services::cache::{Cache, Uncache};
use appconfig_cli::domain::environment::Environment;
use appconfig_cli::domain::varnish::SITES_INCLUDE;
use sha2::{Digest, Sha256};

use crate::helpers::{Harness, ScriptedPrompter, demo_app, ok_output};

const LISTING: &str = "/etc/varnish/sites/wals.vcl\n/etc/varnish/sites/demo.vcl\n";

const EXPECTED_INCLUDE: &str = "# autogenerated\n\
                                include \"/etc/varnish/sites/demo.vcl\";\n\
                                include \"/etc/varnish/sites/wals.vcl\";\n";

#[tokio::test]
async fn cache_installs_varnish_and_points_nginx_at_it() {
    let h = Harness::new(ScriptedPrompter::default());
    h.fleet.reply("find /etc/varnish/sites", LISTING);

    h.dispatcher(&[])
        .dispatch(&Cache, &demo_app(), Environment::Production)
        .await
        .unwrap();

    assert!(h.fleet.ran("apt-get install -q -y varnish"));
    assert!(h.fleet.uploaded("/etc/default/varnish").is_some());
    assert!(h.fleet.uploaded("/etc/varnish/main.vcl").is_some());
    let site = h.fleet.uploaded("/etc/varnish/sites/demo.vcl").unwrap();
    assert!(site.contains(".port = \"8001\""), "{site}");
    assert_eq!(h.fleet.uploaded(SITES_INCLUDE).unwrap(), EXPECTED_INCLUDE);

    let nginx = h.fleet.uploaded("/etc/nginx/sites-enabled/demo.conf").unwrap();
    assert!(nginx.contains("proxy_pass http://127.0.0.1:6081/;"), "{nginx}");

    let restart = h.fleet.position("service varnish restart").unwrap();
    let reload = h.fleet.position("service nginx reload").unwrap();
    assert!(restart < reload);
}

#[tokio::test]
async fn sites_include_is_a_total_snapshot() {
    let h = Harness::new(ScriptedPrompter::default());
    h.fleet.on_each(
        "find /etc/varnish/sites",
        vec![
            ok_output(LISTING),
            ok_output("/etc/varnish/sites/demo.vcl\n/etc/varnish/sites/wals.vcl\n\n"),
        ],
    );
    let d = h.dispatcher(&[]);

    d.dispatch(&Cache, &demo_app(), Environment::Production)
        .await
        .unwrap();
    d.dispatch(&Cache, &demo_app(), Environment::Production)
        .await
        .unwrap();

    let includes: Vec<String> = h
        .fleet
        .uploads()
        .into_iter()
        .filter(|(path, _)| path == SITES_INCLUDE)
        .map(|(_, content)| content)
        .collect();
    assert_eq!(includes.len(), 2);
    assert!(includes.iter().all(|c| c == EXPECTED_INCLUDE));
}

#[tokio::test]
async fn unchanged_include_is_not_uploaded_again() {
    let h = Harness::new(ScriptedPrompter::default());
    let digest = format!("{:x}", Sha256::digest(b"# autogenerated\n"));
    h.fleet
        .reply("find /etc/varnish/sites", "")
        .reply(
            &format!("sha256sum {SITES_INCLUDE}"),
            &format!("{digest}  {SITES_INCLUDE}\n"),
        );

    h.dispatcher(&[])
        .dispatch(&Uncache, &demo_app(), Environment::Production)
        .await
        .unwrap();

    assert!(h.fleet.uploaded(SITES_INCLUDE).is_none());
}

#[tokio::test]
async fn uncache_removes_site_and_restores_direct_port() {
    let h = Harness::new(ScriptedPrompter::default());
    h.fleet
        .reply("find /etc/varnish/sites", "/etc/varnish/sites/wals.vcl\n");

    h.dispatcher(&[])
        .dispatch(&Uncache, &demo_app(), Environment::Production)
        .await
        .unwrap();

    assert!(h.fleet.ran("rm -f /etc/varnish/sites/demo.vcl"));
    assert_eq!(
        h.fleet.uploaded(SITES_INCLUDE).unwrap(),
        "# autogenerated\ninclude \"/etc/varnish/sites/wals.vcl\";\n"
    );
    let nginx = h.fleet.uploaded("/etc/nginx/sites-enabled/demo.conf").unwrap();
    assert!(nginx.contains("proxy_pass http://127.0.0.1:8001/;"));
    assert!(h.warnings().is_empty());

    // Varnish must drop the removed site from its running config.
    let listing = h.fleet.position("find /etc/varnish/sites").unwrap();
    let restart = h.fleet.position("service varnish restart").unwrap();
    let reload = h.fleet.position("service nginx reload").unwrap();
    assert!(listing < restart && restart < reload);
}

#[tokio::test]
async fn uncache_survives_failed_removal() {
    let h = Harness::new(ScriptedPrompter::default());
    h.fleet.fail("rm -f /etc/varnish/sites/demo.vcl");

    h.dispatcher(&[])
        .dispatch(&Uncache, &demo_app(), Environment::Production)
        .await
        .unwrap();

    let warnings = h.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("could not remove /etc/varnish/sites/demo.vcl"));
    assert!(h.fleet.uploaded(SITES_INCLUDE).is_some());
    assert!(h.fleet.ran("service nginx reload"));
}
