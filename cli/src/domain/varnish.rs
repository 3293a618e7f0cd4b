//! Varnish cache fronting: port constants and the generated sites include.

/// Port varnish listens on; nginx proxies here when an app is cached.
pub const VARNISH_PORT: u16 = 6081;

pub const SITES_DIR: &str = "/etc/varnish/sites";
pub const SITES_INCLUDE: &str = "/etc/varnish/sites.vcl";

/// Render `sites.vcl` from a directory listing.
///
/// The listing is sorted and de-duplicated first, so the output depends only
/// on the set of files present, never on listing order or previous content.
#[must_use]
pub fn render_sites_include(listing: &str) -> String {
    let mut sites: Vec<&str> = listing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    sites.sort_unstable();
    sites.dedup();

    let mut out = String::from("# autogenerated\n");
    for site in sites {
        out.push_str(&format!("include \"{site}\";\n"));
    }
    out
}
