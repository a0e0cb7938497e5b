use super::super::{PartitionArg, SchemeOrderArg};
use super::*;

#[test]
fn targets_split_on_commas_and_repeat() {
    let cli = parse(&["screener", "-t", "a.com,b.com", "--target", "c.com"]);
    assert_eq!(cli.targets, vec!["a.com", "b.com", "c.com"]);
    assert!(cli.list.is_none());
}

#[test]
fn list_and_output_flags() {
    let cli = parse(&["screener", "-l", "hosts.txt", "-o", "shots", "-c", "4"]);
    assert_eq!(cli.list.as_deref(), Some(std::path::Path::new("hosts.txt")));
    assert_eq!(cli.outfolder.as_deref(), Some(std::path::Path::new("shots")));
    assert_eq!(cli.concurrency, Some(4));
}

#[test]
fn short_aliases_from_older_releases() {
    let cli = parse(&[
        "screener", "-t", "x", "--ad", "--dt", "90", "--isc", "404,500", "--ir", "--rce", "--nt", "--cw", "800",
    ]);
    assert!(cli.avoid_duplicates);
    assert_eq!(cli.duplicate_threshold, Some(90));
    assert_eq!(cli.ignore_status_codes, vec![404, 500]);
    assert!(cli.ignore_redirects);
    assert!(cli.respect_cert_err);
    assert!(cli.no_text);
    assert_eq!(cli.capture_width, Some(800));
}

#[test]
fn value_enums() {
    let cli = parse(&["screener", "--partition-by", "host", "--scheme-order", "http-first"]);
    assert_eq!(cli.partition_by, Some(PartitionArg::Host));
    assert_eq!(cli.scheme_order, Some(SchemeOrderArg::HttpFirst));
}

#[test]
fn exclusions_split_on_commas() {
    let cli = parse(&["screener", "-e", "*.cdn.com,admin.example.com", "--exclude", "https://x.com/login"]);
    assert_eq!(cli.exclude, vec!["*.cdn.com", "admin.example.com", "https://x.com/login"]);
}

#[test]
fn rejects_bad_values() {
    assert!(Cli::try_parse_from(["screener", "-c", "many"]).is_err());
    assert!(Cli::try_parse_from(["screener", "--partition-by", "planet"]).is_err());
    assert!(Cli::try_parse_from(["screener", "--isc", "abc"]).is_err());
}

#[test]
fn verbosity_flags() {
    use screener_core::logging::Verbosity;
    assert_eq!(parse(&["screener"]).verbosity(), Verbosity::Normal);
    assert_eq!(parse(&["screener", "--debug"]).verbosity(), Verbosity::Debug);
    assert_eq!(parse(&["screener", "--debug", "--silence"]).verbosity(), Verbosity::Silent);
}
