use anyhow::Result;
use motocat::config::{BrandMatchPolicy, FetchMode, load_config_file};
use motocat::harness::{HarnessOptions, run_harness};
use motocat::model::{CatalogCounts, YearSpan};
use motocat::pipeline::{CrawlOptions, ExtractOptions, catalog_stats, crawl, extract_listings};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

#[test]
fn crawl_builds_catalog_hierarchy() -> Result<()> {
    let env = setup_fixture_env()?;

    let report = crawl(&CrawlOptions {
        config_path: env.config_path.clone(),
        database_path: None,
    })?;

    assert_eq!(report.source_key, "fixture");
    assert_eq!(report.anchors_seen, 9);
    assert_eq!(report.anchors_ignored, 2);
    assert_eq!(report.entries_extracted, 5);
    assert_eq!(report.persist.entries_processed, 5);
    assert_eq!(report.persist.brands_inserted, 4);
    assert_eq!(report.persist.models_inserted, 4);
    assert_eq!(report.persist.years_inserted, 9);
    assert!(report.persist.failures.is_empty());

    assert!(env.root.path().join("catalog.sqlite").exists());
    let counts = catalog_stats(&CrawlOptions {
        config_path: env.config_path,
        database_path: None,
    })?;
    assert_eq!(
        counts,
        CatalogCounts {
            brands: 4,
            models: 4,
            years: 9
        }
    );

    Ok(())
}

#[test]
fn extract_lists_entries_in_page_order() -> Result<()> {
    let env = setup_fixture_env()?;

    let entries = extract_listings(&ExtractOptions {
        config_path: env.config_path,
    })?;

    let labels: Vec<String> = entries.iter().map(|e| e.label()).collect();
    assert_eq!(
        labels,
        vec![
            "Honda CBR 600 F 2001-2003",
            "Yamaha XT 600 E 1995",
            "Kawasaki Z 750 2005-2008",
            "Yamaha XT 600 E 1995",
            "Suzuki GSX-R 750 2000",
        ]
    );
    assert_eq!(
        entries[0].years,
        YearSpan::Range {
            start: 2001,
            end: 2003
        }
    );
    assert_eq!(entries[0].source_href, "/listing1.htm");

    Ok(())
}

#[test]
fn database_override_wins_over_config() -> Result<()> {
    let env = setup_fixture_env()?;
    let override_path = env.root.path().join("override/other.sqlite");

    crawl(&CrawlOptions {
        config_path: env.config_path,
        database_path: Some(override_path.clone()),
    })?;

    assert!(override_path.exists());
    assert!(!env.root.path().join("catalog.sqlite").exists());
    Ok(())
}

#[test]
fn unopenable_database_stops_crawl_before_fetch() -> Result<()> {
    let dir = tempdir()?;
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "file")?;

    let config_path = dir.path().join("catalog.toml");
    fs::write(
        &config_path,
        r#"
[source]
key = "unreachable"
page_url = "http://192.0.2.1/lista.htm"

[fetch]
mode = "http"
timeout_secs = 1

[catalog]
brands = ["Honda"]

[store]
database_path = "not-a-dir/catalog.sqlite"
"#,
    )?;

    let err = crawl(&CrawlOptions {
        config_path,
        database_path: None,
    })
    .expect_err("database under a regular file must not open");

    let message = format!("{err:#}");
    assert!(message.contains("database"), "unexpected error: {message}");
    assert!(message.contains("not-a-dir"), "unexpected error: {message}");
    assert!(!message.contains("fetch failed"), "unexpected error: {message}");
    assert!(!message.contains("192.0.2.1"), "unexpected error: {message}");
    Ok(())
}

#[test]
fn invalid_user_agent_is_named_in_fetch_error() -> Result<()> {
    let dir = tempdir()?;
    let config_path = dir.path().join("catalog.toml");
    fs::write(
        &config_path,
        r#"
[source]
key = "bad-agent"
page_url = "http://192.0.2.1/lista.htm"

[fetch]
user_agent = "motocat\nbroken"

[catalog]
brands = ["Honda"]
"#,
    )?;

    let err = extract_listings(&ExtractOptions { config_path })
        .expect_err("user agent with a newline must be rejected");

    let message = format!("{err:#}");
    assert!(message.contains("fetch failed for source bad-agent"));
    assert!(message.contains("invalid fetch.user_agent"));
    Ok(())
}

#[test]
fn harness_reports_idempotent_second_run() -> Result<()> {
    let env = setup_fixture_env()?;

    let report = run_harness(&HarnessOptions {
        config_path: env.config_path,
        database_path: None,
    })?;

    assert_eq!(report.entries_extracted, 5);
    assert_eq!(report.first_run_brands, 4);
    assert_eq!(report.first_run_models, 4);
    assert_eq!(report.first_run_years, 9);
    assert_eq!(report.second_run_rows, 0);
    assert_eq!(report.failures, 0);
    assert_eq!(report.total_years, 9);

    Ok(())
}

#[test]
fn fixture_config_loads_with_defaults() -> Result<()> {
    let env = setup_fixture_env()?;
    let loaded = load_config_file(&env.config_path)?;

    assert_eq!(loaded.config.fetch.mode, FetchMode::File);
    assert_eq!(loaded.config.catalog.brand_match, BrandMatchPolicy::LastWins);
    assert_eq!(loaded.config.catalog.year_bounds().max, 2024);
    assert_eq!(
        loaded.database_path()?,
        env.root.path().join("catalog.sqlite")
    );
    Ok(())
}

#[test]
fn config_validation_rejects_bad_values() -> Result<()> {
    let dir = tempdir()?;
    let base = r#"
[source]
key = "bad"
page_url = "https://example.com/lista.htm"

[catalog]
brands = ["Honda"]
"#;

    let cases = [
        base.replace("brands = [\"Honda\"]", "brands = []"),
        base.replace("brands = [\"Honda\"]", "brands = [\"Honda\", \" \"]"),
        format!("{base}min_year = 2010\nmax_year = 2000\n"),
        base.replace("https://example.com/lista.htm", "not a url"),
        base.replace("key = \"bad\"", "key = \"\""),
        format!("{base}\n[fetch]\nmode = \"file\"\n"),
    ];

    for (index, text) in cases.iter().enumerate() {
        let path = dir.path().join(format!("case-{index}.toml"));
        fs::write(&path, text)?;
        assert!(
            load_config_file(&path).is_err(),
            "case {index} should be rejected"
        );
    }

    let ok = dir.path().join("ok.toml");
    fs::write(&ok, base)?;
    assert!(load_config_file(&ok).is_ok());
    Ok(())
}

#[test]
fn shipped_config_is_valid() -> Result<()> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/catalog.toml");
    let loaded = load_config_file(&path)?;

    assert_eq!(loaded.config.catalog.brands.len(), 37);
    assert!(
        loaded
            .config
            .catalog
            .ignored_hrefs
            .contains("https://purkuosat.net/lista.htm")
    );
    Ok(())
}

struct FixtureEnv {
    root: TempDir,
    config_path: PathBuf,
}

fn setup_fixture_env() -> Result<FixtureEnv> {
    let root = tempdir()?;
    let fixture_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");

    for name in ["catalog.toml", "lista.html"] {
        fs::copy(fixture_root.join(name), root.path().join(name))?;
    }

    let config_path = root.path().join("catalog.toml");
    Ok(FixtureEnv { root, config_path })
}
