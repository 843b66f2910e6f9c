use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use assert_fs::TempDir;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use rstest::*;

macro_rules! cargo_run {
    ($($args:expr),*) => {
        {
            let mut cmd = Command::cargo_bin("wardrobe")?;
            $(cmd.arg($args);)*
            cmd.assert()
        }
    };
}

fn write_solid(path: &Path, rgb: [u8; 3]) -> Result<()> {
    RgbImage::from_pixel(64, 64, Rgb(rgb)).save(path)?;
    Ok(())
}

fn write_checkerboard(path: &Path) -> Result<()> {
    let img = RgbImage::from_fn(64, 64, |x, y| {
        if (x + y) % 2 == 0 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 0]) }
    });
    img.save(path)?;
    Ok(())
}

fn corpus() -> Result<TempDir> {
    let dir = TempDir::new()?;
    write_solid(&dir.path().join("blue.png"), [0, 0, 255])?;
    write_checkerboard(&dir.path().join("red.png"))?;
    Ok(dir)
}

#[test]
fn index_then_search() -> Result<()> {
    let dir = corpus()?;

    cargo_run!("index", dir.path()).success();
    assert!(dir.path().join(".wardrobe-metadata.json").exists());

    cargo_run!("search", dir.path(), "blue dress casual")
        .success()
        .stdout(predicate::str::contains("blue.png"));

    Ok(())
}

#[test]
fn index_twice_leaves_cache_untouched() -> Result<()> {
    let dir = corpus()?;
    let cache = dir.path().join(".wardrobe-metadata.json");

    cargo_run!("index", dir.path()).success();
    let before = fs::read(&cache)?;

    cargo_run!("index", dir.path())
        .success()
        .stdout(predicate::str::contains("+0 -0"));
    assert_eq!(fs::read(&cache)?, before);

    Ok(())
}

#[test]
fn index_force_re_extracts() -> Result<()> {
    let dir = corpus()?;

    cargo_run!("index", dir.path()).success();
    cargo_run!("index", dir.path(), "--force")
        .success()
        .stdout(predicate::str::contains("+2"));

    Ok(())
}

#[test]
fn removed_file_disappears_from_index() -> Result<()> {
    let dir = corpus()?;

    cargo_run!("index", dir.path()).success();
    fs::remove_file(dir.path().join("red.png"))?;
    cargo_run!("index", dir.path()).success();

    cargo_run!("show", dir.path())
        .success()
        .stdout(predicate::str::contains("red.png").not())
        .stdout(predicate::str::contains("blue.png"));

    Ok(())
}

#[test]
fn show_prints_diagnostics() -> Result<()> {
    let dir = corpus()?;

    cargo_run!("index", dir.path()).success();
    cargo_run!("show", dir.path())
        .success()
        .stdout(predicate::str::contains("2 images"))
        .stdout(predicate::str::contains(".wardrobe-metadata.json"));

    Ok(())
}

#[rstest]
#[case::table("table")]
#[case::json("json")]
fn search_output_formats(#[case] format: &str) -> Result<()> {
    let dir = corpus()?;

    cargo_run!("index", dir.path()).success();
    cargo_run!("search", dir.path(), "blue", "--output-format", format)
        .success()
        .stdout(predicate::str::contains("blue.png"));

    Ok(())
}

#[test]
fn search_json_carries_scores() -> Result<()> {
    let dir = corpus()?;

    cargo_run!("index", dir.path()).success();
    cargo_run!("search", dir.path(), "blue", "--output-format", "json")
        .success()
        .stdout(predicate::str::contains("similarity_score"));

    Ok(())
}

#[test]
fn search_count_limits_results() -> Result<()> {
    let dir = corpus()?;

    cargo_run!("index", dir.path()).success();
    let assert = cargo_run!("search", dir.path(), "blue", "--count", "1").success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    assert_eq!(stdout.lines().count(), 1);

    Ok(())
}

#[test]
fn blank_query_fails() -> Result<()> {
    let dir = corpus()?;

    cargo_run!("index", dir.path()).success();
    cargo_run!("search", dir.path(), "   ").failure();

    Ok(())
}

#[test]
fn custom_cache_file_is_used() -> Result<()> {
    let dir = corpus()?;
    let cache_dir = TempDir::new()?;
    let cache = cache_dir.path().join("meta.json");

    cargo_run!("index", dir.path(), "--cache", &cache).success();
    assert!(cache.exists());
    assert!(!dir.path().join(".wardrobe-metadata.json").exists());

    cargo_run!("search", dir.path(), "blue", "--cache", &cache)
        .success()
        .stdout(predicate::str::contains("blue.png"));

    Ok(())
}

#[test]
fn missing_corpus_root_fails() -> Result<()> {
    cargo_run!("index", "/nonexistent/corpus/root").failure();
    Ok(())
}
