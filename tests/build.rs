//! End-to-end builds over temporary projects.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};
use ucss::{build, build_project, Config, UcssError};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project(files: &[(&str, &str)], config: &str) -> TempDir {
    let dir = tempdir().unwrap();
    write(dir.path(), "ucss.yaml", config);
    for (path, content) in files {
        write(dir.path(), path, content);
    }
    dir
}

#[test]
fn test_two_rule_stylesheet() {
    let dir = project(
        &[("index.html", r#"<div class="px-4 md:text-lg"></div>"#)],
        "content: ['*.html']",
    );
    let result = build_project(dir.path()).unwrap();

    insta::assert_snapshot!(result.stylesheet, @r###"
    .px-4 {
      padding-left: 1rem;
      padding-right: 1rem;
    }

    @media (min-width: 768px) {
      .md\:text-lg {
        font-size: 1.125rem;
      }
    }
    "###);
    insta::assert_json_snapshot!(result.stats, @r###"
    {
      "files_scanned": 1,
      "candidate_tokens": 3,
      "rules_emitted": 2,
      "unresolved": 1
    }
    "###);
}

#[test]
fn test_repeated_builds_are_byte_identical() {
    let dir = project(
        &[
            ("templates/a.html", r#"<a class="hover:bg-blue-500 lg:p-2 md:p-2 flex">"#),
            ("templates/b.html", r#"<b class="dark:text-white -mt-4 w-1/2 !p-1">"#),
            ("src/view.rs", r#"html! { div(class = "grid grid-cols-3 gap-4") }"#),
        ],
        "content: ['templates/**/*.html', 'src/**/*.rs']",
    );

    let first = build_project(dir.path()).unwrap();
    for _ in 0..5 {
        let again = build_project(dir.path()).unwrap();
        assert_eq!(again.stylesheet, first.stylesheet);
        assert_eq!(again.unresolved, first.unresolved);
    }
}

#[test]
fn test_token_in_many_files_emitted_once() {
    let dir = tempdir().unwrap();
    for i in 0..50 {
        write(
            dir.path(),
            &format!("pages/page{:02}.html", i),
            r#"<main class="p-4 flex md:p-8">"#,
        );
    }
    let config = Config::parse("content: ['pages/*.html']").unwrap();
    let result = build(&config, dir.path()).unwrap();

    assert_eq!(result.stats.files_scanned, 50);
    assert_eq!(result.stats.rules_emitted, 3);
    assert_eq!(result.stylesheet.matches(".p-4 {").count(), 1);
    assert_eq!(result.stylesheet.matches(".flex {").count(), 1);
    assert_eq!(result.stylesheet.matches(".md\\:p-8 {").count(), 1);
}

#[test]
fn test_output_independent_of_file_partition() {
    let tokens = "flex p-4 hover:p-2 md:w-1/2 text-red-500 sm:gap-2 rounded-lg";

    let single = project(&[("all.html", tokens)], "content: ['*.html']");
    let files: Vec<(String, String)> = tokens
        .split(' ')
        .enumerate()
        .map(|(i, t)| (format!("part{}.html", i), t.to_string()))
        .collect();
    let split = tempdir().unwrap();
    write(split.path(), "ucss.yaml", "content: ['*.html']");
    for (path, content) in &files {
        write(split.path(), path, content);
    }

    let a = build_project(single.path()).unwrap();
    let b = build_project(split.path()).unwrap();
    assert_eq!(a.stylesheet, b.stylesheet);
    assert_eq!(b.stats.files_scanned, files.len());
}

#[test]
fn test_unknown_tokens_are_reported() {
    let dir = project(
        &[("a.html", r#"<p class="p-4 not-a-utility text-nope-900">"#)],
        "content: ['a.html']",
    );
    let result = build_project(dir.path()).unwrap();

    assert!(result.unresolved.contains("not-a-utility"));
    assert!(result.unresolved.contains("text-nope-900"));
    assert!(!result.stylesheet.contains("nope"));
    assert_eq!(result.stats.unresolved, result.unresolved.len());
}

#[test]
fn test_plugin_overrides_builtin_in_place() {
    let dir = project(
        &[("a.html", r#"<p class="p-2 px-4 pt-1">"#)],
        r#"
content: ['a.html']
minify: true
plugins:
  - name: logical
    kind: grammar
    utilities:
      - prefix: px
        axes: [spacing]
        properties: [padding-inline]
"#,
    );
    let result = build_project(dir.path()).unwrap();

    assert_eq!(
        result.stylesheet,
        ".p-2{padding:0.5rem}.px-4{padding-inline:1rem}.pt-1{padding-top:0.25rem}"
    );
}

#[test]
fn test_bundled_plugin() {
    let dir = project(
        &[("a.html", r#"<img class="aspect-video">"#)],
        "content: ['a.html']\nplugins: [aspect-ratio]\nminify: true",
    );
    let result = build_project(dir.path()).unwrap();
    assert_eq!(result.stylesheet, ".aspect-video{aspect-ratio:16 / 9}");
}

#[test]
fn test_invalid_plugin_aborts_build() {
    let dir = project(&[("a.html", "p-4")], "content: ['a.html']\nplugins: [no-such-plugin]");
    let err = build_project(dir.path()).unwrap_err();
    assert!(matches!(err, UcssError::Config { .. }));
}

#[test]
fn test_raw_content() {
    let config = Config::parse(
        r#"
content:
  - raw: '<div class="flex hidden">'
    extension: html
minify: true
"#,
    )
    .unwrap();
    let dir = tempdir().unwrap();
    let result = build(&config, dir.path()).unwrap();
    assert_eq!(result.stylesheet, ".flex{display:flex}.hidden{display:none}");
}
