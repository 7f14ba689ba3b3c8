// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for CLI tests: a canned search tool and scripted formatters
#![allow(dead_code)]

use serde_json::json;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Escape sequence the binary writes to leave the terminal clean
pub const COLOR_RESET: &str = "\x1b[0m";

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, content).expect("write file");
}

/// Copy a fixture script into `dir` and make it executable
pub fn install_script(name: &str, dir: &Path) -> PathBuf {
    let target = dir.join(name);
    fs::copy(Path::new(FIXTURES).join(name), &target).expect("copy fixture");
    fs::set_permissions(&target, fs::Permissions::from_mode(0o755)).expect("chmod fixture");
    target
}

/// Search tool replaying canned ripgrep output
pub struct FakeSearchTool {
    dir: TempDir,
    path: PathBuf,
}

impl FakeSearchTool {
    pub fn install() -> Self {
        let dir = TempDir::new().expect("tool dir");
        let path = install_script("fake-rg.sh", dir.path());
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Output for `kind` (`files`, `contents` or `names`)
    pub fn reply(&self, kind: &str, stdout: &str) {
        fs::write(self.dir.path().join(format!("{kind}.out")), stdout).expect("write reply");
    }

    pub fn fail(&self, kind: &str, status: i32, stderr: &str) {
        fs::write(self.dir.path().join(format!("{kind}.status")), status.to_string())
            .expect("write status");
        fs::write(self.dir.path().join(format!("{kind}.err")), stderr).expect("write stderr");
    }

    /// Argument lists of every invocation, in order
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// One file's messages in ripgrep's `--json` format.
///
/// `lines` holds `(line_number, text, spans)`; `text` has no newline.
pub fn json_file(
    path: &str,
    lines: &[(u64, &str, &[(usize, usize)])],
    bytes_searched: u64,
) -> String {
    let mut out = String::new();
    push(&mut out, json!({ "type": "begin", "data": { "path": { "text": path } } }));
    for (line_number, text, spans) in lines {
        let submatches: Vec<serde_json::Value> = spans
            .iter()
            .map(|&(start, end)| {
                json!({ "match": { "text": &text[start..end] }, "start": start, "end": end })
            })
            .collect();
        push(
            &mut out,
            json!({
                "type": "match",
                "data": {
                    "path": { "text": path },
                    "lines": { "text": format!("{text}\n") },
                    "line_number": line_number,
                    "absolute_offset": 0,
                    "submatches": submatches,
                }
            }),
        );
    }
    push(
        &mut out,
        json!({
            "type": "end",
            "data": {
                "path": { "text": path },
                "binary_offset": null,
                "stats": { "bytes_searched": bytes_searched, "matched_lines": lines.len() }
            }
        }),
    );
    out
}

fn push(out: &mut String, message: serde_json::Value) {
    out.push_str(&message.to_string());
    out.push('\n');
}

const FOO_IN_X: &[(usize, usize)] = &[(4, 7)];
const FOO_IN_Y: &[(usize, usize)] = &[(3, 6)];

/// Tree where x.txt has `foo` five times as a word, y.txt once inside
/// `seafood` and z.txt not at all, with the matching canned search output.
pub struct RankingFixture {
    pub root: TempDir,
    pub home: TempDir,
    pub tool: FakeSearchTool,
}

impl RankingFixture {
    pub fn new() -> Self {
        let root = TempDir::new().expect("root");
        let x_body = "the foo bar\n".repeat(5);
        write_file(&root.path().join("x.txt"), &x_body);
        write_file(&root.path().join("y.txt"), "seafood\n");
        write_file(&root.path().join("z.txt"), "nothing to see\n");

        let tool = FakeSearchTool::install();
        tool.reply("files", "./x.txt\n./y.txt\n./z.txt\n");
        let x_lines: Vec<(u64, &str, &[(usize, usize)])> =
            (1..=5).map(|n| (n, "the foo bar", FOO_IN_X)).collect();
        let mut contents = json_file("./x.txt", &x_lines, x_body.len() as u64);
        contents.push_str(&json_file("./y.txt", &[(1, "seafood", FOO_IN_Y)], 8));
        tool.reply("contents", &contents);
        tool.fail("names", 1, "");

        let fixture = Self {
            root,
            home: TempDir::new().expect("home"),
            tool,
        };
        fixture.configure("");
        fixture
    }

    /// Write `.rgrankrc.toml` pointing at the fake tool, plus `extra` lines
    pub fn configure(&self, extra: &str) {
        let config = format!("search_tool = {:?}\n{extra}", self.tool.path().display().to_string());
        write_file(&self.root.path().join(".rgrankrc.toml"), &config);
    }

    /// Use the fixture formatter script `name` with `args`
    pub fn use_formatter(&self, name: &str, args: &[&str]) {
        let formatter = install_script(name, self.home.path());
        self.configure(&format!(
            "formatter = {:?}\nformatter_args = {:?}\n",
            formatter.display().to_string(),
            args
        ));
    }

    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("rgrank"));
        cmd.current_dir(self.root.path())
            .env("HOME", self.home.path())
            .env_remove("RGRANK_LOG")
            .env_remove("NO_COLOR");
        cmd
    }
}
