use std::process::Command;

// Stamp the compiler version and, when available, the git commit and build
// date into the crate so `build_info` and `/version` can report them.
fn main() {
    println!("cargo::rerun-if-env-changed=ATLAS_EXPORTER_COMMIT");
    println!("cargo::rerun-if-env-changed=ATLAS_EXPORTER_BUILD_DATE");

    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".into());
    let rust_version = command_output(&rustc, &["--version"])
        .and_then(|v| v.split_whitespace().nth(1).map(str::to_owned))
        .unwrap_or_else(|| "unknown".into());
    println!("cargo::rustc-env=ATLAS_RUSTC_VERSION={rust_version}");

    let commit = std::env::var("ATLAS_EXPORTER_COMMIT")
        .ok()
        .or_else(|| command_output("git", &["rev-parse", "--short=12", "HEAD"]))
        .unwrap_or_else(|| "unknown".into());
    println!("cargo::rustc-env=ATLAS_BUILD_COMMIT={commit}");

    let date = std::env::var("ATLAS_EXPORTER_BUILD_DATE")
        .ok()
        .or_else(|| command_output("git", &["log", "-1", "--format=%cs"]))
        .unwrap_or_else(|| "unknown".into());
    println!("cargo::rustc-env=ATLAS_BUILD_DATE={date}");
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}
