use std::path::Path;
use std::process::Command;

/// Embeds the short commit id as `KREDO_BUILD_SHA` for `kredo --version`.
fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let root = Path::new(&manifest_dir).join("..");

    let head = root.join(".git").join("HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }

    let sha = git(&root, &["describe", "--always", "--dirty", "--abbrev=10"]).unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=KREDO_BUILD_SHA={sha}");
}

fn git(root: &Path, args: &[&str]) -> Option<String> {
    let out = Command::new("git").arg("-C").arg(root).args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let s = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!s.is_empty()).then_some(s)
}
