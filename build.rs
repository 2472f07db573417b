use std::{env, process::Command};
use vergen::EmitBuilder;

fn main() {
    // Emit build/cargo metadata; only ask for git info when a worktree with
    // at least one commit is actually present, otherwise vergen errors out.
    let mut emit_builder = EmitBuilder::builder();
    emit_builder.all_build().all_cargo();

    let in_git = Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);

    if in_git {
        let has_head = Command::new("git")
            .args(["rev-parse", "--verify", "HEAD"])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if has_head {
            let _ = emit_builder.all_git();
        }
    }

    emit_builder
        .emit()
        .expect("Unable to generate build information");

    if let Ok(desc) = env::var("CARGO_PKG_DESCRIPTION") {
        println!("cargo:rustc-env=APP_PKG_DESCRIPTION={}", desc);
    }
}
