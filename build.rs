// Records the knowledge-base root at build time so binaries run from target/
// or installed elsewhere still find kb/ when MARKER_KB_ROOT is unset.
use std::env;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-env-changed=MARKER_KB_ROOT_HINT");

    let Some(root) = env::var_os("MARKER_KB_ROOT_HINT").or_else(|| env::var_os("CARGO_MANIFEST_DIR"))
    else {
        return;
    };
    println!(
        "cargo:rustc-env=MARKER_KB_ROOT_HINT={}",
        Path::new(&root).display()
    );
}
