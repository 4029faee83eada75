use std::path::{Path, PathBuf};
use std::{env, fs};

const PROMPT_FILE: &str = "machina.yaml";

fn main() {
    println!("cargo:rerun-if-changed={}", PROMPT_FILE);

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_default();
    let source = Path::new(&manifest_dir).join(PROMPT_FILE);
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap_or_default());

    // OUT_DIR is <target>/<profile>/build/<package>-<hash>/out; the binary
    // lands in <target>/<profile>, which is where the fallback is looked up.
    let Some(profile_dir) = out_dir.ancestors().nth(3) else {
        println!("cargo:warning=unexpected OUT_DIR layout: {}", out_dir.display());
        return;
    };

    if let Err(e) = fs::copy(&source, profile_dir.join(PROMPT_FILE)) {
        println!(
            "cargo:warning=could not place {} next to the binary: {}",
            PROMPT_FILE, e
        );
    }
}
