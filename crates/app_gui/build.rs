use std::env;

fn main() {
    let version = env::var("ONCO_VISION_VERSION")
        .or_else(|_| env::var("CARGO_PKG_VERSION"))
        .unwrap_or_else(|_| "dev".to_string());
    println!("cargo:rustc-env=ONCO_VISION_VERSION={version}");
    println!("cargo:rerun-if-env-changed=ONCO_VISION_VERSION");
}
