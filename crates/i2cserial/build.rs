// Build provenance shown by `i2cserial version --extended`.
fn main() {
    for (cargo_var, exported) in [
        ("TARGET", "I2CSERIAL_BUILD_TARGET"),
        ("PROFILE", "I2CSERIAL_BUILD_PROFILE"),
    ] {
        if let Ok(value) = std::env::var(cargo_var) {
            println!("cargo:rustc-env={exported}={value}");
        }
        println!("cargo:rerun-if-env-changed={cargo_var}");
    }
}
