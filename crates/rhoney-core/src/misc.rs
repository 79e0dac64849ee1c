//! Build identification

pub const ENGINE_NAME: &str = "Rhoney";
pub const ENGINE_AUTHOR: &str = "the Rhoney developers";

/// `"Rhoney <version>"`, plus `"\nid author ..."` when `with_author` is set.
/// The second form is what the `uci` command prints after `id name `.
pub fn engine_info(with_author: bool) -> String {
    let name = format!("{ENGINE_NAME} {}", env!("CARGO_PKG_VERSION"));
    if with_author {
        format!("{name}\nid author {ENGINE_AUTHOR}")
    } else {
        name
    }
}

/// Multi-line description of how this binary was built
pub fn compiler_info() -> String {
    let profile = if cfg!(debug_assertions) { "debug" } else { "release" };
    let mut features = Vec::new();
    if cfg!(target_feature = "popcnt") {
        features.push("POPCNT");
    }
    if cfg!(target_feature = "bmi2") {
        features.push("BMI2");
    }
    if cfg!(target_feature = "avx2") {
        features.push("AVX2");
    }
    if cfg!(target_feature = "sse4.1") {
        features.push("SSE41");
    }
    if cfg!(target_feature = "neon") {
        features.push("NEON");
    }

    let mut info = format!(
        "\nCompiled by rustc (edition 2024), {ENGINE_NAME} {}\n",
        env!("CARGO_PKG_VERSION")
    );
    info.push_str(&format!(
        "Target: {} {} ({}-bit), {profile} build\n",
        std::env::consts::OS,
        std::env::consts::ARCH,
        usize::BITS
    ));
    info.push_str("Compilation settings include: ");
    if features.is_empty() {
        info.push_str("none");
    } else {
        info.push_str(&features.join(" "));
    }
    if cfg!(debug_assertions) {
        info.push_str(" DEBUG");
    }
    info.push('\n');
    info
}
