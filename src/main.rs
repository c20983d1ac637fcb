#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use matcap_scene::SceneConfig;

    // Optional first argument: a JSON scene config.
    let config = match std::env::args().nth(1) {
        Some(path) => SceneConfig::from_file(path)?,
        None => SceneConfig::default(),
    };
    matcap_scene::run(config)
}

// The web build starts from `matcap_scene::start`.
#[cfg(target_arch = "wasm32")]
fn main() {}
