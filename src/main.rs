use product_viewer::{config::ViewerConfig, flow::run, resources::GltfLoader};

fn main() -> anyhow::Result<()> {
    let mut config = ViewerConfig::default();
    if let Some(asset_path) = std::env::args().nth(1) {
        config = config.with_asset(asset_path);
    }
    let loader = GltfLoader::new(config.asset_root.clone());
    run(config, loader)
}
