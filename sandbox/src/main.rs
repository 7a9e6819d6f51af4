// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Holdfast Sandbox
// Drives the access layer against the in-process engine.
//
// Usage: sandbox [config.ron]
// The configuration file is created with default levels if it does not exist.

use std::sync::Arc;

use anyhow::Result;
use holdfast_access::{AssetAccess, LoadOptions};
use holdfast_core::engine::{MemoryEngine, SceneLoadMode};
use holdfast_core::{AccessConfig, Asset, Owner};
use holdfast_telemetry::logging::init_logger;
use holdfast_telemetry::report::NAMESPACE;

#[derive(Debug)]
struct Prefab {
    name: &'static str,
}

impl Asset for Prefab {}

fn build_catalog() -> Arc<MemoryEngine> {
    let engine = Arc::new(MemoryEngine::new());
    engine.insert("char/hero.prefab", Prefab { name: "hero" });
    engine.insert("levels/town.scene", String::from("town"));
    engine.insert_deferred("audio/theme.ogg", vec![0u8; 1024]);
    engine.insert_hanging("remote/banner.png", vec![0u8; 64]);
    engine.insert_failing("tex/corrupt.png", "invalid PNG signature");
    for index in 0..4 {
        engine.insert(
            holdfast_core::asset::sprite_key("ui/walk.png", Some(index)),
            format!("walk frame {index}"),
        );
    }
    engine
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger("info");

    let config = match std::env::args().nth(1) {
        Some(path) => AccessConfig::load_or_create(path)?,
        None => AccessConfig::default(),
    };
    let engine = build_catalog();
    let access = AssetAccess::new(engine.clone(), config)?;
    let level = Owner::new("level");

    // Two loads of one key: one engine operation.
    let hero = access.load_asset::<Prefab>(&level, "char/hero.prefab")?;
    let again = access.load_asset::<Prefab>(&level, "char/hero.prefab")?;
    log::info!(
        "Sandbox: '{}' loaded twice, {} engine load(s), shared: {}",
        hero.name,
        engine.load_count("char/hero.prefab"),
        Arc::ptr_eq(&hero, &again)
    );

    let frames = access
        .load_sprites_async::<String>(
            &level,
            "ui/walk.png",
            4,
            LoadOptions::new().progress(|p| log::debug!("Sandbox: sprites {:.0}%", p * 100.0)),
        )
        .await?;
    log::info!("Sandbox: {} walk frames cached", frames.len());

    let theme = access.load_asset::<Vec<u8>>(&level, "audio/theme.ogg")?;
    log::info!("Sandbox: theme is {} bytes", theme.len());

    if let Err(e) = access
        .load_asset_async::<Vec<u8>>(&level, "remote/banner.png", LoadOptions::new().timeout_ms(100))
        .await
    {
        log::info!("Sandbox: {e}");
    }
    if let Err(e) = access.load_asset::<Vec<u8>>(&level, "tex/corrupt.png") {
        log::info!("Sandbox: {e}");
    }

    let instance = access
        .instantiate_async("char/hero.prefab", None, LoadOptions::new())
        .await?;
    access.release_instance(&instance)?;

    let scene = access
        .load_scene_async("levels/town.scene", SceneLoadMode::Single, true, LoadOptions::new())
        .await?;
    access.release_scene(&scene, None).await?;

    log::info!(
        "Sandbox: destroying '{}' with {} cached handle(s)",
        level.name(),
        level.handle_count()
    );
    level.destroy();
    log::info!("Sandbox: {} engine reference(s) left", engine.total_refs());

    for metric in access.metrics().namespace_metrics(NAMESPACE) {
        log::info!("Sandbox: {} = {:?}", metric.id, metric.value);
    }
    Ok(())
}
