//! Game startup example for singleton-lifecycle.
//!
//! Demonstrates:
//! - Configuring behavioural singletons with templates
//! - The startup spawn and de-duplication of repeated types
//! - Lookup with `instance()` and the ad-hoc fallback
//! - Persistent objects and plain-value singletons
//!
//! Run with: `cargo run --example game_startup`

use singleton_lifecycle::host::{HostRuntime, SceneGraph};
use singleton_lifecycle::{
    shutdown, ObjectEntry, RawSingleton, RawSingletonExt, RegistryConfig, RegistryOptions,
    ResourceFolder, SingletonBehaviour, SingletonObject, SingletonRegistry, Template,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct AudioManager {
    volume: f32,
}

impl SingletonBehaviour for AudioManager {
    fn on_initialize(&self) {
        println!("   AudioManager initialized (volume {})", self.volume);
    }

    fn on_dispose(&self) {
        println!("   AudioManager disposed");
    }
}

#[derive(Debug, Clone, Default)]
struct Hud;

impl SingletonBehaviour for Hud {
    fn dont_destroy_on_load(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct Difficulty {
    level: u8,
}

impl SingletonObject for Difficulty {}

#[derive(Default)]
struct FrameCounter {
    frames: AtomicU32,
}

impl RawSingleton for FrameCounter {
    fn on_deinit(&self) {
        println!("   FrameCounter saw {} frames", self.frames.load(Ordering::SeqCst));
    }
}

fn main() {
    println!("=== singleton-lifecycle: Game Startup ===\n");

    // -------------------------------------------------------------------------
    // 1. Configure
    // -------------------------------------------------------------------------
    println!("1. Configuring singletons...");

    let config = RegistryConfig::new()
        .with_behaviour(Arc::new(
            Template::new("Audio").with(AudioManager { volume: 0.8 }),
        ))
        .with_behaviour(Arc::new(
            Template::new("AudioCopy").with(AudioManager { volume: 0.1 }),
        ))
        .with_behaviour(Arc::new(Template::new("Hud").with(Hud)))
        .with_object(ObjectEntry::new(Difficulty { level: 2 }));

    let registry = SingletonRegistry::with_config(
        config,
        Arc::new(ResourceFolder::new()),
        RegistryOptions::default(),
    );

    registry.set_trace_callback(|event| {
        if event.is_warning() {
            println!("   [warning] {}", event);
        }
    });

    // -------------------------------------------------------------------------
    // 2. Spawn
    // -------------------------------------------------------------------------
    println!("\n2. Spawning (the second AudioManager is discarded)...");

    let mut host = SceneGraph::new("Menu");
    host.play();
    let spawned = registry.spawn(&mut host);

    println!("   {} objects spawned, {} live singletons", spawned.len(), registry.live_count());

    // -------------------------------------------------------------------------
    // 3. Lookup
    // -------------------------------------------------------------------------
    println!("\n3. Looking singletons up...");

    let audio = registry.instance::<AudioManager>(&mut host);
    println!("   AudioManager volume: {}", audio.volume);

    let difficulty = registry.object::<Difficulty>();
    println!("   Difficulty: {:?}", difficulty.map(|d| d.level));

    // -------------------------------------------------------------------------
    // 4. Scene change
    // -------------------------------------------------------------------------
    println!("\n4. Loading the next scene...");

    host.load_scene("Level1");
    println!(
        "   Hud live: {}, AudioManager live: {}",
        registry.contains::<Hud>(),
        registry.contains::<AudioManager>()
    );

    let hud = registry.instance::<Hud>(&mut host);
    println!("   Hud recreated on {:?}", hud.object().and_then(|o| host.scene_name(o)));

    // -------------------------------------------------------------------------
    // 5. Plain values and shutdown
    // -------------------------------------------------------------------------
    println!("\n5. Plain-value singletons...");

    for _ in 0..3 {
        FrameCounter::instance().frames.fetch_add(1, Ordering::SeqCst);
    }

    host.stop();
    shutdown::quit();

    println!("\n=== Done ===");
}
