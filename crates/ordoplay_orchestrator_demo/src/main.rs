// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` Orchestrator Demo
//!
//! Runs a small scripted scene headlessly at a fixed 60 Hz:
//! - A director sequence that tweens a camera and starts two actors
//! - Actors that rendezvous on a barrier before the finale
//! - A bounded wait and a retried system call
//!
//! Usage: `ordoplay_orchestrator_demo [config.ron]`

use ordoplay_orchestrator::{
    Context, Easing, EngineContext, EventLog, InMemoryScene, Orchestrator, OrchestratorConfig,
    Scene, SequenceEvent, SystemCommand, TimeoutPolicy, Transform,
};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const FRAME_DT: f32 = 1.0 / 60.0;
const MAX_FRAMES: u64 = 60 * 20;

fn init_tracing() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["ordoplay_orchestrator=debug", "ordoplay_orchestrator_demo=info"] {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config() -> OrchestratorConfig {
    let Some(path) = std::env::args().nth(1) else {
        return OrchestratorConfig::default();
    };
    match OrchestratorConfig::load(Path::new(&path)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn main() {
    init_tracing();
    tracing::info!("Starting OrdoPlay Orchestrator Demo v{}", env!("CARGO_PKG_VERSION"));

    let orchestrator = Orchestrator::with_config(load_config());
    let scene = InMemoryScene::new();
    scene.add_system("audio");
    scene.add_system("ui");

    let camera = scene.spawn(Transform::at([0.0, 2.0, -10.0]));
    let hero = scene.spawn(Transform::at([-4.0, 0.0, 0.0]));
    let rival = scene.spawn(Transform::at([4.0, 0.0, 0.0]));
    scene.add_component(hero, "Controller", true);

    // Readiness check that only passes from the second attempt on
    let ui_attempts = Rc::new(Cell::new(0u32));
    let attempts = ui_attempts.clone();

    let registered = orchestrator
        .build("director")
        .guard(|scene| scene.has_system("audio"))
        .validate(move |scene| {
            if scene.has_entity(camera) {
                Ok(())
            } else {
                Err("camera entity missing".to_string())
            }
        })
        .on_completed(|name| tracing::info!("'{}' finished", name))
        .steps(|s| {
            s.set_component_enabled(hero, "Controller", false)
                .invoke("audio", SystemCommand::new("play_music"))
                .parallel_all(|p| {
                    p.move_to(camera, [0.0, 3.0, -6.0], 1.5, Easing::EaseInOut)
                        .look_at(camera, [0.0, 0.0, 0.0], 1.0, Easing::EaseOut);
                })
                .start_sequence("hero_walk")
                .start_sequence("rival_walk")
                .barrier("duel", 3)
                .retry(3, |r| {
                    r.call(move |_| attempts.set(attempts.get() + 1))
                        .wait_until(
                            move |_| ui_attempts.get() >= 2,
                            Some(0.1),
                            TimeoutPolicy::Fail,
                        );
                })
                .timeout(0.5, TimeoutPolicy::SkipStep, |t| {
                    t.barrier("never_arrives", 2);
                })
                .publish(SequenceEvent::signal("finale"))
                .set_component_enabled(hero, "Controller", true);
        })
        .register()
        .and_then(|()| {
            orchestrator
                .build("hero_walk")
                .steps(|s| {
                    s.move_to(hero, [-1.0, 0.0, 0.0], 2.0, Easing::Linear)
                        .barrier("duel", 3);
                })
                .register()
        })
        .and_then(|()| {
            orchestrator
                .build("rival_walk")
                .steps(|s| {
                    s.wait(0.5)
                        .move_to(rival, [1.0, 0.0, 0.0], 1.0, Easing::EaseIn)
                        .scale_to(rival, [1.2, 1.2, 1.2], 0.25, Easing::Linear)
                        .barrier("duel", 3);
                })
                .register()
        });
    if let Err(e) = registered {
        tracing::error!("Failed to register sequences: {}", e);
        std::process::exit(1);
    }

    let events = EventLog::new();
    let mut engine = EngineContext::default();

    match orchestrator.start("director", Context::new(&scene, &engine, &events)) {
        Ok(true) => {}
        Ok(false) => {
            tracing::error!("Director refused to start");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }

    while orchestrator.active_count() > 0 && engine.frame < MAX_FRAMES {
        engine.frame += 1;
        engine.elapsed += f64::from(FRAME_DT);
        orchestrator.tick(FRAME_DT * engine.time_scale, Context::new(&scene, &engine, &events));

        for event in events.take() {
            tracing::info!("Frame {}: event '{}'", engine.frame, event.name());
        }
        if engine.frame % 60 == 0 {
            tracing::debug!("{}", orchestrator.debug_summary());
        }
    }

    if let Some(transform) = scene.transform(camera) {
        tracing::info!("Camera ended at {:?}", transform.position);
    }
    tracing::info!(
        "Ran {} frame(s), {} system call(s) to audio\n{}",
        engine.frame,
        scene.received("audio").len(),
        orchestrator.debug_summary()
    );
}
