use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use fluidmesh_testkit::read_metrics;

fn temp_path(name: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "fluidmesh_{name}_{}.{ext}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after epoch")
            .as_nanos()
    ))
}

fn fluidmesh() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fluidmesh"))
}

#[test]
fn builtin_scene_meshes_and_writes_metrics() {
    let serial_path = temp_path("serial", "json");
    let parallel_path = temp_path("parallel", "json");

    let status = fluidmesh()
        .args(["--serial", "--metrics"])
        .arg(&serial_path)
        .status()
        .expect("run fluidmesh");
    assert!(status.success());
    let status = fluidmesh()
        .arg("--metrics")
        .arg(&parallel_path)
        .status()
        .expect("run fluidmesh");
    assert!(status.success());

    let serial = read_metrics(&serial_path).expect("serial metrics");
    let parallel = read_metrics(&parallel_path).expect("parallel metrics");
    assert!(!serial.is_empty());
    assert_eq!(serial, parallel);
    assert!(serial.iter().any(|m| m.translucent_quads > 0));
    assert!(serial.iter().all(|m| m.cells > 0));

    let _ = std::fs::remove_file(serial_path);
    let _ = std::fs::remove_file(parallel_path);
}

#[test]
fn scene_with_unknown_block_fails() {
    let scene = temp_path("bad_scene", "toml");
    std::fs::write(
        &scene,
        "[[fills]]\nblock = \"unobtainium\"\nmin = [0, 0, 0]\n",
    )
    .expect("write scene");

    let output = fluidmesh()
        .arg("--scene")
        .arg(&scene)
        .output()
        .expect("run fluidmesh");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unobtainium"), "stderr: {stderr}");

    let _ = std::fs::remove_file(scene);
}

#[test]
fn custom_scene_respects_section_size_override() {
    let scene = temp_path("pond", "toml");
    let metrics = temp_path("pond_metrics", "json");
    std::fs::write(
        &scene,
        r#"
[render]
section_size = 4

[[sprites]]
fluid = "water"
still = [0.0, 0.0, 0.5, 0.5]
flowing = [0.5, 0.0, 1.0, 0.5]

[[fills]]
block = "water"
min = [0, 0, 0]
max = [7, 0, 0]
fluid = "water"
"#,
    )
    .expect("write scene");

    let status = fluidmesh()
        .arg("--scene")
        .arg(&scene)
        .args(["--section-size", "2", "--ambient-occlusion", "false", "--metrics"])
        .arg(&metrics)
        .status()
        .expect("run fluidmesh");
    assert!(status.success());

    let sections = read_metrics(&metrics).expect("metrics");
    assert_eq!(sections.len(), 4);
    assert_eq!(sections.iter().map(|m| m.cells).sum::<usize>(), 8);

    let _ = std::fs::remove_file(scene);
    let _ = std::fs::remove_file(metrics);
}
