//! Morphs a target face onto a source photo.
//!
//! Usage: `morph_files <src-image> <src-landmarks.json> <target-image> <target-landmarks.json>
//! <alpha> <output-image>`

use anyhow::{bail, Context};
use log::LevelFilter;

use henge::image::Image;
use henge::landmark::Landmarks;
use henge::Morpher;

fn main() -> anyhow::Result<()> {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter(Some(env!("CARGO_CRATE_NAME")), log_level)
        .filter(Some("henge"), log_level)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [src_path, src_lm_path, target_path, target_lm_path, alpha, out_path] = args.as_slice()
    else {
        bail!("usage: morph_files <src-image> <src-landmarks.json> <target-image> <target-landmarks.json> <alpha> <output-image>");
    };
    let alpha: f32 = alpha.parse().context("alpha must be a number in 0..=1")?;

    let src = Image::load(src_path).with_context(|| format!("failed to load {src_path}"))?;
    let target =
        Image::load(target_path).with_context(|| format!("failed to load {target_path}"))?;
    let src_landmarks = Landmarks::from_json_slice(&std::fs::read(src_lm_path)?)
        .with_context(|| format!("failed to parse {src_lm_path}"))?;
    let target_landmarks = Landmarks::from_json_slice(&std::fs::read(target_lm_path)?)
        .with_context(|| format!("failed to parse {target_lm_path}"))?;

    let mut out = Image::new(src.width(), src.height());
    let mut morpher = Morpher::new();
    morpher.morph(
        &src,
        &target,
        &src_landmarks,
        &target_landmarks,
        alpha,
        &mut out,
        false,
    )?;
    for timer in morpher.timers() {
        log::info!("{timer}");
    }

    out.save(out_path).with_context(|| format!("failed to save {out_path}"))?;
    Ok(())
}
