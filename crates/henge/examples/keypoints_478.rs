//! Expands 8 hand-placed editor key points into the full 478-point landmark JSON.
//!
//! Usage: `keypoints_478 <keys.json>`. The input is a JSON array of 8 `[x, y]` pairs in the
//! editor order (left eye, right eye, nose, mouth left, mouth right, chin, left cheek, right
//! cheek). The landmark JSON is written to stdout.

use anyhow::{bail, Context};

use henge::interp::{interpolate_478, to_json, KeyPoints};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [keys_path] = args.as_slice() else {
        bail!("usage: keypoints_478 <keys.json>");
    };

    let data = std::fs::read(keys_path).with_context(|| format!("failed to read {keys_path}"))?;
    let pairs: [[f32; 2]; 8] =
        serde_json::from_slice(&data).context("expected a JSON array of 8 [x, y] pairs")?;

    let points = interpolate_478(&KeyPoints::from_pairs(&pairs));
    println!("{}", to_json(&points)?);
    Ok(())
}
