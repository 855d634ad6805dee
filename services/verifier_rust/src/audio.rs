//! Clip audio extraction via ffmpeg.
//!
//! Produces the 16kHz mono waveform the speech engine expects, optionally
//! slowed down. ffmpeg's atempo filter only accepts factors in [0.5, 2.0],
//! so other speeds are decomposed into a chain of in-range factors.

use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::path::Path;
use std::process::Command;

/// Parse `ss`, `mm:ss` or `h:mm:ss` into seconds.
pub fn parse_timestamp(ts: &str) -> Result<f64> {
    let parts: Vec<&str> = ts.split(':').collect();
    let nums: Vec<f64> = parts
        .iter()
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .with_context(|| format!("invalid timestamp component {:?} in {:?}", p, ts))
        })
        .collect::<Result<_>>()?;
    match nums.as_slice() {
        [s] => Ok(*s),
        [m, s] => Ok(m * 60.0 + s),
        [h, m, s] => Ok(h * 3600.0 + m * 60.0 + s),
        _ => bail!("invalid timestamp {:?}", ts),
    }
}

/// Decompose `speed` into an ffmpeg atempo filter chain whose factors all
/// lie in [0.5, 2.0] and multiply to `speed`.
pub fn build_atempo_chain(speed: f64) -> Result<String> {
    if speed <= 0.0 {
        bail!("speed must be positive, got {}", speed);
    }
    let mut factors = Vec::new();
    let mut remaining = speed;
    while remaining < 0.5 {
        factors.push(0.5);
        remaining /= 0.5;
    }
    while remaining > 2.0 {
        factors.push(2.0);
        remaining /= 2.0;
    }
    factors.push(remaining);
    Ok(factors
        .iter()
        .map(|f| format!("atempo={:.3}", f))
        .collect::<Vec<_>>()
        .join(","))
}

/// Extract a clip's audio as a 16kHz mono wav. `start`/`end` are textual
/// timestamps; `slowdown` other than 1.0 applies the atempo chain. An
/// ffmpeg failure is fatal and carries ffmpeg's stderr.
pub fn extract_audio(
    video: &Path,
    output: &Path,
    start: Option<&str>,
    end: Option<&str>,
    slowdown: f64,
) -> Result<()> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y").arg("-i").arg(video);

    let start_sec = match start {
        Some(ts) => {
            let sec = parse_timestamp(ts)?;
            cmd.arg("-ss").arg(sec.to_string());
            sec
        }
        None => 0.0,
    };
    if let Some(ts) = end {
        let duration = (parse_timestamp(ts)? - start_sec).max(0.0);
        cmd.arg("-t").arg(duration.to_string());
    }
    if slowdown != 1.0 {
        cmd.arg("-af").arg(build_atempo_chain(slowdown)?);
    }
    cmd.args(["-ar", "16000", "-ac", "1"]).arg(output);

    debug!("running {:?}", cmd);
    let result = cmd
        .output()
        .with_context(|| "spawning ffmpeg (is it installed?)")?;
    if !result.status.success() {
        bail!(
            "ffmpeg failed with {}: {}",
            result.status,
            String::from_utf8_lossy(&result.stderr).trim()
        );
    }
    info!("extracted audio to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_forms() {
        assert_eq!(parse_timestamp("90").unwrap(), 90.0);
        assert_eq!(parse_timestamp("1:30").unwrap(), 90.0);
        assert_eq!(parse_timestamp("1:02:03").unwrap(), 3723.0);
        assert!(parse_timestamp("abc").is_err());
        assert!(parse_timestamp("1:2:3:4").is_err());
    }

    #[test]
    fn test_atempo_chain_identity_and_simple() {
        assert_eq!(build_atempo_chain(1.0).unwrap(), "atempo=1.000");
        assert_eq!(build_atempo_chain(0.75).unwrap(), "atempo=0.750");
    }

    #[test]
    fn test_atempo_chain_decomposes_extreme_speeds() {
        let chain = build_atempo_chain(0.4).unwrap();
        let factors: Vec<f64> = chain
            .split(',')
            .map(|part| part.trim_start_matches("atempo=").parse().unwrap())
            .collect();
        assert!(factors.len() > 1);
        for f in &factors {
            assert!((0.5..=2.0).contains(f), "factor {} out of range", f);
        }
        let product: f64 = factors.iter().product();
        assert!((product - 0.4).abs() < 1e-3);

        let fast = build_atempo_chain(5.0).unwrap();
        assert!(fast.starts_with("atempo=2.000"));
    }

    #[test]
    fn test_atempo_chain_rejects_non_positive() {
        assert!(build_atempo_chain(0.0).is_err());
        assert!(build_atempo_chain(-1.0).is_err());
    }
}
