//! Shape matching on a synthetic price series.
//!
//! Builds a noisy series with a pulse repeated at irregular spacing, writes it
//! in the binary series format, loads it back and asks which earlier windows
//! look like the last pulse.
//!
//! Run with: cargo run --release --example sinusoid_matching

use shape_match::{MatchConfig, Matcher, Observation, Series};

fn main() -> shape_match::Result<()> {
    let n = 2_000;
    let pulse_starts = [120, 610, 905, 1400, 1880];
    let width = 60;

    let prices: Vec<f32> = (0..n)
        .map(|i| {
            let t = i as f64;
            let mut p = 6.80 + ((t * 7.1).sin() * (t * 11.3).cos()) * 0.004;
            for &s in &pulse_starts {
                if (s..s + width).contains(&i) {
                    let x = (i - s) as f64 / width as f64;
                    p += 0.05 * (std::f64::consts::PI * x).sin().powi(2);
                }
            }
            p as f32
        })
        .collect();
    let series: Series = prices
        .iter()
        .enumerate()
        .map(|(i, &price)| Observation {
            timestamp: 1_546_300_800 + 300 * i as i64,
            price,
        })
        .collect();

    let path = std::env::temp_dir().join("shape_match_demo.dat");
    series.save(&path)?;
    let series = Series::load(&path)?;

    println!("Shape matching demo");
    println!("===================");
    println!("Observations: {}", series.len());
    println!("First: {}", series.observation(0)?);

    let query = *pulse_starts.last().unwrap_or(&0);
    let matcher = Matcher::new(MatchConfig::new(width, 6));
    let result = matcher.find(&series, query)?;

    println!("\nQuery window at {query}, {} candidates scanned", result.candidates);
    for line in result.to_lines() {
        println!("  {line}");
    }

    if let Some(best) = result.best() {
        let cmp = matcher.compare(&series, query, best.offset, 1)?;
        println!(
            "\nBest match {} ({}), score {:.3}",
            best.offset,
            series.observation(best.offset)?,
            cmp.score
        );
        let next_ref = cmp.reference_raw.get(width..).unwrap_or(&[]);
        let next_cand = cmp.candidate_raw.get(width..).unwrap_or(&[]);
        println!(
            "  prices after the windows: query {} points, match {} points",
            next_ref.len(),
            next_cand.len()
        );
    }

    std::fs::remove_file(&path)?;
    Ok(())
}
